//! Fog and dither: per-pixel adjustments to the working color.

use pixjit_core::PixelKey;

use super::{field, pool, PixelCompiler, Stage};
use crate::error::CompileResult;
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;

impl PixelCompiler<'_> {
    /// `color = (color * fog + fog_color * (255 - fog)) / 255` on RGB,
    /// alpha preserved.
    pub(super) fn fog(&mut self) -> CompileResult<()> {
        self.mark(Stage::Fog);
        if !self.key.apply_fog() {
            self.regs.force_release(Purpose::ArgFog);
            return Ok(());
        }

        let fog_color = self.regs.alloc_vec(Purpose::VecTemp1)?;
        let gs = self.gstate()?;
        emit_movd_xm(self.buf, fog_color, gs, field::FOG_COLOR);
        self.regs.unlock(Purpose::GState);
        let zero = self.zero_vec()?;
        emit_sse_rr(self.buf, OPC_PUNPCKLBW, fog_color, zero);
        self.regs.unlock(Purpose::VecZero);

        let inverse = self.load_const(Purpose::VecTemp2, pool::CONST255)?;

        let vc = self.regs.find_vec(Purpose::VecArgColor)?;
        self.expand_color(vc)?;
        let alpha = self.regs.alloc_gen(Purpose::SrcAlpha)?;
        emit_pextrw(self.buf, alpha, vc, 3);

        let fog = self.regs.alloc_vec(Purpose::VecTemp3)?;
        let arg = self.regs.find_gen(Purpose::ArgFog)?;
        emit_movd_xr(self.buf, fog, arg);
        emit_pshuflw(self.buf, fog, fog, 0x00);
        self.regs.force_release(Purpose::ArgFog);

        emit_sse_rr(self.buf, OPC_PMULLW, vc, fog);
        emit_sse_rr(self.buf, OPC_PSUBUSW, inverse, fog);
        emit_sse_rr(self.buf, OPC_PMULLW, fog_color, inverse);
        emit_sse_rr(self.buf, OPC_PADDUSW, vc, fog_color);
        self.regs.release(Purpose::VecTemp1);
        self.regs.release(Purpose::VecTemp2);
        self.regs.release(Purpose::VecTemp3);

        // x / 255 == (x * 0x8081) >> 23 for 16-bit x.
        let cb = self.const_base()?;
        emit_sse_rm(self.buf, OPC_PMULHUW, vc, cb, pool::BY255);
        self.regs.unlock(Purpose::ConstBase);
        emit_vec_shift_ri(self.buf, VecShiftOp::Srl, vc, 7);

        emit_pinsrw(self.buf, vc, alpha, 3);
        self.regs.release(Purpose::SrcAlpha);
        self.regs.unlock(Purpose::VecArgColor);
        Ok(())
    }

    /// Add the signed 4x4 matrix entry for `(x & 3, y & 3)` to RGB.
    pub(super) fn dither(&mut self) -> CompileResult<()> {
        self.mark(Stage::Dither);
        if !self.key.dithering() {
            return Ok(());
        }
        self.color_off()?;
        self.regs.unlock(Purpose::ColorOff);

        let x = self.regs.find_gen(Purpose::ArgX)?;
        let y = self.regs.find_gen(Purpose::ArgY)?;
        let key = self.regs.find_gen(Purpose::ArgKey)?;
        let value = self.regs.alloc_gen(Purpose::GenTemp0)?;
        let column = self.regs.alloc_gen(Purpose::GenTemp1)?;

        emit_mov_rr(self.buf, false, value, y);
        emit_arith_ri(self.buf, ArithOp::And, false, value, 3);
        emit_mov_rr(self.buf, false, column, x);
        emit_arith_ri(self.buf, ArithOp::And, false, column, 3);
        emit_lea_sib(self.buf, true, value, column, value, 2, 0);
        emit_load_sx_sib(
            self.buf,
            OPC_MOVSBL,
            value,
            key,
            value,
            0,
            PixelKey::DITHER_OFFSET,
        );
        // Lane 1 must stay zero for the shuffle below.
        emit_arith_ri(self.buf, ArithOp::And, false, value, 0xFFFF);

        self.regs.release(Purpose::GenTemp1);
        self.regs.unlock(Purpose::ArgKey);
        self.regs.force_release(Purpose::ArgX);
        self.regs.force_release(Purpose::ArgY);

        let bias = self.regs.alloc_vec(Purpose::VecTemp0)?;
        emit_movd_xr(self.buf, bias, value);
        self.regs.release(Purpose::GenTemp0);
        // Words 0-2 get the bias, word 3 (alpha) gets zero.
        emit_pshuflw(self.buf, bias, bias, 0x40);

        let vc = self.regs.find_vec(Purpose::VecArgColor)?;
        self.expand_color(vc)?;
        emit_sse_rr(self.buf, OPC_PADDSW, vc, bias);
        self.regs.release(Purpose::VecTemp0);
        self.regs.unlock(Purpose::VecArgColor);
        Ok(())
    }
}
