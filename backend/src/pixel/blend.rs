//! Alpha blending against the destination pixel.
//!
//! Factor equations work on 16-bit lanes in 11.4 fixed point: colors
//! and factors are shifted left by four, the low bits set to one half,
//! and `pmulhuw` yields the product already scaled back to 8 bits. Min,
//! max and absolute difference work directly on packed bytes.

use pixjit_core::{BlendEq, BlendFactor, FbFormat};

use super::convert::emit_convert_from;
use super::{field, pool, PixelCompiler, Stage};
use crate::error::CompileResult;
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;
use crate::x86_64::regs::Xmm;

impl PixelCompiler<'_> {
    pub(super) fn alpha_blend(&mut self) -> CompileResult<()> {
        self.mark(Stage::Blend);
        if !self.key.alpha_blend() {
            return Ok(());
        }

        let dst = self.load_dest_color(self.blend.uses_dst_alpha)?;
        let color = self.regs.find_vec(Purpose::VecArgColor)?;
        if self.blend.uses_factors {
            self.blend_with_factors(color, dst)?;
        } else {
            self.pack_color(color);
            match self.key.blend_eq() {
                BlendEq::Min => emit_sse_rr(self.buf, OPC_PMINUB, color, dst),
                BlendEq::Max => emit_sse_rr(self.buf, OPC_PMAXUB, color, dst),
                BlendEq::AbsDiff => {
                    // |a - b| == sat(a - b) | sat(b - a)
                    let tmp = self.regs.alloc_vec(Purpose::VecTemp1)?;
                    emit_sse_rr(self.buf, OPC_MOVDQA_VxWx, tmp, dst);
                    emit_sse_rr(self.buf, OPC_PSUBUSB, tmp, color);
                    emit_sse_rr(self.buf, OPC_PSUBUSB, color, dst);
                    emit_sse_rr(self.buf, OPC_POR, color, tmp);
                    self.regs.release(Purpose::VecTemp1);
                }
                _ => {}
            }
        }

        self.regs.release(Purpose::VecTemp0);
        self.regs.unlock(Purpose::VecArgColor);
        Ok(())
    }

    /// Load the destination pixel as packed canonical bytes into
    /// `VecTemp0`.
    fn load_dest_color(&mut self, keep_alpha: bool) -> CompileResult<Xmm> {
        let co = self.color_off()?;
        if !self.key.dithering() {
            self.regs.force_release(Purpose::ArgX);
            self.regs.force_release(Purpose::ArgY);
        }
        let dst = self.regs.alloc_vec(Purpose::VecTemp0)?;
        let format = self.key.fb_format();
        if format == FbFormat::Rgba8888 {
            emit_movd_xm(self.buf, dst, co, 0);
        } else {
            let pixel = self.regs.alloc_gen(Purpose::GenTemp0)?;
            let t1 = self.regs.alloc_gen(Purpose::GenTemp1)?;
            let t2 = self.regs.alloc_gen(Purpose::GenTemp2)?;
            emit_load_zx(self.buf, OPC_MOVZWL, pixel, co, 0);
            emit_convert_from(self.buf, format, pixel, t1, t2, keep_alpha);
            emit_movd_xr(self.buf, dst, pixel);
            self.regs.release(Purpose::GenTemp2);
            self.regs.release(Purpose::GenTemp1);
            self.regs.release(Purpose::GenTemp0);
        }
        self.regs.unlock(Purpose::ColorOff);
        Ok(dst)
    }

    fn blend_with_factors(&mut self, color: Xmm, dst: Xmm) -> CompileResult<()> {
        let a = self.blend;
        let eq = self.key.blend_eq();
        let src_factor = self.key.blend_src();
        let dst_factor = self.key.blend_dst();

        self.expand_color(color)?;
        let zero = self.zero_vec()?;
        emit_sse_rr(self.buf, OPC_PUNPCKLBW, dst, zero);
        self.regs.unlock(Purpose::VecZero);

        if a.multiply_src || a.src_color_as_factor {
            emit_vec_shift_ri(self.buf, VecShiftOp::Sll, color, 4);
        }
        if a.multiply_dst || a.dst_color_as_factor {
            emit_vec_shift_ri(self.buf, VecShiftOp::Sll, dst, 4);
        }

        // Both factors are built before either color is scaled, since
        // each may read the other color.
        let sf = if a.multiply_src {
            Some(self.blend_factor(Purpose::VecTemp1, src_factor, color, dst, false)?)
        } else {
            None
        };
        let df = match (a.multiply_dst, sf) {
            (false, _) => None,
            (true, Some(sf)) if a.dst_factor_is_inverse => {
                let df = self.load_const(Purpose::VecTemp2, pool::BLEND_INVERT)?;
                emit_sse_rr(self.buf, OPC_PSUBUSW, df, sf);
                Some(df)
            }
            (true, _) => Some(self.blend_factor(Purpose::VecTemp2, dst_factor, color, dst, true)?),
        };

        if sf.is_some() || df.is_some() {
            let half = self.load_const(Purpose::VecTemp3, pool::BLEND_HALF)?;
            if let Some(sf) = sf {
                emit_sse_rr(self.buf, OPC_POR, sf, half);
                emit_sse_rr(self.buf, OPC_POR, color, half);
                emit_sse_rr(self.buf, OPC_PMULHUW, color, sf);
            }
            if let Some(df) = df {
                emit_sse_rr(self.buf, OPC_POR, df, half);
                emit_sse_rr(self.buf, OPC_POR, dst, half);
                emit_sse_rr(self.buf, OPC_PMULHUW, dst, df);
            }
            self.regs.release(Purpose::VecTemp3);
            self.regs.release(Purpose::VecTemp2);
            self.regs.release(Purpose::VecTemp1);
        }

        match src_factor {
            BlendFactor::Zero => emit_sse_rr(self.buf, OPC_PXOR, color, color),
            BlendFactor::One if a.src_color_as_factor => {
                emit_vec_shift_ri(self.buf, VecShiftOp::Srl, color, 4)
            }
            _ => {}
        }
        match dst_factor {
            BlendFactor::Zero if eq == BlendEq::ReverseSubtract => {
                emit_sse_rr(self.buf, OPC_PXOR, dst, dst)
            }
            BlendFactor::One if a.dst_color_as_factor => {
                emit_vec_shift_ri(self.buf, VecShiftOp::Srl, dst, 4)
            }
            _ => {}
        }

        let dst_is_zero = dst_factor == BlendFactor::Zero;
        match eq {
            BlendEq::Add if !dst_is_zero => emit_sse_rr(self.buf, OPC_PADDUSW, color, dst),
            BlendEq::Subtract if !dst_is_zero => emit_sse_rr(self.buf, OPC_PSUBUSW, color, dst),
            BlendEq::ReverseSubtract => {
                emit_sse_rr(self.buf, OPC_PSUBUSW, dst, color);
                emit_sse_rr(self.buf, OPC_MOVDQA_VxWx, color, dst);
            }
            _ => {}
        }
        Ok(())
    }

    /// Build `factor` in 11.4 form. `for_dst` selects which color
    /// `OtherColor` refers to and which fixed color `Fix` reads.
    fn blend_factor(
        &mut self,
        purpose: Purpose,
        factor: BlendFactor,
        color: Xmm,
        dst: Xmm,
        for_dst: bool,
    ) -> CompileResult<Xmm> {
        let r = self.regs.alloc_vec(purpose)?;
        let inverse = matches!(
            factor,
            BlendFactor::InvOtherColor
                | BlendFactor::InvSrcAlpha
                | BlendFactor::InvDstAlpha
                | BlendFactor::DoubleInvSrcAlpha
                | BlendFactor::DoubleInvDstAlpha
        );
        let double = matches!(
            factor,
            BlendFactor::DoubleSrcAlpha
                | BlendFactor::DoubleInvSrcAlpha
                | BlendFactor::DoubleDstAlpha
                | BlendFactor::DoubleInvDstAlpha
        );
        // Inverse factors are computed into a scratch and subtracted.
        let v = if inverse {
            self.regs.alloc_vec(Purpose::VecTemp3)?
        } else {
            r
        };

        match factor {
            BlendFactor::OtherColor | BlendFactor::InvOtherColor => {
                let other = if for_dst { color } else { dst };
                emit_sse_rr(self.buf, OPC_MOVDQA_VxWx, v, other);
            }
            BlendFactor::SrcAlpha
            | BlendFactor::InvSrcAlpha
            | BlendFactor::DoubleSrcAlpha
            | BlendFactor::DoubleInvSrcAlpha => emit_pshuflw(self.buf, v, color, 0xFF),
            BlendFactor::DstAlpha
            | BlendFactor::InvDstAlpha
            | BlendFactor::DoubleDstAlpha
            | BlendFactor::DoubleInvDstAlpha => emit_pshuflw(self.buf, v, dst, 0xFF),
            BlendFactor::Fix => {
                let offset = if for_dst {
                    field::BLEND_FIX_B
                } else {
                    field::BLEND_FIX_A
                };
                let gs = self.gstate()?;
                emit_movd_xm(self.buf, v, gs, offset);
                self.regs.unlock(Purpose::GState);
                let zero = self.zero_vec()?;
                emit_sse_rr(self.buf, OPC_PUNPCKLBW, v, zero);
                self.regs.unlock(Purpose::VecZero);
                emit_vec_shift_ri(self.buf, VecShiftOp::Sll, v, 4);
            }
            BlendFactor::Zero => emit_sse_rr(self.buf, OPC_PXOR, v, v),
            BlendFactor::One => {
                emit_sse_rr(self.buf, OPC_PCMPEQD, v, v);
                emit_vec_shift_ri(self.buf, VecShiftOp::Srl, v, 8);
                emit_vec_shift_ri(self.buf, VecShiftOp::Sll, v, 4);
            }
        }
        if double {
            emit_vec_shift_ri(self.buf, VecShiftOp::Sll, v, 1);
        }
        if inverse {
            let cb = self.const_base()?;
            emit_sse_rm(self.buf, OPC_MOVDQA_VxWx, r, cb, pool::BLEND_INVERT);
            self.regs.unlock(Purpose::ConstBase);
            emit_sse_rr(self.buf, OPC_PSUBUSW, r, v);
            self.regs.release(Purpose::VecTemp3);
        }
        Ok(r)
    }
}
