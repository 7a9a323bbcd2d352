//! Pixel addressing and destination stencil reads.

use pixjit_core::FbFormat;

use super::{field, PixelCompiler};
use crate::error::CompileResult;
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;
use crate::x86_64::regs::Reg;

fn scale_shift(bytes_per_pixel: usize) -> u8 {
    match bytes_per_pixel {
        2 => 1,
        _ => 2,
    }
}

impl PixelCompiler<'_> {
    /// Whether any stage reads or writes the depth buffer.
    pub(super) fn needs_depth_off(&self) -> bool {
        self.key.depth_write() || self.key.depth_test_func().compares()
    }

    /// The standard stride lets the row offset be a shift. Dithering
    /// still needs the coordinates afterwards, so it takes the general
    /// path, which leaves them intact.
    fn fast_address(&self) -> bool {
        self.key.use_standard_stride() && !self.key.dithering()
    }

    /// Address of the pixel in the color buffer, computed on first use
    /// and retained until the color write. Returned locked.
    pub(super) fn color_off(&mut self) -> CompileResult<Reg> {
        if self.regs.has(Purpose::ColorOff) {
            return self.regs.find_gen(Purpose::ColorOff);
        }
        let shift = scale_shift(self.key.fb_format().bytes_per_pixel());

        if self.fast_address() {
            let x = self.regs.find_gen(Purpose::ArgX)?;
            let y = self.regs.find_gen(Purpose::ArgY)?;
            emit_shift_ri(self.buf, ShiftOp::Shl, false, y, 9);
            emit_arith_rr(self.buf, ArithOp::Add, false, y, x);
            self.regs.unlock(Purpose::ArgX);

            let gs = self.gstate()?;
            if self.needs_depth_off() {
                emit_load(self.buf, true, x, gs, field::DEPTH_BASE);
                emit_lea_sib(self.buf, true, x, x, y, 1, 0);
                self.regs.change(Purpose::ArgX, Purpose::DepthOff)?;
                self.regs.force_retain(Purpose::DepthOff);
            } else {
                self.regs.force_release(Purpose::ArgX);
            }
            emit_shift_ri(self.buf, ShiftOp::Shl, true, y, shift);
            emit_arith_rm(self.buf, ArithOp::Add, OpSize::Qword, y, gs, field::FB_BASE);
            self.regs.unlock(Purpose::GState);

            self.regs.change(Purpose::ArgY, Purpose::ColorOff)?;
            self.regs.force_retain(Purpose::ColorOff);
            return Ok(y);
        }

        let r = self.regs.alloc_gen(Purpose::ColorOff)?;
        self.emit_general_address(r, field::FB_STRIDE, field::FB_BASE, shift)?;
        self.regs.force_retain(Purpose::ColorOff);
        Ok(r)
    }

    /// Address of the pixel in the depth buffer. Returned locked.
    pub(super) fn depth_off(&mut self) -> CompileResult<Reg> {
        if self.regs.has(Purpose::DepthOff) {
            return self.regs.find_gen(Purpose::DepthOff);
        }
        if self.fast_address() && !self.regs.has(Purpose::ColorOff) {
            // Computes both offsets at once.
            self.color_off()?;
            self.regs.unlock(Purpose::ColorOff);
            return self.regs.find_gen(Purpose::DepthOff);
        }

        let r = self.regs.alloc_gen(Purpose::DepthOff)?;
        self.emit_general_address(r, field::DEPTH_STRIDE, field::DEPTH_BASE, 1)?;
        self.regs.force_retain(Purpose::DepthOff);
        Ok(r)
    }

    /// `dst = base + (y * stride + x) << shift`, with stride and base
    /// read from the state block.
    fn emit_general_address(
        &mut self,
        dst: Reg,
        stride: i32,
        base: i32,
        shift: u8,
    ) -> CompileResult<()> {
        let gs = self.gstate()?;
        let x = self.regs.find_gen(Purpose::ArgX)?;
        let y = self.regs.find_gen(Purpose::ArgY)?;
        emit_load_zx(self.buf, OPC_MOVZWL, dst, gs, stride);
        emit_imul_rr(self.buf, false, dst, y);
        emit_arith_rr(self.buf, ArithOp::Add, false, dst, x);
        emit_shift_ri(self.buf, ShiftOp::Shl, true, dst, shift);
        emit_arith_rm(self.buf, ArithOp::Add, OpSize::Qword, dst, gs, base);
        self.regs.unlock(Purpose::ArgX);
        self.regs.unlock(Purpose::ArgY);
        self.regs.unlock(Purpose::GState);
        Ok(())
    }

    /// Load the stencil value stored in the destination pixel, widened
    /// to 8 bits. `None` for formats without stencil bits. Returned
    /// locked and retained.
    pub(super) fn dest_stencil(&mut self) -> CompileResult<Option<Reg>> {
        let format = self.key.fb_format();
        if !format.has_stencil() {
            return Ok(None);
        }
        let co = self.color_off()?;
        let st = self.regs.alloc_gen(Purpose::Stencil)?;
        match format {
            FbFormat::Rgba8888 => emit_load_zx(self.buf, OPC_MOVZBL, st, co, 3),
            FbFormat::Rgba5551 => {
                emit_load_sx(self.buf, OPC_MOVSBL, st, co, 1);
                emit_shift_ri(self.buf, ShiftOp::Sar, false, st, 7);
                emit_arith_ri(self.buf, ArithOp::And, false, st, 0xFF);
            }
            FbFormat::Rgba4444 => {
                emit_load_zx(self.buf, OPC_MOVZBL, st, co, 1);
                emit_shift_ri(self.buf, ShiftOp::Shr, false, st, 4);
                let t = self.regs.alloc_gen(Purpose::TempHelper)?;
                emit_mov_rr(self.buf, false, t, st);
                emit_shift_ri(self.buf, ShiftOp::Shl, false, t, 4);
                emit_arith_rr(self.buf, ArithOp::Or, false, st, t);
                self.regs.release(Purpose::TempHelper);
            }
            FbFormat::Rgb565 => {}
        }
        self.regs.unlock(Purpose::ColorOff);
        self.regs.force_retain(Purpose::Stencil);
        Ok(Some(st))
    }
}
