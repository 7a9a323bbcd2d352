//! Stencil test, stencil update operations and stencil-only writes.
//!
//! A pixel failing the stencil or depth test still updates the stencil
//! bits of the destination before it is discarded. Those paths never
//! rejoin the passing path and are compiled between a register cache
//! checkpoint and its restore.

use pixjit_core::{CompareFunc, FbFormat, StencilOp};

use super::{field, PixelCompiler, Stage};
use crate::error::CompileResult;
use crate::label::{emit_jcc_label, Label};
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;
use crate::x86_64::regs::Reg;

/// Condition under which `reference OP stencil` holds after
/// `cmp stencil, reference`.
fn stencil_pass_cond(func: CompareFunc) -> Option<X86Cond> {
    match func {
        CompareFunc::Never | CompareFunc::Always => None,
        CompareFunc::Equal => Some(X86Cond::Je),
        CompareFunc::NotEqual => Some(X86Cond::Jne),
        CompareFunc::Less => Some(X86Cond::Ja),
        CompareFunc::LessEqual => Some(X86Cond::Jae),
        CompareFunc::Greater => Some(X86Cond::Jb),
        CompareFunc::GreaterEqual => Some(X86Cond::Jbe),
    }
}

impl PixelCompiler<'_> {
    pub(super) fn stencil_and_depth_test(&mut self) -> CompileResult<()> {
        self.mark(Stage::StencilTest);
        let Some(stencil) = self.dest_stencil()? else {
            // No stencil bits: the test sees a stored value of zero.
            let func = self.key.stencil_test_func();
            if !func.passes(self.key.stencil_test_ref() as u32, 0) {
                self.discard();
            }
            return self.depth_test();
        };

        let func = self.key.stencil_test_func();
        if func == CompareFunc::Never {
            self.stencil_fail_path(self.key.stencil_fail_op())?;
        } else if let Some(pass) = stencil_pass_cond(func) {
            let masked = if self.key.has_stencil_test_mask() {
                let m = self.regs.alloc_gen(Purpose::GenTemp0)?;
                let gs = self.gstate()?;
                emit_load_zx(self.buf, OPC_MOVZBL, m, gs, field::STENCIL_MASK);
                self.regs.unlock(Purpose::GState);
                emit_arith_rr(self.buf, ArithOp::And, false, m, stencil);
                Some(m)
            } else {
                None
            };
            emit_arith_ri(
                self.buf,
                ArithOp::Cmp,
                false,
                masked.unwrap_or(stencil),
                self.key.stencil_test_ref() as i32,
            );
            if masked.is_some() {
                self.regs.release(Purpose::GenTemp0);
            }

            let mut passed = Label::new();
            emit_jcc_label(self.buf, pass, &mut passed);
            self.stencil_fail_path(self.key.stencil_fail_op())?;
            passed.bind(self.buf);
        }

        self.mark(Stage::DepthTest);
        let depth_func = self.key.depth_test_func();
        if depth_func == CompareFunc::Never {
            self.stencil_fail_path(self.key.depth_fail_op())?;
        } else if let Some(pass) = self.emit_depth_compare(depth_func)? {
            let mut passed = Label::new();
            emit_jcc_label(self.buf, pass, &mut passed);
            self.stencil_fail_path(self.key.depth_fail_op())?;
            passed.bind(self.buf);
        }
        if !self.key.depth_write() {
            self.regs.force_release(Purpose::ArgZ);
        }

        self.mark(Stage::StencilTest);
        let stencil = self.regs.find_gen(Purpose::Stencil)?;
        self.apply_stencil_op(self.key.depth_pass_op(), stencil)?;
        self.regs.unlock(Purpose::Stencil);
        // Locked by dest_stencil.
        self.regs.unlock(Purpose::Stencil);
        Ok(())
    }

    /// Update the stored stencil with `op`, then discard. Leaves the
    /// register cache as it found it.
    fn stencil_fail_path(&mut self, op: StencilOp) -> CompileResult<()> {
        let checkpoint = self.regs.checkpoint();
        if op != StencilOp::Keep {
            let stencil = self.regs.find_gen(Purpose::Stencil)?;
            self.apply_stencil_op(op, stencil)?;
            self.write_stencil_only(stencil)?;
        }
        self.discard();
        self.regs.restore(checkpoint);
        Ok(())
    }

    /// Apply `op` to the 8-bit stencil value in `stencil`.
    pub(super) fn apply_stencil_op(&mut self, op: StencilOp, stencil: Reg) -> CompileResult<()> {
        let format = self.key.fb_format();
        match op {
            StencilOp::Keep => {}
            StencilOp::Zero => emit_arith_rr(self.buf, ArithOp::Xor, false, stencil, stencil),
            StencilOp::Replace => {
                if self.key.has_stencil_test_mask() {
                    // The key only carries the masked reference.
                    let gs = self.gstate()?;
                    emit_load_zx(self.buf, OPC_MOVZBL, stencil, gs, field::STENCIL_REF);
                    self.regs.unlock(Purpose::GState);
                } else {
                    emit_mov_ri32(self.buf, stencil, self.key.stencil_test_ref() as u32);
                }
            }
            StencilOp::Invert => emit_arith_ri(self.buf, ArithOp::Xor, false, stencil, 0xFF),
            StencilOp::Incr => match format {
                FbFormat::Rgba5551 => emit_mov_ri32(self.buf, stencil, 0xFF),
                FbFormat::Rgba4444 => {
                    let mut skip = Label::new();
                    emit_arith_ri(self.buf, ArithOp::Cmp, false, stencil, 0xF0);
                    emit_jcc_label(self.buf, X86Cond::Jae, &mut skip);
                    emit_arith_ri(self.buf, ArithOp::Add, false, stencil, 0x11);
                    skip.bind(self.buf);
                }
                FbFormat::Rgba8888 => {
                    let mut skip = Label::new();
                    emit_arith_ri(self.buf, ArithOp::Cmp, false, stencil, 0xFF);
                    emit_jcc_label(self.buf, X86Cond::Je, &mut skip);
                    emit_arith_ri(self.buf, ArithOp::Add, false, stencil, 1);
                    skip.bind(self.buf);
                }
                FbFormat::Rgb565 => {}
            },
            StencilOp::Decr => match format {
                FbFormat::Rgba5551 => emit_arith_rr(self.buf, ArithOp::Xor, false, stencil, stencil),
                FbFormat::Rgba4444 => {
                    let mut skip = Label::new();
                    emit_arith_ri(self.buf, ArithOp::Cmp, false, stencil, 0x11);
                    emit_jcc_label(self.buf, X86Cond::Jb, &mut skip);
                    emit_arith_ri(self.buf, ArithOp::Sub, false, stencil, 0x11);
                    skip.bind(self.buf);
                }
                FbFormat::Rgba8888 => {
                    let mut skip = Label::new();
                    emit_test_rr(self.buf, false, stencil, stencil);
                    emit_jcc_label(self.buf, X86Cond::Je, &mut skip);
                    emit_arith_ri(self.buf, ArithOp::Sub, false, stencil, 1);
                    skip.bind(self.buf);
                }
                FbFormat::Rgb565 => {}
            },
        }
        Ok(())
    }

    /// Store the 8-bit `stencil` into the destination's stencil bits,
    /// leaving the color bits alone. Clobbers `stencil`.
    pub(super) fn write_stencil_only(&mut self, stencil: Reg) -> CompileResult<()> {
        self.mark(Stage::WriteStencil);
        let format = self.key.fb_format();
        let (offset, keep_low) = match format {
            FbFormat::Rgba5551 => (1, 0x7F),
            FbFormat::Rgba4444 => (1, 0x0F),
            FbFormat::Rgba8888 => (3, 0x00),
            FbFormat::Rgb565 => return Ok(()),
        };
        let co = self.color_off()?;

        if self.key.apply_color_write_mask() {
            // Protected bits: the alpha write mask plus the color bits
            // sharing the byte.
            let mask = self.regs.alloc_gen(Purpose::GenTemp5)?;
            let gs = self.gstate()?;
            emit_load_zx(self.buf, OPC_MOVZBL, mask, gs, field::ALPHA_WRITE_MASK);
            self.regs.unlock(Purpose::GState);
            if keep_low != 0 {
                emit_arith_ri(self.buf, ArithOp::Or, false, mask, keep_low);
            }
            emit_not(self.buf, false, stencil);
            emit_arith_rr(self.buf, ArithOp::Or, false, stencil, mask);
            emit_not(self.buf, false, stencil);
            emit_arith_mr(self.buf, ArithOp::And, OpSize::Byte, co, offset, mask);
            emit_arith_mr(self.buf, ArithOp::Or, OpSize::Byte, co, offset, stencil);
            self.regs.release(Purpose::GenTemp5);
        } else {
            match format {
                FbFormat::Rgba5551 => {
                    emit_arith_ri(self.buf, ArithOp::And, false, stencil, 0x80);
                    emit_arith_mi(self.buf, ArithOp::And, OpSize::Byte, co, offset, 0x7F);
                    emit_arith_mr(self.buf, ArithOp::Or, OpSize::Byte, co, offset, stencil);
                }
                FbFormat::Rgba4444 => {
                    emit_arith_ri(self.buf, ArithOp::And, false, stencil, 0xF0);
                    emit_arith_mi(self.buf, ArithOp::And, OpSize::Byte, co, offset, 0x0F);
                    emit_arith_mr(self.buf, ArithOp::Or, OpSize::Byte, co, offset, stencil);
                }
                _ => emit_store(self.buf, OpSize::Byte, stencil, co, offset),
            }
        }
        self.regs.unlock(Purpose::ColorOff);
        Ok(())
    }
}
