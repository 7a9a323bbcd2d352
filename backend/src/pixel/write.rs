//! Final color write: format conversion, stencil merge, logic op and
//! the masked store.

use pixjit_core::{FbFormat, LogicOp, PixelKey};

use super::convert::emit_convert_to;
use super::{field, PixelCompiler, Stage};
use crate::error::CompileResult;
use crate::label::{emit_jmp_label, patch_rel32, Label};
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;
use crate::x86_64::regs::Reg;

impl PixelCompiler<'_> {
    pub(super) fn write_color(&mut self) -> CompileResult<()> {
        self.mark(Stage::WriteColor);
        let key = self.key;
        let format = key.fb_format();

        if key.clear_mode() && !key.color_clear() {
            if key.stencil_clear() && format.has_stencil() {
                // Stencil-only clear: the stencil value is the color's alpha.
                let vc = self.regs.find_vec(Purpose::VecArgColor)?;
                self.pack_color(vc);
                let stencil = self.regs.alloc_gen(Purpose::Stencil)?;
                emit_movd_rx(self.buf, stencil, vc);
                emit_shift_ri(self.buf, ShiftOp::Shr, false, stencil, 24);
                self.regs.unlock(Purpose::VecArgColor);
                self.write_stencil_only(stencil)?;
                self.regs.force_release(Purpose::Stencil);
            }
            return Ok(());
        }

        let co = self.color_off()?;
        self.regs.force_release(Purpose::ArgX);
        self.regs.force_release(Purpose::ArgY);

        let vc = self.regs.find_vec(Purpose::VecArgColor)?;
        self.pack_color(vc);
        let color = self.regs.alloc_gen(Purpose::GenTemp0)?;
        emit_movd_rx(self.buf, color, vc);
        self.regs.force_release(Purpose::VecArgColor);

        let stencil = if self.regs.has(Purpose::Stencil) {
            Some(self.regs.find_gen(Purpose::Stencil)?)
        } else {
            None
        };
        let convert_alpha = key.clear_mode() && key.stencil_clear();
        let writes_alpha = convert_alpha || stencil.is_some();
        let fixed_keep = if writes_alpha { 0 } else { format.stencil_bits() };

        let t1 = self.regs.alloc_gen(Purpose::GenTemp1)?;
        let t2 = self.regs.alloc_gen(Purpose::GenTemp2)?;
        emit_convert_to(self.buf, format, color, t1, t2, convert_alpha);
        self.regs.release(Purpose::GenTemp1);
        self.regs.release(Purpose::GenTemp2);

        if let Some(st) = stencil {
            match format {
                FbFormat::Rgba5551 => {
                    emit_shift_ri(self.buf, ShiftOp::Shr, false, st, 7);
                    emit_shift_ri(self.buf, ShiftOp::Shl, false, st, 15);
                }
                FbFormat::Rgba4444 => {
                    emit_shift_ri(self.buf, ShiftOp::Shr, false, st, 4);
                    emit_shift_ri(self.buf, ShiftOp::Shl, false, st, 12);
                }
                FbFormat::Rgba8888 => emit_shift_ri(self.buf, ShiftOp::Shl, false, st, 24),
                FbFormat::Rgb565 => {}
            }
        }

        let mask = if key.apply_color_write_mask() {
            let m = self.regs.alloc_gen(Purpose::GenTemp3)?;
            let arg = self.regs.find_gen(Purpose::ArgKey)?;
            emit_load(self.buf, false, m, arg, PixelKey::WRITE_MASK_OFFSET);
            Some(m)
        } else {
            None
        };
        self.regs.force_release(Purpose::ArgKey);

        if key.apply_logic_op() {
            self.logic_op(color, co, stencil.is_some())?;
            self.mark(Stage::WriteColor);
        }

        if let Some(st) = stencil {
            emit_arith_ri(self.buf, ArithOp::And, false, color, !format.stencil_bits() as i32);
            emit_arith_rr(self.buf, ArithOp::Or, false, color, st);
        }
        self.regs.force_release(Purpose::Stencil);

        let size = match format.bytes_per_pixel() {
            2 => OpSize::Word,
            _ => OpSize::Dword,
        };
        if let Some(m) = mask {
            // Set mask bits are protected.
            emit_arith_mr(self.buf, ArithOp::And, size, co, 0, m);
            emit_not(self.buf, false, m);
            emit_arith_rr(self.buf, ArithOp::And, false, color, m);
            emit_arith_mr(self.buf, ArithOp::Or, size, co, 0, color);
            self.regs.release(Purpose::GenTemp3);
        } else if fixed_keep == 0 {
            emit_store(self.buf, size, color, co, 0);
        } else if format == FbFormat::Rgba8888 {
            // Leave the alpha byte alone.
            emit_store(self.buf, OpSize::Word, color, co, 0);
            emit_shift_ri(self.buf, ShiftOp::Shr, false, color, 16);
            emit_store(self.buf, OpSize::Byte, color, co, 2);
        } else {
            if key.apply_logic_op() {
                emit_arith_ri(self.buf, ArithOp::And, false, color, !fixed_keep as i32);
            }
            emit_arith_mi(self.buf, ArithOp::And, size, co, 0, fixed_keep as i32);
            emit_arith_mr(self.buf, ArithOp::Or, size, co, 0, color);
        }

        self.regs.release(Purpose::GenTemp0);
        self.regs.force_release(Purpose::ColorOff);
        Ok(())
    }

    /// Combine `color` with the stored pixel using the logic op selected
    /// in the state block. The sixteen bodies are reached through a jump
    /// table emitted inline.
    fn logic_op(&mut self, color: Reg, co: Reg, has_stencil: bool) -> CompileResult<()> {
        self.mark(Stage::LogicOp);
        let dst = self.regs.alloc_gen(Purpose::GenTemp4)?;
        if self.key.fb_format() == FbFormat::Rgba8888 {
            emit_load(self.buf, false, dst, co, 0);
        } else {
            emit_load_zx(self.buf, OPC_MOVZWL, dst, co, 0);
        }

        let op = self.regs.alloc_gen(Purpose::GenTemp5)?;
        let gs = self.gstate()?;
        emit_load_zx(self.buf, OPC_MOVZBL, op, gs, field::LOGIC_OP);
        self.regs.unlock(Purpose::GState);
        emit_arith_ri(self.buf, ArithOp::And, false, op, 0xF);
        let table = self.regs.alloc_gen(Purpose::TempHelper)?;

        let mut dispatch = Label::new();
        let mut done = Label::new();
        emit_jmp_label(self.buf, &mut dispatch);

        let mut bodies = [0usize; 16];
        for logic in LogicOp::ALL {
            bodies[logic as usize] = self.buf.offset();
            if logic == LogicOp::Noop && !has_stencil {
                // Nothing changes, so skip the store.
                self.discard();
                continue;
            }
            let b = &mut *self.buf;
            match logic {
                LogicOp::Clear => emit_arith_rr(b, ArithOp::Xor, false, color, color),
                LogicOp::And => emit_arith_rr(b, ArithOp::And, false, color, dst),
                LogicOp::AndReverse => {
                    emit_not(b, false, dst);
                    emit_arith_rr(b, ArithOp::And, false, color, dst);
                }
                LogicOp::Copy => {}
                LogicOp::AndInverted => {
                    emit_not(b, false, color);
                    emit_arith_rr(b, ArithOp::And, false, color, dst);
                }
                LogicOp::Noop => emit_mov_rr(b, false, color, dst),
                LogicOp::Xor => emit_arith_rr(b, ArithOp::Xor, false, color, dst),
                LogicOp::Or => emit_arith_rr(b, ArithOp::Or, false, color, dst),
                LogicOp::Nor => {
                    emit_arith_rr(b, ArithOp::Or, false, color, dst);
                    emit_not(b, false, color);
                }
                LogicOp::Equiv => {
                    emit_arith_rr(b, ArithOp::Xor, false, color, dst);
                    emit_not(b, false, color);
                }
                LogicOp::Inverted => {
                    emit_mov_rr(b, false, color, dst);
                    emit_not(b, false, color);
                }
                LogicOp::OrReverse => {
                    emit_not(b, false, dst);
                    emit_arith_rr(b, ArithOp::Or, false, color, dst);
                }
                LogicOp::CopyInverted => emit_not(b, false, color),
                LogicOp::OrInverted => {
                    emit_not(b, false, color);
                    emit_arith_rr(b, ArithOp::Or, false, color, dst);
                }
                LogicOp::Nand => {
                    emit_arith_rr(b, ArithOp::And, false, color, dst);
                    emit_not(b, false, color);
                }
                LogicOp::Set => emit_mov_ri32(b, color, 0xFFFF_FFFF),
            }
            emit_jmp_label(self.buf, &mut done);
        }

        emit_align(self.buf, 8);
        let table_offset = self.buf.offset();
        let base = self.buf.base_ptr() as u64;
        for body in bodies {
            self.buf.emit_u64(base + body as u64);
        }

        dispatch.bind(self.buf);
        let disp = emit_lea_rip(self.buf, table);
        patch_rel32(self.buf, disp, table_offset);
        emit_jmp_table(self.buf, table, op);
        done.bind(self.buf);

        self.regs.release(Purpose::TempHelper);
        self.regs.release(Purpose::GenTemp5);
        self.regs.release(Purpose::GenTemp4);
        Ok(())
    }
}
