//! Color entry and the alpha and color tests.

use pixjit_core::{ColorTestFunc, CompareFunc};

use super::{field, pass_cond, PixelCompiler, Stage};
use crate::error::CompileResult;
use crate::label::{emit_jcc_label, emit_jmp_label, Label};
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;

impl PixelCompiler<'_> {
    /// Move the packed argument color into a vector register. The
    /// argument bytes are already clamped, so this is a plain move.
    pub(super) fn clamp_color(&mut self) -> CompileResult<()> {
        self.mark(Stage::ClampColor);
        let vc = self.regs.alloc_vec(Purpose::VecArgColor)?;
        let c = self.regs.find_gen(Purpose::ArgColor)?;
        emit_movd_xr(self.buf, vc, c);
        self.regs.force_release(Purpose::ArgColor);
        self.regs.unlock(Purpose::VecArgColor);
        self.color_is_16 = false;
        Ok(())
    }

    pub(super) fn alpha_test(&mut self) -> CompileResult<()> {
        self.mark(Stage::AlphaTest);
        let func = self.key.alpha_test_func();
        let Some(pass) = pass_cond(func) else {
            if func == CompareFunc::Never {
                self.discard();
            }
            return Ok(());
        };

        let vc = self.regs.find_vec(Purpose::VecArgColor)?;
        let alpha = self.regs.alloc_gen(Purpose::SrcAlpha)?;
        emit_movd_rx(self.buf, alpha, vc);
        emit_shift_ri(self.buf, ShiftOp::Shr, false, alpha, 24);
        self.regs.unlock(Purpose::VecArgColor);

        if self.key.has_alpha_test_mask() {
            let gs = self.gstate()?;
            emit_arith_rm(self.buf, ArithOp::And, OpSize::Byte, alpha, gs, field::ALPHA_TEST_MASK);
            self.regs.unlock(Purpose::GState);
        }
        emit_arith_ri(self.buf, ArithOp::Cmp, false, alpha, self.key.alpha_test_ref() as i32);
        self.discard_if(pass.invert());
        self.regs.release(Purpose::SrcAlpha);
        Ok(())
    }

    /// The color test function, reference and mask are all read from
    /// the state block at run time.
    pub(super) fn color_test(&mut self) -> CompileResult<()> {
        self.mark(Stage::ColorTest);
        if !self.key.color_test() {
            return Ok(());
        }

        // Everything is allocated before branching so all paths agree.
        let gs = self.gstate()?;
        let func = self.regs.alloc_gen(Purpose::GenTemp0)?;
        let mask = self.regs.alloc_gen(Purpose::GenTemp1)?;
        let reference = self.regs.alloc_gen(Purpose::GenTemp2)?;

        emit_load(self.buf, false, mask, gs, field::COLOR_TEST_MASK);
        emit_arith_ri(self.buf, ArithOp::And, false, mask, 0x00FF_FFFF);
        emit_load(self.buf, false, reference, gs, field::COLOR_TEST_REF);
        emit_arith_rr(self.buf, ArithOp::And, false, reference, mask);

        let vc = self.regs.find_vec(Purpose::VecArgColor)?;
        self.pack_color(vc);
        emit_movd_rx(self.buf, func, vc);
        emit_arith_rr(self.buf, ArithOp::And, false, mask, func);
        self.regs.unlock(Purpose::VecArgColor);

        emit_load_zx(self.buf, OPC_MOVZBL, func, gs, field::COLOR_TEST_FUNC);
        self.regs.unlock(Purpose::GState);

        let mut equal = Label::new();
        let mut done = Label::new();
        emit_arith_ri(self.buf, ArithOp::Cmp, false, func, ColorTestFunc::Always as i32);
        self.discard_if(X86Cond::Jb);
        emit_jcc_label(self.buf, X86Cond::Je, &mut done);
        emit_arith_ri(self.buf, ArithOp::Cmp, false, func, ColorTestFunc::Equal as i32);
        emit_jcc_label(self.buf, X86Cond::Je, &mut equal);

        emit_arith_rr(self.buf, ArithOp::Cmp, false, reference, mask);
        self.discard_if(X86Cond::Je);
        emit_jmp_label(self.buf, &mut done);

        equal.bind(self.buf);
        emit_arith_rr(self.buf, ArithOp::Cmp, false, reference, mask);
        self.discard_if(X86Cond::Jne);
        done.bind(self.buf);

        self.regs.release(Purpose::GenTemp0);
        self.regs.release(Purpose::GenTemp1);
        self.regs.release(Purpose::GenTemp2);
        Ok(())
    }
}
