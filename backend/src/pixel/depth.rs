use pixjit_core::CompareFunc;

use super::{field, pass_cond, PixelCompiler, Stage};
use crate::error::CompileResult;
use crate::regcache::Purpose;
use crate::x86_64::emitter::*;

impl PixelCompiler<'_> {
    /// Discard pixels whose z falls outside `[min_z, max_z]`.
    pub(super) fn depth_range(&mut self) -> CompileResult<()> {
        self.mark(Stage::DepthRange);
        if self.key.apply_depth_range() {
            let gs = self.gstate()?;
            let z = self.regs.find_gen(Purpose::ArgZ)?;
            emit_arith_rm(self.buf, ArithOp::Cmp, OpSize::Word, z, gs, field::MIN_Z);
            self.discard_if(X86Cond::Jb);
            emit_arith_rm(self.buf, ArithOp::Cmp, OpSize::Word, z, gs, field::MAX_Z);
            self.discard_if(X86Cond::Ja);
            self.regs.unlock(Purpose::ArgZ);
            self.regs.unlock(Purpose::GState);
        }
        if !self.needs_depth_off() {
            self.regs.force_release(Purpose::ArgZ);
        }
        Ok(())
    }

    /// Compare z against the stored depth. Returns the condition under
    /// which the test passes, or `None` when `func` does not compare.
    pub(super) fn emit_depth_compare(&mut self, func: CompareFunc) -> CompileResult<Option<X86Cond>> {
        let Some(pass) = pass_cond(func) else {
            return Ok(None);
        };
        let depth = self.depth_off()?;
        let z = self.regs.find_gen(Purpose::ArgZ)?;
        emit_arith_rm(self.buf, ArithOp::Cmp, OpSize::Word, z, depth, 0);
        self.regs.unlock(Purpose::ArgZ);
        self.regs.unlock(Purpose::DepthOff);
        Ok(Some(pass))
    }

    /// Depth test without stencil side effects.
    pub(super) fn depth_test(&mut self) -> CompileResult<()> {
        self.mark(Stage::DepthTest);
        let func = self.key.depth_test_func();
        if func == CompareFunc::Never {
            self.discard();
        } else if let Some(pass) = self.emit_depth_compare(func)? {
            self.discard_if(pass.invert());
        }
        if !self.key.depth_write() {
            self.regs.force_release(Purpose::ArgZ);
        }
        Ok(())
    }

    pub(super) fn write_depth(&mut self) -> CompileResult<()> {
        self.mark(Stage::WriteDepth);
        if self.key.depth_write() {
            let depth = self.depth_off()?;
            let z = self.regs.find_gen(Purpose::ArgZ)?;
            emit_store(self.buf, OpSize::Word, z, depth, 0);
        }
        self.regs.force_release(Purpose::ArgZ);
        self.regs.force_release(Purpose::DepthOff);
        Ok(())
    }
}
