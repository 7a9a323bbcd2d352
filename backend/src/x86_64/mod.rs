pub mod emitter;
pub mod regs;

pub use regs::{Reg, Xmm};

use pixjit_core::{GpuState, PixelKey};

use crate::code_buffer::CodeBuffer;
use crate::error::CompileResult;
use crate::pixel::{CompiledPixel, PixelCompiler};
use crate::PixelCodeGen;

/// x86-64 SysV pixel function generator. Stateless; every call
/// compiles one key from scratch.
#[derive(Debug, Default, Clone, Copy)]
pub struct X86_64PixelGen;

impl X86_64PixelGen {
    pub fn new() -> Self {
        Self
    }
}

impl PixelCodeGen for X86_64PixelGen {
    fn compile(
        &self,
        buf: &mut CodeBuffer,
        key: &PixelKey,
        state: *const GpuState,
    ) -> CompileResult<CompiledPixel> {
        PixelCompiler::new(buf, key, state).compile()
    }
}
