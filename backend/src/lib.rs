pub mod code_buffer;
pub mod error;
pub mod label;
pub mod pixel;
pub mod regcache;
pub mod x86_64;

pub use code_buffer::CodeBuffer;
pub use error::{CompileError, CompileResult};
pub use pixel::{CompiledPixel, Stage, StageMarker, MAX_FUNC_SIZE};
pub use regcache::{Purpose, RegCache};
pub use x86_64::X86_64PixelGen;

use pixjit_core::{GpuState, PixelKey};

/// Trait for host code generators of pixel functions.
///
/// Each host architecture implements this trait to turn a
/// [`PixelKey`] into a callable function with the signature
/// `extern "C" fn(x, y, z, fog, color, key)`.
pub trait PixelCodeGen: Send + Sync {
    /// Emit the function for `key` at the end of `buf`.
    ///
    /// `state` is baked into the generated code; it must stay valid
    /// for as long as the code may run. On error nothing is left
    /// behind in `buf`.
    fn compile(
        &self,
        buf: &mut CodeBuffer,
        key: &PixelKey,
        state: *const GpuState,
    ) -> CompileResult<CompiledPixel>;
}
