use std::fmt;

use pixjit_core::PixelKey;

/// Raw signature of generated code.
type RawPixelFn = unsafe extern "C" fn(i32, i32, i32, i32, u32, *const PixelKey);

/// Entry point of one compiled pixel function.
///
/// Valid until the cache that produced it is cleared or dropped.
#[derive(Clone, Copy)]
pub struct PixelFunc {
    raw: RawPixelFn,
}

impl PixelFunc {
    /// # Safety
    /// `code` must point to a complete function generated for the
    /// pixel calling convention, in executable memory.
    pub(crate) unsafe fn from_code_ptr(code: *const u8) -> Self {
        Self {
            raw: std::mem::transmute::<*const u8, RawPixelFn>(code),
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.raw as *const u8
    }

    /// Run the pipeline for one pixel.
    ///
    /// `color` is canonical RGBA8888 (see `pixjit_core::pack_color`).
    ///
    /// # Safety
    /// - The cache that returned this function is neither cleared nor
    ///   dropped while the call runs.
    /// - `key` carries the configuration this function was compiled for.
    /// - The bound `GpuState` buffers cover `(x, y)` and no other thread
    ///   writes the same pixel concurrently.
    #[inline]
    pub unsafe fn invoke(self, x: i32, y: i32, z: u16, fog: u8, color: u32, key: &PixelKey) {
        (self.raw)(x, y, z as i32, fog as i32, color, key)
    }
}

impl PartialEq for PixelFunc {
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr()
    }
}

impl Eq for PixelFunc {}

impl fmt::Debug for PixelFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFunc({:p})", self.as_ptr())
    }
}
