//! Compiled pixel functions run against real color and depth buffers.

mod clear;
mod stencil;
mod write;

use std::sync::Arc;

use pixjit_core::{FbFormat, GpuState, PipelineConfig, PixelKey, SharedGpuState};
use pixjit_exec::{CacheConfig, PixelJitCache};

pub const HEIGHT: usize = 16;

/// A small render target with its own state block and cache.
pub struct Target {
    pub format: FbFormat,
    stride: usize,
    color: Vec<u32>,
    depth: Vec<u16>,
    state: Arc<SharedGpuState>,
    pub cache: PixelJitCache,
}

impl Target {
    pub fn new(format: FbFormat) -> Self {
        Self::with_stride(format, 512)
    }

    pub fn with_stride(format: FbFormat, stride: u16) -> Self {
        crate::init_logging();
        let pixels = stride as usize * HEIGHT;
        let mut color = vec![0u32; pixels];
        let mut depth = vec![0u16; pixels];
        let state = Arc::new(SharedGpuState::new(GpuState {
            fb_base: color.as_mut_ptr() as *mut u8,
            depth_base: depth.as_mut_ptr(),
            fb_stride: stride,
            depth_stride: stride,
            ..GpuState::default()
        }));
        let cache = PixelJitCache::new(state.clone(), CacheConfig::default()).unwrap();
        Self {
            format,
            stride: stride as usize,
            color,
            depth,
            state,
            cache,
        }
    }

    pub fn state(&mut self) -> &mut GpuState {
        // SAFETY: `&mut self` excludes any running draw.
        unsafe { self.state.get_mut() }
    }

    pub fn shared_state(&self) -> &Arc<SharedGpuState> {
        &self.state
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.stride && y < HEIGHT);
        y * self.stride + x
    }

    /// Stored bits of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        let i = self.index(x, y);
        match self.format.bytes_per_pixel() {
            // SAFETY: the buffer holds `stride * HEIGHT` u32s, twice
            // the 16-bit pixels addressed here.
            2 => unsafe { *(self.color.as_ptr() as *const u16).add(i) as u32 },
            _ => self.color[i],
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, bits: u32) {
        let i = self.index(x, y);
        match self.format.bytes_per_pixel() {
            // SAFETY: see `pixel`.
            2 => unsafe { *(self.color.as_mut_ptr() as *mut u16).add(i) = bits as u16 },
            _ => self.color[i] = bits,
        }
    }

    pub fn depth(&self, x: usize, y: usize) -> u16 {
        self.depth[self.index(x, y)]
    }

    pub fn set_depth(&mut self, x: usize, y: usize, z: u16) {
        let i = self.index(x, y);
        self.depth[i] = z;
    }

    pub fn key(&self, config: &PipelineConfig) -> PixelKey {
        PixelKey::new(config, self.state.get())
    }

    /// Run the pipeline for one pixel. The key is rebuilt from the
    /// current state, as a rasterizer does per draw.
    pub fn draw(&self, config: &PipelineConfig, x: usize, y: usize, z: u16, fog: u8, color: u32) {
        let key = self.key(config);
        let func = self.cache.get_function(&key).unwrap();
        // SAFETY: (x, y) is inside both buffers and nothing else draws.
        unsafe { func.invoke(x as i32, y as i32, z, fog, color, &key) };
    }
}

/// `config` drawing to `format` with everything else defaulted.
pub fn config(format: FbFormat) -> PipelineConfig {
    PipelineConfig {
        fb_format: format,
        ..PipelineConfig::default()
    }
}

/// Deterministic sample values.
pub fn samples(seed: u32, count: usize) -> impl Iterator<Item = u32> {
    let mut state = seed;
    (0..count).map(move |_| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        state ^ (state >> 16)
    })
}
