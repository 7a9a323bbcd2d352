//! Per-draw GPU register block read by generated code at call time.

use std::cell::UnsafeCell;
use std::ptr;

use crate::key::{ColorTestFunc, LogicOp, STANDARD_STRIDE_PIXELS};

/// The standard 4x4 ordered dither bias.
pub const STANDARD_DITHER: [i8; 16] = [-4, 0, -3, 1, 2, -2, 3, -1, -3, 1, -4, 0, 3, -1, 2, -2];

/// Mutable GPU state consumed by compiled pixel functions.
///
/// Generated code addresses fields by offset, so the layout is fixed
/// with `repr(C)`. Colors use the canonical RGBA8888 layout; the
/// alpha byte of fixed colors is ignored.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GpuState {
    /// Color buffer base.
    pub fb_base: *mut u8,
    /// Depth buffer base.
    pub depth_base: *mut u16,
    /// Color buffer stride, in pixels.
    pub fb_stride: u16,
    /// Depth buffer stride, in pixels.
    pub depth_stride: u16,
    pub min_z: u16,
    pub max_z: u16,
    pub fog_color: u32,
    pub blend_fix_a: u32,
    pub blend_fix_b: u32,
    pub color_test_ref: u32,
    pub color_test_mask: u32,
    /// RGB write mask, set bits are protected.
    pub color_write_mask: u32,
    pub color_test_func: ColorTestFunc,
    pub alpha_test_mask: u8,
    /// Unmasked stencil reference.
    pub stencil_ref: u8,
    pub stencil_mask: u8,
    /// Alpha/stencil write mask, set bits are protected.
    pub alpha_write_mask: u8,
    pub logic_op: LogicOp,
    pub dither_matrix: [i8; 16],
}

impl Default for GpuState {
    fn default() -> Self {
        Self {
            fb_base: ptr::null_mut(),
            depth_base: ptr::null_mut(),
            fb_stride: STANDARD_STRIDE_PIXELS,
            depth_stride: STANDARD_STRIDE_PIXELS,
            min_z: 0,
            max_z: 0xFFFF,
            fog_color: 0,
            blend_fix_a: 0,
            blend_fix_b: 0,
            color_test_ref: 0,
            color_test_mask: 0x00FF_FFFF,
            color_write_mask: 0,
            color_test_func: ColorTestFunc::Always,
            alpha_test_mask: 0xFF,
            stencil_ref: 0,
            stencil_mask: 0xFF,
            alpha_write_mask: 0,
            logic_op: LogicOp::Copy,
            dither_matrix: STANDARD_DITHER,
        }
    }
}

/// [`GpuState`] at a stable address, shared between the thread that
/// updates it between draws and the threads running compiled code.
pub struct SharedGpuState {
    cell: UnsafeCell<GpuState>,
}

// SAFETY: generated code and `get` only read the state. Writers go
// through `get_mut`, whose contract excludes concurrent readers.
unsafe impl Sync for SharedGpuState {}
unsafe impl Send for SharedGpuState {}

impl SharedGpuState {
    pub fn new(state: GpuState) -> Self {
        Self {
            cell: UnsafeCell::new(state),
        }
    }

    /// Address baked into generated code.
    #[inline]
    pub fn as_ptr(&self) -> *const GpuState {
        self.cell.get()
    }

    #[inline]
    pub fn get(&self) -> &GpuState {
        // SAFETY: see `get_mut`; no writer runs while readers exist.
        unsafe { &*self.cell.get() }
    }

    /// Mutable access for updating state between draws.
    ///
    /// # Safety
    /// No compiled pixel function may be running and no reference
    /// returned by `get` may be alive while the result is used.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut GpuState {
        &mut *self.cell.get()
    }
}

impl Default for SharedGpuState {
    fn default() -> Self {
        Self::new(GpuState::default())
    }
}
