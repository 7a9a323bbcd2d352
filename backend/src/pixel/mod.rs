//! Pixel pipeline compiler.
//!
//! [`PixelCompiler`] turns one [`PixelKey`] into a straight-line x86-64
//! function with the signature
//!
//! ```text
//! extern "C" fn(x: i32, y: i32, z: i32, fog: i32, color: u32, key: *const PixelKey)
//! ```
//!
//! Stages run in pipeline order and emit nothing for features the key
//! leaves off. A pixel that fails a test jumps forward to the single
//! shared `ret`; paths that always end in such a discard are compiled
//! between [`RegCache::checkpoint`] and [`RegCache::restore`] so the
//! surviving path keeps an accurate binding table.

mod address;
mod blend;
mod color;
pub mod convert;
mod depth;
mod shade;
mod stencil;
mod write;

use std::fmt;
use std::mem::offset_of;

use log::trace;
use pixjit_core::{BlendAnalysis, CompareFunc, GpuState, PixelKey};

use crate::code_buffer::CodeBuffer;
use crate::error::{CompileError, CompileResult};
use crate::label::{emit_jcc_label, emit_jmp_label, Label};
use crate::regcache::{Purpose, RegCache};
use crate::x86_64::emitter::*;
use crate::x86_64::regs::{Reg, Xmm};

/// Upper bound on the size of one compiled function, padding included.
pub const MAX_FUNC_SIZE: usize = 4096;

/// Byte offsets of [`GpuState`] fields addressed by generated code.
mod field {
    use super::*;

    pub const FB_BASE: i32 = offset_of!(GpuState, fb_base) as i32;
    pub const DEPTH_BASE: i32 = offset_of!(GpuState, depth_base) as i32;
    pub const FB_STRIDE: i32 = offset_of!(GpuState, fb_stride) as i32;
    pub const DEPTH_STRIDE: i32 = offset_of!(GpuState, depth_stride) as i32;
    pub const MIN_Z: i32 = offset_of!(GpuState, min_z) as i32;
    pub const MAX_Z: i32 = offset_of!(GpuState, max_z) as i32;
    pub const FOG_COLOR: i32 = offset_of!(GpuState, fog_color) as i32;
    pub const BLEND_FIX_A: i32 = offset_of!(GpuState, blend_fix_a) as i32;
    pub const BLEND_FIX_B: i32 = offset_of!(GpuState, blend_fix_b) as i32;
    pub const COLOR_TEST_REF: i32 = offset_of!(GpuState, color_test_ref) as i32;
    pub const COLOR_TEST_MASK: i32 = offset_of!(GpuState, color_test_mask) as i32;
    pub const COLOR_TEST_FUNC: i32 = offset_of!(GpuState, color_test_func) as i32;
    pub const ALPHA_TEST_MASK: i32 = offset_of!(GpuState, alpha_test_mask) as i32;
    pub const STENCIL_REF: i32 = offset_of!(GpuState, stencil_ref) as i32;
    pub const STENCIL_MASK: i32 = offset_of!(GpuState, stencil_mask) as i32;
    pub const ALPHA_WRITE_MASK: i32 = offset_of!(GpuState, alpha_write_mask) as i32;
    pub const LOGIC_OP: i32 = offset_of!(GpuState, logic_op) as i32;
}

/// 16-bit lane constants read by the vector stages. Legacy SSE
/// memory operands must be 16-byte aligned.
#[repr(C, align(16))]
struct ConstPool {
    const255: [u16; 8],
    by255: [u16; 8],
    blend_half: [u16; 8],
    blend_invert: [u16; 8],
}

static CONST_POOL: ConstPool = ConstPool {
    const255: [0x00FF; 8],
    by255: [0x8081; 8],
    blend_half: [0x0008; 8],
    blend_invert: [0x0FF0; 8],
};

mod pool {
    use super::*;

    pub const CONST255: i32 = offset_of!(ConstPool, const255) as i32;
    pub const BY255: i32 = offset_of!(ConstPool, by255) as i32;
    pub const BLEND_HALF: i32 = offset_of!(ConstPool, blend_half) as i32;
    pub const BLEND_INVERT: i32 = offset_of!(ConstPool, blend_invert) as i32;
}

/// Pipeline stage a range of generated code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    DepthRange,
    ClampColor,
    AlphaTest,
    Fog,
    ColorTest,
    StencilTest,
    DepthTest,
    WriteDepth,
    Blend,
    Dither,
    WriteColor,
    LogicOp,
    WriteStencil,
    Exit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Start of a stage within the code buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageMarker {
    pub offset: usize,
    pub stage: Stage,
}

/// Location of a compiled function within the code buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPixel {
    /// Entry point offset.
    pub start: usize,
    /// One past the last emitted byte.
    pub end: usize,
    /// Stage starts in code order.
    pub markers: Vec<StageMarker>,
}

impl CompiledPixel {
    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }

    /// Stage whose code covers `offset`.
    pub fn stage_at(&self, offset: usize) -> Option<Stage> {
        if !self.contains(offset) {
            return None;
        }
        self.markers
            .iter()
            .take_while(|m| m.offset <= offset)
            .last()
            .map(|m| m.stage)
    }
}

/// Single-use compiler for one key.
pub struct PixelCompiler<'a> {
    buf: &'a mut CodeBuffer,
    key: &'a PixelKey,
    state: *const GpuState,
    regs: RegCache,
    blend: BlendAnalysis,
    discard: Label,
    markers: Vec<StageMarker>,
    /// The working color holds 16-bit lanes instead of packed bytes.
    color_is_16: bool,
}

impl<'a> PixelCompiler<'a> {
    /// `state` is baked into the generated code and must outlive it.
    pub fn new(buf: &'a mut CodeBuffer, key: &'a PixelKey, state: *const GpuState) -> Self {
        Self {
            buf,
            key,
            state,
            regs: RegCache::new(),
            blend: BlendAnalysis::new(key),
            discard: Label::new(),
            markers: Vec::new(),
            color_is_16: false,
        }
    }

    /// Emit the function at the end of the buffer. On error the buffer
    /// is rolled back to where it was.
    pub fn compile(mut self) -> CompileResult<CompiledPixel> {
        let rollback = self.buf.offset();
        if self.buf.remaining() < MAX_FUNC_SIZE {
            return Err(CompileError::CodeBufferFull {
                remaining: self.buf.remaining(),
                needed: MAX_FUNC_SIZE,
            });
        }

        emit_align(self.buf, 16);
        let start = self.buf.offset();
        if let Err(err) = self.emit_stages() {
            self.regs.reset();
            self.buf.set_offset(rollback);
            return Err(err);
        }

        self.discard.bind(self.buf);
        self.mark(Stage::Exit);
        emit_ret(self.buf);
        self.regs.reset();

        Ok(CompiledPixel {
            start,
            end: self.buf.offset(),
            markers: self.markers,
        })
    }

    fn emit_stages(&mut self) -> CompileResult<()> {
        self.regs.setup_abi();
        self.mark(Stage::Init);
        if !self.key.needs_key_constants() {
            self.regs.force_release(Purpose::ArgKey);
        }

        self.depth_range()?;
        self.clamp_color()?;
        self.alpha_test()?;
        self.fog()?;
        self.color_test()?;
        if self.key.stencil_test() {
            self.stencil_and_depth_test()?;
        } else {
            self.depth_test()?;
        }
        self.write_depth()?;
        self.alpha_blend()?;
        self.dither()?;
        self.write_color()
    }

    fn mark(&mut self, stage: Stage) {
        let offset = self.buf.offset();
        trace!("{:#08x} {}", offset, stage);
        match self.markers.last_mut() {
            // Nothing was emitted for the previous stage.
            Some(last) if last.offset == offset => last.stage = stage,
            _ => self.markers.push(StageMarker { offset, stage }),
        }
    }

    // -- Shared helpers --

    /// Register holding the [`GpuState`] address, rebuilt if evicted.
    fn gstate(&mut self) -> CompileResult<Reg> {
        if self.regs.has(Purpose::GState) {
            return self.regs.find_gen(Purpose::GState);
        }
        let r = self.regs.alloc_gen(Purpose::GState)?;
        emit_mov_ri(self.buf, true, r, self.state as u64);
        Ok(r)
    }

    /// Register holding the constant pool address, rebuilt if evicted.
    fn const_base(&mut self) -> CompileResult<Reg> {
        if self.regs.has(Purpose::ConstBase) {
            return self.regs.find_gen(Purpose::ConstBase);
        }
        let r = self.regs.alloc_gen(Purpose::ConstBase)?;
        emit_mov_ri(self.buf, true, r, &CONST_POOL as *const ConstPool as u64);
        Ok(r)
    }

    /// Vector register of zeros, rebuilt if evicted.
    fn zero_vec(&mut self) -> CompileResult<Xmm> {
        if self.regs.has(Purpose::VecZero) {
            return self.regs.find_vec(Purpose::VecZero);
        }
        let r = self.regs.alloc_vec(Purpose::VecZero)?;
        emit_sse_rr(self.buf, OPC_PXOR, r, r);
        Ok(r)
    }

    /// Load a pool constant into a fresh vector register.
    fn load_const(&mut self, purpose: Purpose, offset: i32) -> CompileResult<Xmm> {
        let r = self.regs.alloc_vec(purpose)?;
        let cb = self.const_base()?;
        emit_sse_rm(self.buf, OPC_MOVDQA_VxWx, r, cb, offset);
        self.regs.unlock(Purpose::ConstBase);
        Ok(r)
    }

    /// Widen the working color to 16-bit lanes.
    fn expand_color(&mut self, color: Xmm) -> CompileResult<()> {
        if !self.color_is_16 {
            let zero = self.zero_vec()?;
            emit_sse_rr(self.buf, OPC_PUNPCKLBW, color, zero);
            self.regs.unlock(Purpose::VecZero);
            self.color_is_16 = true;
        }
        Ok(())
    }

    /// Narrow the working color back to packed bytes, saturating.
    fn pack_color(&mut self, color: Xmm) {
        if self.color_is_16 {
            emit_sse_rr(self.buf, OPC_PACKUSWB, color, color);
            self.color_is_16 = false;
        }
    }

    fn discard(&mut self) {
        emit_jmp_label(self.buf, &mut self.discard);
    }

    fn discard_if(&mut self, cond: X86Cond) {
        emit_jcc_label(self.buf, cond, &mut self.discard);
    }
}

/// Condition under which `value OP reference` holds after
/// `cmp value, reference` on unsigned operands. `None` for functions
/// that do not compare.
fn pass_cond(func: CompareFunc) -> Option<X86Cond> {
    match func {
        CompareFunc::Never | CompareFunc::Always => None,
        CompareFunc::Equal => Some(X86Cond::Je),
        CompareFunc::NotEqual => Some(X86Cond::Jne),
        CompareFunc::Less => Some(X86Cond::Jb),
        CompareFunc::LessEqual => Some(X86Cond::Jbe),
        CompareFunc::Greater => Some(X86Cond::Ja),
        CompareFunc::GreaterEqual => Some(X86Cond::Jae),
    }
}
