//! Specialization key for compiled pixel functions.
//!
//! A [`PixelKey`] packs one concrete per-pixel pipeline configuration
//! into a single 64-bit word. Two keys with the same word compile to
//! the same code, so the word alone is used for hashing and equality.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use crate::color;
use crate::state::GpuState;

/// Comparison function shared by the alpha, depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompareFunc {
    Never = 0,
    Always = 1,
    Equal = 2,
    NotEqual = 3,
    Less = 4,
    LessEqual = 5,
    Greater = 6,
    GreaterEqual = 7,
}

impl CompareFunc {
    pub const ALL: [CompareFunc; 8] = [
        CompareFunc::Never,
        CompareFunc::Always,
        CompareFunc::Equal,
        CompareFunc::NotEqual,
        CompareFunc::Less,
        CompareFunc::LessEqual,
        CompareFunc::Greater,
        CompareFunc::GreaterEqual,
    ];

    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => CompareFunc::Never,
            1 => CompareFunc::Always,
            2 => CompareFunc::Equal,
            3 => CompareFunc::NotEqual,
            4 => CompareFunc::Less,
            5 => CompareFunc::LessEqual,
            6 => CompareFunc::Greater,
            _ => CompareFunc::GreaterEqual,
        }
    }

    /// Evaluate `lhs OP rhs`.
    pub fn passes(self, lhs: u32, rhs: u32) -> bool {
        match self {
            CompareFunc::Never => false,
            CompareFunc::Always => true,
            CompareFunc::Equal => lhs == rhs,
            CompareFunc::NotEqual => lhs != rhs,
            CompareFunc::Less => lhs < rhs,
            CompareFunc::LessEqual => lhs <= rhs,
            CompareFunc::Greater => lhs > rhs,
            CompareFunc::GreaterEqual => lhs >= rhs,
        }
    }

    /// Whether the test needs an actual comparison at run time.
    pub const fn compares(self) -> bool {
        !matches!(self, CompareFunc::Never | CompareFunc::Always)
    }

    fn short_name(self) -> &'static str {
        match self {
            CompareFunc::Never => "NV",
            CompareFunc::Always => "AL",
            CompareFunc::Equal => "EQ",
            CompareFunc::NotEqual => "NE",
            CompareFunc::Less => "LT",
            CompareFunc::LessEqual => "LE",
            CompareFunc::Greater => "GT",
            CompareFunc::GreaterEqual => "GE",
        }
    }
}

/// Framebuffer pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FbFormat {
    Rgb565 = 0,
    Rgba5551 = 1,
    Rgba4444 = 2,
    Rgba8888 = 3,
}

impl FbFormat {
    pub const ALL: [FbFormat; 4] = [
        FbFormat::Rgb565,
        FbFormat::Rgba5551,
        FbFormat::Rgba4444,
        FbFormat::Rgba8888,
    ];

    pub const fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => FbFormat::Rgb565,
            1 => FbFormat::Rgba5551,
            2 => FbFormat::Rgba4444,
            _ => FbFormat::Rgba8888,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            FbFormat::Rgba8888 => 4,
            _ => 2,
        }
    }

    /// Bits of a stored pixel that hold alpha, which doubles as stencil.
    pub const fn stencil_bits(self) -> u32 {
        match self {
            FbFormat::Rgb565 => 0,
            FbFormat::Rgba5551 => 0x8000,
            FbFormat::Rgba4444 => 0xF000,
            FbFormat::Rgba8888 => 0xFF00_0000,
        }
    }

    /// All bits of a stored pixel.
    pub const fn pixel_bits(self) -> u32 {
        match self {
            FbFormat::Rgba8888 => 0xFFFF_FFFF,
            _ => 0xFFFF,
        }
    }

    pub const fn has_stencil(self) -> bool {
        !matches!(self, FbFormat::Rgb565)
    }

    pub fn name(self) -> &'static str {
        match self {
            FbFormat::Rgb565 => "565",
            FbFormat::Rgba5551 => "5551",
            FbFormat::Rgba4444 => "4444",
            FbFormat::Rgba8888 => "8888",
        }
    }
}

/// Blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendEq {
    Add = 0,
    Subtract = 1,
    ReverseSubtract = 2,
    Min = 3,
    Max = 4,
    AbsDiff = 5,
}

impl BlendEq {
    pub const ALL: [BlendEq; 6] = [
        BlendEq::Add,
        BlendEq::Subtract,
        BlendEq::ReverseSubtract,
        BlendEq::Min,
        BlendEq::Max,
        BlendEq::AbsDiff,
    ];

    /// Reserved encodings decode as `Add`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            1 => BlendEq::Subtract,
            2 => BlendEq::ReverseSubtract,
            3 => BlendEq::Min,
            4 => BlendEq::Max,
            5 => BlendEq::AbsDiff,
            _ => BlendEq::Add,
        }
    }

    /// Whether the equation scales its inputs by blend factors.
    pub const fn uses_factors(self) -> bool {
        matches!(
            self,
            BlendEq::Add | BlendEq::Subtract | BlendEq::ReverseSubtract
        )
    }

    fn short_name(self) -> &'static str {
        match self {
            BlendEq::Add => "ADD",
            BlendEq::Subtract => "SUB",
            BlendEq::ReverseSubtract => "RSUB",
            BlendEq::Min => "MIN",
            BlendEq::Max => "MAX",
            BlendEq::AbsDiff => "ABSDIFF",
        }
    }
}

/// Blend factor.
///
/// `OtherColor` is the destination color when used as the source
/// factor and the source color when used as the destination factor.
/// `Zero` and `One` never come from hardware directly; they replace
/// `Fix` when the fixed color is all zeros or all ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BlendFactor {
    OtherColor = 0,
    InvOtherColor = 1,
    SrcAlpha = 2,
    InvSrcAlpha = 3,
    DstAlpha = 4,
    InvDstAlpha = 5,
    DoubleSrcAlpha = 6,
    DoubleInvSrcAlpha = 7,
    DoubleDstAlpha = 8,
    DoubleInvDstAlpha = 9,
    Fix = 10,
    Zero = 11,
    One = 12,
}

impl BlendFactor {
    pub const ALL: [BlendFactor; 13] = [
        BlendFactor::OtherColor,
        BlendFactor::InvOtherColor,
        BlendFactor::SrcAlpha,
        BlendFactor::InvSrcAlpha,
        BlendFactor::DstAlpha,
        BlendFactor::InvDstAlpha,
        BlendFactor::DoubleSrcAlpha,
        BlendFactor::DoubleInvSrcAlpha,
        BlendFactor::DoubleDstAlpha,
        BlendFactor::DoubleInvDstAlpha,
        BlendFactor::Fix,
        BlendFactor::Zero,
        BlendFactor::One,
    ];

    /// Reserved encodings decode as `Zero`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0xF {
            0 => BlendFactor::OtherColor,
            1 => BlendFactor::InvOtherColor,
            2 => BlendFactor::SrcAlpha,
            3 => BlendFactor::InvSrcAlpha,
            4 => BlendFactor::DstAlpha,
            5 => BlendFactor::InvDstAlpha,
            6 => BlendFactor::DoubleSrcAlpha,
            7 => BlendFactor::DoubleInvSrcAlpha,
            8 => BlendFactor::DoubleDstAlpha,
            9 => BlendFactor::DoubleInvDstAlpha,
            10 => BlendFactor::Fix,
            12 => BlendFactor::One,
            _ => BlendFactor::Zero,
        }
    }

    /// Zero and one factors are compiled away instead of multiplied.
    pub const fn is_trivial(self) -> bool {
        matches!(self, BlendFactor::Zero | BlendFactor::One)
    }

    fn short_name(self) -> &'static str {
        match self {
            BlendFactor::OtherColor => "OC",
            BlendFactor::InvOtherColor => "IOC",
            BlendFactor::SrcAlpha => "SA",
            BlendFactor::InvSrcAlpha => "ISA",
            BlendFactor::DstAlpha => "DA",
            BlendFactor::InvDstAlpha => "IDA",
            BlendFactor::DoubleSrcAlpha => "2SA",
            BlendFactor::DoubleInvSrcAlpha => "2ISA",
            BlendFactor::DoubleDstAlpha => "2DA",
            BlendFactor::DoubleInvDstAlpha => "2IDA",
            BlendFactor::Fix => "FIX",
            BlendFactor::Zero => "0",
            BlendFactor::One => "1",
        }
    }
}

/// Stencil update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StencilOp {
    Keep = 0,
    Zero = 1,
    Replace = 2,
    Invert = 3,
    Incr = 4,
    Decr = 5,
}

impl StencilOp {
    pub const ALL: [StencilOp; 6] = [
        StencilOp::Keep,
        StencilOp::Zero,
        StencilOp::Replace,
        StencilOp::Invert,
        StencilOp::Incr,
        StencilOp::Decr,
    ];

    /// Reserved encodings decode as `Keep`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            1 => StencilOp::Zero,
            2 => StencilOp::Replace,
            3 => StencilOp::Invert,
            4 => StencilOp::Incr,
            5 => StencilOp::Decr,
            _ => StencilOp::Keep,
        }
    }

    /// Reference result of applying the op to an 8-bit stencil value
    /// as stored in `format`. `reference` is the unmasked stencil
    /// reference.
    pub fn apply(self, format: FbFormat, stencil: u8, reference: u8) -> u8 {
        match self {
            StencilOp::Keep => stencil,
            StencilOp::Zero => 0,
            StencilOp::Replace => reference,
            StencilOp::Invert => !stencil,
            StencilOp::Incr => match format {
                FbFormat::Rgb565 => stencil,
                FbFormat::Rgba5551 => 0xFF,
                FbFormat::Rgba4444 if stencil >= 0xF0 => stencil,
                FbFormat::Rgba4444 => stencil.wrapping_add(0x11),
                FbFormat::Rgba8888 => stencil.saturating_add(1),
            },
            StencilOp::Decr => match format {
                FbFormat::Rgb565 => stencil,
                FbFormat::Rgba5551 => 0,
                FbFormat::Rgba4444 if stencil < 0x11 => stencil,
                FbFormat::Rgba4444 => stencil - 0x11,
                FbFormat::Rgba8888 => stencil.saturating_sub(1),
            },
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            StencilOp::Keep => "K",
            StencilOp::Zero => "0",
            StencilOp::Replace => "R",
            StencilOp::Invert => "I",
            StencilOp::Incr => "+",
            StencilOp::Decr => "-",
        }
    }
}

/// Bitwise combine of the new (source) and existing (destination)
/// framebuffer value. Selected at draw time through [`GpuState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LogicOp {
    Clear = 0,
    And = 1,
    AndReverse = 2,
    Copy = 3,
    AndInverted = 4,
    Noop = 5,
    Xor = 6,
    Or = 7,
    Nor = 8,
    Equiv = 9,
    Inverted = 10,
    OrReverse = 11,
    CopyInverted = 12,
    OrInverted = 13,
    Nand = 14,
    Set = 15,
}

impl LogicOp {
    pub const ALL: [LogicOp; 16] = [
        LogicOp::Clear,
        LogicOp::And,
        LogicOp::AndReverse,
        LogicOp::Copy,
        LogicOp::AndInverted,
        LogicOp::Noop,
        LogicOp::Xor,
        LogicOp::Or,
        LogicOp::Nor,
        LogicOp::Equiv,
        LogicOp::Inverted,
        LogicOp::OrReverse,
        LogicOp::CopyInverted,
        LogicOp::OrInverted,
        LogicOp::Nand,
        LogicOp::Set,
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0xF) as usize]
    }

    /// Truth-table evaluation over every bit of `src` and `dst`.
    pub const fn apply(self, src: u32, dst: u32) -> u32 {
        match self {
            LogicOp::Clear => 0,
            LogicOp::And => src & dst,
            LogicOp::AndReverse => src & !dst,
            LogicOp::Copy => src,
            LogicOp::AndInverted => !src & dst,
            LogicOp::Noop => dst,
            LogicOp::Xor => src ^ dst,
            LogicOp::Or => src | dst,
            LogicOp::Nor => !(src | dst),
            LogicOp::Equiv => !(src ^ dst),
            LogicOp::Inverted => !dst,
            LogicOp::OrReverse => src | !dst,
            LogicOp::CopyInverted => !src,
            LogicOp::OrInverted => !src | dst,
            LogicOp::Nand => !(src & dst),
            LogicOp::Set => 0xFFFF_FFFF,
        }
    }
}

/// Color test function, read from [`GpuState`] at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorTestFunc {
    Never = 0,
    Always = 1,
    Equal = 2,
    NotEqual = 3,
}

/// Which buffers a clear-mode draw writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClearFlags {
    pub color: bool,
    pub stencil: bool,
    pub depth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlphaTest {
    pub func: CompareFunc,
    pub reference: u8,
}

/// Stencil test. The test passes when `reference OP stencil` holds,
/// both sides masked by [`GpuState::stencil_mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilTest {
    pub func: CompareFunc,
    pub reference: u8,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub depth_pass: StencilOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blend {
    pub eq: BlendEq,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

/// Readable pipeline configuration, as the rasterizer sees it for one
/// draw. Turned into a [`PixelKey`] by [`PixelKey::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineConfig {
    pub fb_format: FbFormat,
    pub clear: Option<ClearFlags>,
    pub alpha_test: Option<AlphaTest>,
    pub depth_test: Option<CompareFunc>,
    pub depth_write: bool,
    pub depth_range: bool,
    pub stencil_test: Option<StencilTest>,
    pub color_test: bool,
    pub fog: bool,
    pub blend: Option<Blend>,
    pub dither: bool,
    pub logic_op: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fb_format: FbFormat::Rgba8888,
            clear: None,
            alpha_test: None,
            depth_test: None,
            depth_write: false,
            depth_range: false,
            stencil_test: None,
            color_test: false,
            fog: false,
            blend: None,
            dither: false,
            logic_op: false,
        }
    }
}

// Bit positions within the packed key word.
const CLEAR_MODE: u32 = 0;
const COLOR_TEST: u32 = 1;
const STENCIL_TEST: u32 = 2;
const DEPTH_WRITE: u32 = 3;
const DEPTH_RANGE: u32 = 4;
const ALPHA_FUNC: u32 = 5;
const DEPTH_FUNC: u32 = 8;
const STENCIL_FUNC: u32 = 11;
const FB_FORMAT: u32 = 14;
const ALPHA_REF: u32 = 16;
const STENCIL_REF: u32 = 24;
const ALPHA_BLEND: u32 = 32;
const BLEND_EQ: u32 = 33;
const BLEND_SRC: u32 = 36;
const BLEND_DST: u32 = 40;
const ALPHA_MASK: u32 = 44;
const STENCIL_MASK: u32 = 45;
const DITHER: u32 = 46;
const LOGIC_OP: u32 = 47;
const FOG: u32 = 48;
const STANDARD_STRIDE: u32 = 49;
const WRITE_MASK: u32 = 50;
const STENCIL_FAIL: u32 = 51;
const DEPTH_FAIL: u32 = 54;
const DEPTH_PASS: u32 = 57;

/// Linear stride, in pixels, that lets generated code shift instead
/// of multiply.
pub const STANDARD_STRIDE_PIXELS: u16 = 512;

/// Per-key constants reached through the key pointer argument.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyConstants {
    /// 4x4 signed dither bias, row-major by `y & 3`.
    pub dither: [i8; 16],
    /// Write mask in framebuffer bit depth, set bits are protected.
    pub write_mask: u32,
}

/// Specialization key for one pixel pipeline configuration.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PixelKey {
    bits: u64,
    constants: KeyConstants,
}

impl PixelKey {
    /// Byte offset of the dither matrix from the start of a key.
    pub const DITHER_OFFSET: i32 =
        (mem::offset_of!(PixelKey, constants) + mem::offset_of!(KeyConstants, dither)) as i32;
    /// Byte offset of the write mask from the start of a key.
    pub const WRITE_MASK_OFFSET: i32 =
        (mem::offset_of!(PixelKey, constants) + mem::offset_of!(KeyConstants, write_mask))
            as i32;

    /// Build the key for `config` drawn with `state` bound.
    pub fn new(config: &PipelineConfig, state: &GpuState) -> Self {
        let mut bits = KeyBits(0);
        let format = config.fb_format;
        bits.put(FB_FORMAT, 2, format as u64);

        let mut writes_alpha = false;
        if let Some(clear) = config.clear {
            bits.flag(CLEAR_MODE, true);
            bits.flag(COLOR_TEST, clear.color);
            bits.flag(STENCIL_TEST, clear.stencil);
            bits.flag(DEPTH_WRITE, clear.depth);
            bits.put(ALPHA_FUNC, 3, CompareFunc::Always as u64);
            bits.put(DEPTH_FUNC, 3, CompareFunc::Always as u64);
            bits.put(STENCIL_FUNC, 3, CompareFunc::Always as u64);
            writes_alpha = clear.stencil;
        } else {
            match config.alpha_test {
                Some(test) if test.func.compares() => {
                    let mask = state.alpha_test_mask;
                    bits.put(ALPHA_FUNC, 3, test.func as u64);
                    bits.put(ALPHA_REF, 8, (test.reference & mask) as u64);
                    bits.flag(ALPHA_MASK, mask != 0xFF);
                }
                Some(test) => bits.put(ALPHA_FUNC, 3, test.func as u64),
                None => bits.put(ALPHA_FUNC, 3, CompareFunc::Always as u64),
            }

            let depth_func = config.depth_test.unwrap_or(CompareFunc::Always);
            bits.put(DEPTH_FUNC, 3, depth_func as u64);
            bits.flag(DEPTH_WRITE, config.depth_write);

            match config.stencil_test {
                Some(test) => {
                    let mask = state.stencil_mask;
                    let ops = if format.has_stencil() {
                        [test.fail, test.depth_fail, test.depth_pass]
                    } else {
                        [StencilOp::Keep; 3]
                    };
                    let replaces = ops.contains(&StencilOp::Replace);
                    bits.flag(STENCIL_TEST, true);
                    bits.put(STENCIL_FUNC, 3, test.func as u64);
                    if test.func.compares() || replaces {
                        bits.put(STENCIL_REF, 8, (test.reference & mask) as u64);
                        bits.flag(STENCIL_MASK, mask != 0xFF);
                    }
                    bits.put(STENCIL_FAIL, 3, ops[0] as u64);
                    bits.put(DEPTH_FAIL, 3, ops[1] as u64);
                    bits.put(DEPTH_PASS, 3, ops[2] as u64);
                    writes_alpha = true;
                }
                None => bits.put(STENCIL_FUNC, 3, CompareFunc::Always as u64),
            }

            bits.flag(COLOR_TEST, config.color_test);
            bits.flag(FOG, config.fog);
            bits.flag(DITHER, config.dither);
            bits.flag(LOGIC_OP, config.logic_op);

            if let Some(blend) = config.blend {
                bits.flag(ALPHA_BLEND, true);
                bits.put(BLEND_EQ, 3, blend.eq as u64);
                if blend.eq.uses_factors() {
                    let src = fold_fixed_factor(blend.src, state.blend_fix_a);
                    let dst = fold_fixed_factor(blend.dst, state.blend_fix_b);
                    bits.put(BLEND_SRC, 4, src as u64);
                    bits.put(BLEND_DST, 4, dst as u64);
                }
            }
        }
        bits.flag(DEPTH_RANGE, config.depth_range);
        bits.flag(
            STANDARD_STRIDE,
            state.fb_stride == STANDARD_STRIDE_PIXELS
                && state.depth_stride == STANDARD_STRIDE_PIXELS,
        );

        // Alpha bits a configuration never writes are protected by a
        // fixed mask in generated code, so they only join the runtime
        // mask once a user mask is active anyway.
        let requested = (state.color_write_mask & 0x00FF_FFFF)
            | ((state.alpha_write_mask as u32) << 24);
        let fixed_keep = if writes_alpha { 0 } else { 0xFF00_0000 };
        let user_mask = color::from_rgba8888(format, requested & !fixed_keep);
        bits.flag(WRITE_MASK, user_mask != 0);

        let key = Self {
            bits: bits.0,
            constants: KeyConstants::default(),
        };
        let mut constants = KeyConstants::default();
        if key.dithering() {
            constants.dither = state.dither_matrix;
        }
        if key.apply_color_write_mask() {
            constants.write_mask = color::from_rgba8888(format, requested | fixed_keep);
        }
        Self { constants, ..key }
    }

    /// The packed configuration word.
    #[inline]
    pub fn bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub fn constants(&self) -> &KeyConstants {
        &self.constants
    }

    #[inline]
    fn flag(&self, bit: u32) -> bool {
        self.bits & (1 << bit) != 0
    }

    #[inline]
    fn field(&self, shift: u32, width: u32) -> u8 {
        ((self.bits >> shift) & ((1 << width) - 1)) as u8
    }

    pub fn clear_mode(&self) -> bool {
        self.flag(CLEAR_MODE)
    }

    pub fn color_clear(&self) -> bool {
        self.clear_mode() && self.flag(COLOR_TEST)
    }

    pub fn stencil_clear(&self) -> bool {
        self.clear_mode() && self.flag(STENCIL_TEST)
    }

    pub fn depth_clear(&self) -> bool {
        self.clear_mode() && self.flag(DEPTH_WRITE)
    }

    pub fn color_test(&self) -> bool {
        !self.clear_mode() && self.flag(COLOR_TEST)
    }

    pub fn stencil_test(&self) -> bool {
        !self.clear_mode() && self.flag(STENCIL_TEST)
    }

    /// Depth write, or depth clear in clear mode.
    pub fn depth_write(&self) -> bool {
        self.flag(DEPTH_WRITE)
    }

    pub fn apply_depth_range(&self) -> bool {
        self.flag(DEPTH_RANGE)
    }

    pub fn alpha_test_func(&self) -> CompareFunc {
        CompareFunc::from_bits(self.field(ALPHA_FUNC, 3))
    }

    pub fn depth_test_func(&self) -> CompareFunc {
        CompareFunc::from_bits(self.field(DEPTH_FUNC, 3))
    }

    pub fn stencil_test_func(&self) -> CompareFunc {
        CompareFunc::from_bits(self.field(STENCIL_FUNC, 3))
    }

    pub fn fb_format(&self) -> FbFormat {
        FbFormat::from_bits(self.field(FB_FORMAT, 2))
    }

    /// Alpha test reference, already masked.
    pub fn alpha_test_ref(&self) -> u8 {
        self.field(ALPHA_REF, 8)
    }

    /// Stencil test reference, already masked.
    pub fn stencil_test_ref(&self) -> u8 {
        self.field(STENCIL_REF, 8)
    }

    pub fn alpha_blend(&self) -> bool {
        self.flag(ALPHA_BLEND)
    }

    pub fn blend_eq(&self) -> BlendEq {
        BlendEq::from_bits(self.field(BLEND_EQ, 3))
    }

    pub fn blend_src(&self) -> BlendFactor {
        BlendFactor::from_bits(self.field(BLEND_SRC, 4))
    }

    pub fn blend_dst(&self) -> BlendFactor {
        BlendFactor::from_bits(self.field(BLEND_DST, 4))
    }

    pub fn has_alpha_test_mask(&self) -> bool {
        self.flag(ALPHA_MASK)
    }

    pub fn has_stencil_test_mask(&self) -> bool {
        self.flag(STENCIL_MASK)
    }

    pub fn dithering(&self) -> bool {
        self.flag(DITHER)
    }

    pub fn apply_logic_op(&self) -> bool {
        self.flag(LOGIC_OP)
    }

    pub fn apply_fog(&self) -> bool {
        self.flag(FOG)
    }

    pub fn use_standard_stride(&self) -> bool {
        self.flag(STANDARD_STRIDE)
    }

    pub fn apply_color_write_mask(&self) -> bool {
        self.flag(WRITE_MASK)
    }

    pub fn stencil_fail_op(&self) -> StencilOp {
        StencilOp::from_bits(self.field(STENCIL_FAIL, 3))
    }

    pub fn depth_fail_op(&self) -> StencilOp {
        StencilOp::from_bits(self.field(DEPTH_FAIL, 3))
    }

    pub fn depth_pass_op(&self) -> StencilOp {
        StencilOp::from_bits(self.field(DEPTH_PASS, 3))
    }

    /// Whether generated code reads [`KeyConstants`] through the key
    /// pointer argument.
    pub fn needs_key_constants(&self) -> bool {
        self.dithering() || self.apply_color_write_mask()
    }

    /// Compact human-readable description, used in logs and code
    /// pointer descriptions.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = vec![self.fb_format().name().to_string()];
        if self.clear_mode() {
            let mut clear = String::from("CLEAR");
            for (on, tag) in [
                (self.color_clear(), "C"),
                (self.stencil_clear(), "S"),
                (self.depth_clear(), "Z"),
            ] {
                if on {
                    clear.push_str(tag);
                }
            }
            parts.push(clear);
        }
        if self.apply_depth_range() {
            parts.push("ZRANGE".into());
        }
        let alpha = self.alpha_test_func();
        if alpha != CompareFunc::Always {
            let mask = if self.has_alpha_test_mask() { "M" } else { "" };
            parts.push(format!(
                "AT={}{:02X}{}",
                alpha.short_name(),
                self.alpha_test_ref(),
                mask
            ));
        }
        if self.color_test() {
            parts.push("CT".into());
        }
        if self.stencil_test() {
            let mask = if self.has_stencil_test_mask() { "M" } else { "" };
            parts.push(format!(
                "ST={}{:02X}{}({},{},{})",
                self.stencil_test_func().short_name(),
                self.stencil_test_ref(),
                mask,
                self.stencil_fail_op().short_name(),
                self.depth_fail_op().short_name(),
                self.depth_pass_op().short_name(),
            ));
        }
        let depth = self.depth_test_func();
        if depth != CompareFunc::Always {
            parts.push(format!("ZT={}", depth.short_name()));
        }
        if self.depth_write() && !self.clear_mode() {
            parts.push("ZW".into());
        }
        if self.apply_fog() {
            parts.push("FOG".into());
        }
        if self.alpha_blend() {
            let eq = self.blend_eq();
            if eq.uses_factors() {
                parts.push(format!(
                    "BLEND({},{},{})",
                    eq.short_name(),
                    self.blend_src().short_name(),
                    self.blend_dst().short_name()
                ));
            } else {
                parts.push(format!("BLEND({})", eq.short_name()));
            }
        }
        if self.dithering() {
            parts.push("DITHER".into());
        }
        if self.apply_logic_op() {
            parts.push("LOGIC".into());
        }
        if self.apply_color_write_mask() {
            parts.push("MASK".into());
        }
        if !self.use_standard_stride() {
            parts.push("STRIDE".into());
        }
        parts.join(":")
    }
}

impl PartialEq for PixelKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for PixelKey {}

impl Hash for PixelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl fmt::Debug for PixelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelKey({:#018x} {})", self.bits, self.describe())
    }
}

impl fmt::Display for PixelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Builder for the packed key word.
struct KeyBits(u64);

impl KeyBits {
    fn put(&mut self, shift: u32, width: u32, value: u64) {
        let mask = ((1u64 << width) - 1) << shift;
        self.0 = (self.0 & !mask) | ((value << shift) & mask);
    }

    fn flag(&mut self, bit: u32, on: bool) {
        self.put(bit, 1, on as u64);
    }
}

fn fold_fixed_factor(factor: BlendFactor, fixed: u32) -> BlendFactor {
    match (factor, fixed & 0x00FF_FFFF) {
        (BlendFactor::Fix, 0) => BlendFactor::Zero,
        (BlendFactor::Fix, 0x00FF_FFFF) => BlendFactor::One,
        (factor, _) => factor,
    }
}
