//! Scalar color conversions between the canonical RGBA8888 layout
//! (R in bits 0-7, A in bits 24-31) and the 16-bit framebuffer formats.
//!
//! Expanding conversions replicate the top bits of each channel into
//! the low bits they vacate. Generated code produces bit-identical
//! results; these functions are the reference.

use crate::key::FbFormat;

#[inline]
const fn expand5(v: u32) -> u32 {
    (v << 3) | (v >> 2)
}

#[inline]
const fn expand6(v: u32) -> u32 {
    (v << 2) | (v >> 4)
}

#[inline]
const fn expand4(v: u32) -> u32 {
    (v << 4) | v
}

pub const fn rgba8888_to_rgb565(c: u32) -> u16 {
    (((c >> 3) & 0x001F) | ((c >> 5) & 0x07E0) | ((c >> 8) & 0xF800)) as u16
}

pub const fn rgba8888_to_rgba5551(c: u32) -> u16 {
    (((c >> 3) & 0x001F) | ((c >> 6) & 0x03E0) | ((c >> 9) & 0x7C00) | ((c >> 16) & 0x8000))
        as u16
}

pub const fn rgba8888_to_rgba4444(c: u32) -> u16 {
    (((c >> 4) & 0x000F) | ((c >> 8) & 0x00F0) | ((c >> 12) & 0x0F00) | ((c >> 16) & 0xF000))
        as u16
}

/// 565 has no alpha; the result's alpha byte is zero.
pub const fn rgb565_to_rgba8888(p: u16) -> u32 {
    let p = p as u32;
    let r = expand5(p & 0x1F);
    let g = expand6((p >> 5) & 0x3F);
    let b = expand5((p >> 11) & 0x1F);
    r | (g << 8) | (b << 16)
}

pub const fn rgba5551_to_rgba8888(p: u16, keep_alpha: bool) -> u32 {
    let p = p as u32;
    let r = expand5(p & 0x1F);
    let g = expand5((p >> 5) & 0x1F);
    let b = expand5((p >> 10) & 0x1F);
    let a = if keep_alpha && p & 0x8000 != 0 { 0xFF } else { 0 };
    r | (g << 8) | (b << 16) | (a << 24)
}

pub const fn rgba4444_to_rgba8888(p: u16, keep_alpha: bool) -> u32 {
    let p = p as u32;
    let r = expand4(p & 0xF);
    let g = expand4((p >> 4) & 0xF);
    let b = expand4((p >> 8) & 0xF);
    let a = if keep_alpha { expand4((p >> 12) & 0xF) } else { 0 };
    r | (g << 8) | (b << 16) | (a << 24)
}

/// Convert a canonical color to the bits stored for `format`.
pub const fn from_rgba8888(format: FbFormat, c: u32) -> u32 {
    match format {
        FbFormat::Rgb565 => rgba8888_to_rgb565(c) as u32,
        FbFormat::Rgba5551 => rgba8888_to_rgba5551(c) as u32,
        FbFormat::Rgba4444 => rgba8888_to_rgba4444(c) as u32,
        FbFormat::Rgba8888 => c,
    }
}

/// Expand stored pixel bits of `format` to a canonical color.
pub const fn to_rgba8888(format: FbFormat, p: u32, keep_alpha: bool) -> u32 {
    match format {
        FbFormat::Rgb565 => rgb565_to_rgba8888(p as u16),
        FbFormat::Rgba5551 => rgba5551_to_rgba8888(p as u16, keep_alpha),
        FbFormat::Rgba4444 => rgba4444_to_rgba8888(p as u16, keep_alpha),
        FbFormat::Rgba8888 if keep_alpha => p,
        FbFormat::Rgba8888 => p & 0x00FF_FFFF,
    }
}

/// The 8-bit stencil value held in a stored pixel's alpha bits.
pub const fn stencil_of(format: FbFormat, p: u32) -> u8 {
    match format {
        FbFormat::Rgb565 => 0,
        FbFormat::Rgba5551 if p & 0x8000 != 0 => 0xFF,
        FbFormat::Rgba5551 => 0,
        FbFormat::Rgba4444 => expand4((p >> 12) & 0xF) as u8,
        FbFormat::Rgba8888 => (p >> 24) as u8,
    }
}

/// Place an 8-bit stencil value into a stored pixel's alpha bits.
pub const fn stencil_bits_for(format: FbFormat, stencil: u8) -> u32 {
    let s = stencil as u32;
    match format {
        FbFormat::Rgb565 => 0,
        FbFormat::Rgba5551 => (s >> 7) << 15,
        FbFormat::Rgba4444 => (s >> 4) << 12,
        FbFormat::Rgba8888 => s << 24,
    }
}

/// Saturate a four-lane integer color (R, G, B, A) to the canonical
/// packed representation.
pub fn pack_color(rgba: [i32; 4]) -> u32 {
    rgba.iter()
        .enumerate()
        .fold(0, |acc, (i, &v)| acc | ((v.clamp(0, 255) as u32) << (i * 8)))
}
