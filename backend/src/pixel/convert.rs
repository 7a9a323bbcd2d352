//! Framebuffer format conversions on general registers.
//!
//! Each routine converts `color` in place using two scratch registers.
//! Results are bit-identical to `pixjit_core::color`: narrowing keeps
//! the top bits of each channel, widening replicates them into the
//! vacated low bits.

use pixjit_core::FbFormat;

use crate::code_buffer::CodeBuffer;
use crate::x86_64::emitter::*;
use crate::x86_64::regs::Reg;

/// `dst = (src >> shift) & mask`
fn extract(buf: &mut CodeBuffer, dst: Reg, src: Reg, shift: u8, mask: i32) {
    emit_mov_rr(buf, false, dst, src);
    if shift != 0 {
        emit_shift_ri(buf, ShiftOp::Shr, false, dst, shift);
    }
    emit_arith_ri(buf, ArithOp::And, false, dst, mask);
}

/// `dst = (src & mask) << shift`
fn place(buf: &mut CodeBuffer, dst: Reg, src: Reg, mask: i32, shift: u8) {
    emit_mov_rr(buf, false, dst, src);
    emit_arith_ri(buf, ArithOp::And, false, dst, mask);
    if shift != 0 {
        emit_shift_ri(buf, ShiftOp::Shl, false, dst, shift);
    }
}

fn or(buf: &mut CodeBuffer, dst: Reg, src: Reg) {
    emit_arith_rr(buf, ArithOp::Or, false, dst, src);
}

pub fn emit_convert_to_565(buf: &mut CodeBuffer, color: Reg, t1: Reg, t2: Reg) {
    extract(buf, t1, color, 3, 0x001F);
    extract(buf, t2, color, 5, 0x07E0);
    or(buf, t1, t2);
    emit_shift_ri(buf, ShiftOp::Shr, false, color, 8);
    emit_arith_ri(buf, ArithOp::And, false, color, 0xF800);
    or(buf, color, t1);
}

/// Without `keep_alpha` the alpha bit is left clear.
pub fn emit_convert_to_5551(buf: &mut CodeBuffer, color: Reg, t1: Reg, t2: Reg, keep_alpha: bool) {
    extract(buf, t1, color, 3, 0x001F);
    extract(buf, t2, color, 6, 0x03E0);
    or(buf, t1, t2);
    if keep_alpha {
        extract(buf, t2, color, 16, 0x8000);
        or(buf, t1, t2);
    }
    emit_shift_ri(buf, ShiftOp::Shr, false, color, 9);
    emit_arith_ri(buf, ArithOp::And, false, color, 0x7C00);
    or(buf, color, t1);
}

/// Without `keep_alpha` the alpha nibble is left clear.
pub fn emit_convert_to_4444(buf: &mut CodeBuffer, color: Reg, t1: Reg, t2: Reg, keep_alpha: bool) {
    extract(buf, t1, color, 4, 0x000F);
    extract(buf, t2, color, 8, 0x00F0);
    or(buf, t1, t2);
    if keep_alpha {
        extract(buf, t2, color, 16, 0xF000);
        or(buf, t1, t2);
    }
    emit_shift_ri(buf, ShiftOp::Shr, false, color, 12);
    emit_arith_ri(buf, ArithOp::And, false, color, 0x0F00);
    or(buf, color, t1);
}

/// Alpha byte of the result is zero.
pub fn emit_convert_from_565(buf: &mut CodeBuffer, color: Reg, t1: Reg, t2: Reg) {
    // Channel tops: R at 3-7, G at 10-15, B at 19-23.
    place(buf, t1, color, 0x001F, 3);
    place(buf, t2, color, 0x07E0, 5);
    or(buf, t1, t2);
    place(buf, t2, color, 0xF800, 8);
    or(buf, t1, t2);

    emit_mov_rr(buf, false, color, t1);
    extract(buf, t2, t1, 5, 0x0007_0007);
    or(buf, color, t2);
    extract(buf, t2, t1, 6, 0x0000_0300);
    or(buf, color, t2);
}

/// Alpha byte of the result is 0xFF or 0 from the alpha bit with
/// `keep_alpha`, zero otherwise.
pub fn emit_convert_from_5551(buf: &mut CodeBuffer, color: Reg, t1: Reg, t2: Reg, keep_alpha: bool) {
    // Channel tops: R at 3-7, G at 11-15, B at 19-23.
    place(buf, t1, color, 0x001F, 3);
    place(buf, t2, color, 0x03E0, 6);
    or(buf, t1, t2);
    place(buf, t2, color, 0x7C00, 9);
    or(buf, t1, t2);

    if keep_alpha {
        // Smear the alpha bit across the top byte.
        emit_arith_ri(buf, ArithOp::And, false, color, 0x8000);
        emit_shift_ri(buf, ShiftOp::Shl, false, color, 16);
        emit_shift_ri(buf, ShiftOp::Sar, false, color, 7);
        or(buf, color, t1);
    } else {
        emit_mov_rr(buf, false, color, t1);
    }
    extract(buf, t2, t1, 5, 0x0007_0707);
    or(buf, color, t2);
}

/// Alpha byte of the result is the expanded alpha nibble with
/// `keep_alpha`, zero otherwise.
pub fn emit_convert_from_4444(buf: &mut CodeBuffer, color: Reg, t1: Reg, t2: Reg, keep_alpha: bool) {
    // Channel tops: R at 4-7, G at 12-15, B at 20-23, A at 28-31.
    place(buf, t1, color, 0x000F, 4);
    place(buf, t2, color, 0x00F0, 8);
    or(buf, t1, t2);
    place(buf, t2, color, 0x0F00, 12);
    or(buf, t1, t2);
    if keep_alpha {
        place(buf, t2, color, 0xF000, 16);
        or(buf, t1, t2);
    }

    emit_mov_rr(buf, false, color, t1);
    emit_shift_ri(buf, ShiftOp::Shr, false, t1, 4);
    or(buf, color, t1);
}

/// Narrow a canonical color in `color` to the stored bits of `format`.
pub fn emit_convert_to(
    buf: &mut CodeBuffer,
    format: FbFormat,
    color: Reg,
    t1: Reg,
    t2: Reg,
    keep_alpha: bool,
) {
    match format {
        FbFormat::Rgb565 => emit_convert_to_565(buf, color, t1, t2),
        FbFormat::Rgba5551 => emit_convert_to_5551(buf, color, t1, t2, keep_alpha),
        FbFormat::Rgba4444 => emit_convert_to_4444(buf, color, t1, t2, keep_alpha),
        FbFormat::Rgba8888 => {}
    }
}

/// Widen stored 16-bit pixel bits in `color` to a canonical color.
/// 8888 pixels are left as loaded.
pub fn emit_convert_from(
    buf: &mut CodeBuffer,
    format: FbFormat,
    color: Reg,
    t1: Reg,
    t2: Reg,
    keep_alpha: bool,
) {
    match format {
        FbFormat::Rgb565 => emit_convert_from_565(buf, color, t1, t2),
        FbFormat::Rgba5551 => emit_convert_from_5551(buf, color, t1, t2, keep_alpha),
        FbFormat::Rgba4444 => emit_convert_from_4444(buf, color, t1, t2, keep_alpha),
        FbFormat::Rgba8888 => {}
    }
}
