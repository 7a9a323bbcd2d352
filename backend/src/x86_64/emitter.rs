#![allow(non_upper_case_globals)]

use crate::code_buffer::CodeBuffer;
use crate::x86_64::regs::{Reg, Xmm};

// -- Prefix flags --

pub const P_EXT: u32 = 0x100; // 0x0F prefix
pub const P_DATA16: u32 = 0x400; // 0x66 prefix
pub const P_REXW: u32 = 0x1000; // REX.W = 1
pub const P_REXB_R: u32 = 0x2000; // REG field as byte register
pub const P_REXB_RM: u32 = 0x4000; // R/M field as byte register
pub const P_SIMDF3: u32 = 0x20000; // 0xF3 prefix
pub const P_SIMDF2: u32 = 0x40000; // 0xF2 prefix

// -- Opcode constants (OPC_*) --

// Arithmetic
pub const OPC_ARITH_EbIb: u32 = 0x80;
pub const OPC_ARITH_EvIb: u32 = 0x83;
pub const OPC_ARITH_EvIz: u32 = 0x81;
pub const OPC_ARITH_GvEv: u32 = 0x03;
pub const OPC_ARITH_EvGv: u32 = 0x01;
pub const OPC_ARITH_EbGb: u32 = 0x00;
pub const OPC_ARITH_GbEb: u32 = 0x02;

// Shift
pub const OPC_SHIFT_1: u32 = 0xD1;
pub const OPC_SHIFT_Ib: u32 = 0xC1;

// Data movement
pub const OPC_MOVB_EvGv: u32 = 0x88;
pub const OPC_MOVL_EvGv: u32 = 0x89;
pub const OPC_MOVL_GvEv: u32 = 0x8B;
pub const OPC_MOVL_Iv: u32 = 0xB8;

// Extensions
pub const OPC_MOVZBL: u32 = 0xB6 | P_EXT;
pub const OPC_MOVZWL: u32 = 0xB7 | P_EXT;
pub const OPC_MOVSBL: u32 = 0xBE | P_EXT;

// Branch
pub const OPC_JCC_long: u32 = 0x80 | P_EXT;
pub const OPC_JMP_long: u32 = 0xE9;

// Group opcodes
pub const OPC_GRP3_Ev: u32 = 0xF7;
pub const OPC_GRP5: u32 = 0xFF;

// Multiply
pub const OPC_IMUL_GvEv: u32 = 0xAF | P_EXT;

// Misc
pub const OPC_LEA: u32 = 0x8D;
pub const OPC_RET: u32 = 0xC3;
pub const OPC_TESTL: u32 = 0x85;

// SSE2 integer ops (66 0F xx /r)
pub const OPC_PUNPCKLBW: u32 = 0x60 | P_EXT | P_DATA16;
pub const OPC_PACKUSWB: u32 = 0x67 | P_EXT | P_DATA16;
pub const OPC_MOVD_VyEy: u32 = 0x6E | P_EXT | P_DATA16;
pub const OPC_MOVDQA_VxWx: u32 = 0x6F | P_EXT | P_DATA16;
pub const OPC_PSHUFLW: u32 = 0x70 | P_EXT | P_SIMDF2;
pub const OPC_SHIFTW_Ib: u32 = 0x71 | P_EXT | P_DATA16;
pub const OPC_PCMPEQD: u32 = 0x76 | P_EXT | P_DATA16;
pub const OPC_MOVD_EyVy: u32 = 0x7E | P_EXT | P_DATA16;
pub const OPC_PINSRW: u32 = 0xC4 | P_EXT | P_DATA16;
pub const OPC_PEXTRW: u32 = 0xC5 | P_EXT | P_DATA16;
pub const OPC_PMULLW: u32 = 0xD5 | P_EXT | P_DATA16;
pub const OPC_PSUBUSB: u32 = 0xD8 | P_EXT | P_DATA16;
pub const OPC_PSUBUSW: u32 = 0xD9 | P_EXT | P_DATA16;
pub const OPC_PMINUB: u32 = 0xDA | P_EXT | P_DATA16;
pub const OPC_PADDUSW: u32 = 0xDD | P_EXT | P_DATA16;
pub const OPC_PMAXUB: u32 = 0xDE | P_EXT | P_DATA16;
pub const OPC_PMULHUW: u32 = 0xE4 | P_EXT | P_DATA16;
pub const OPC_POR: u32 = 0xEB | P_EXT | P_DATA16;
pub const OPC_PADDSW: u32 = 0xED | P_EXT | P_DATA16;
pub const OPC_PXOR: u32 = 0xEF | P_EXT | P_DATA16;

// -- Sub-operation enums --

/// Arithmetic sub-opcodes (used in /r field of 0x80/0x81/0x83 and shifted into GvEv).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArithOp {
    Add = 0,
    Or = 1,
    Adc = 2,
    Sbb = 3,
    And = 4,
    Sub = 5,
    Xor = 6,
    Cmp = 7,
}

/// Shift sub-opcodes (used in /r field of 0xC1/0xD1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShiftOp {
    Rol = 0,
    Ror = 1,
    Shl = 4,
    Shr = 5,
    Sar = 7,
}

/// Group 3 extension codes (used in /r field of 0xF7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Ext3Op {
    Not = 2,
}

/// Group 5 extension codes (used in /r field of 0xFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Ext5Op {
    JmpN = 4,
}

/// Packed word shift-by-immediate codes (used in /r field of 66 0F 71).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VecShiftOp {
    Srl = 2,
    Sra = 4,
    Sll = 6,
}

/// Width of a memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpSize {
    Byte,
    Word,
    Dword,
    Qword,
}

impl OpSize {
    /// Prefix flags for the size, applied to a `Ev` form opcode.
    fn flags(self) -> u32 {
        match self {
            OpSize::Byte => P_REXB_R,
            OpSize::Word => P_DATA16,
            OpSize::Dword => 0,
            OpSize::Qword => P_REXW,
        }
    }
}

/// x86 condition codes for Jcc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum X86Cond {
    Jo = 0x0,
    Jno = 0x1,
    Jb = 0x2,
    Jae = 0x3,
    Je = 0x4,
    Jne = 0x5,
    Jbe = 0x6,
    Ja = 0x7,
    Js = 0x8,
    Jns = 0x9,
    Jp = 0xA,
    Jnp = 0xB,
    Jl = 0xC,
    Jge = 0xD,
    Jle = 0xE,
    Jg = 0xF,
}

impl X86Cond {
    const ALL: [X86Cond; 16] = [
        X86Cond::Jo,
        X86Cond::Jno,
        X86Cond::Jb,
        X86Cond::Jae,
        X86Cond::Je,
        X86Cond::Jne,
        X86Cond::Jbe,
        X86Cond::Ja,
        X86Cond::Js,
        X86Cond::Jns,
        X86Cond::Jp,
        X86Cond::Jnp,
        X86Cond::Jl,
        X86Cond::Jge,
        X86Cond::Jle,
        X86Cond::Jg,
    ];

    /// Return the inverted condition.
    pub fn invert(self) -> Self {
        // Flip the low bit
        Self::ALL[(self as u8 ^ 1) as usize]
    }
}

// -- Core encoding functions --

/// Helper: return P_REXW if `rexw` is true.
#[inline]
fn rexw_flag(rexw: bool) -> u32 {
    if rexw {
        P_REXW
    } else {
        0
    }
}

/// Emit prefixes and opcode. `r`, `rm` and `index` are raw register
/// numbers (0-15) of the ModR/M reg, r/m and SIB index fields; pass 0
/// for unused fields.
fn emit_opc_3(buf: &mut CodeBuffer, opc: u32, r: u8, rm: u8, index: u8) {
    let mut rex: u8 = 0;
    if opc & P_REXW != 0 {
        rex |= 0x08; // REX.W
    }
    if r >= 8 {
        rex |= 0x04; // REX.R
    }
    if index >= 8 {
        rex |= 0x02; // REX.X
    }
    if rm >= 8 {
        rex |= 0x01; // REX.B
    }
    // SPL/BPL/SIL/DIL are only reachable with a REX prefix present.
    if opc & P_REXB_R != 0 && r >= 4 && rex == 0 {
        rex = 0x40;
    }
    if opc & P_REXB_RM != 0 && rm >= 4 && rex == 0 {
        rex = 0x40;
    }

    if opc & P_DATA16 != 0 {
        buf.emit_u8(0x66);
    }
    if opc & P_SIMDF3 != 0 {
        buf.emit_u8(0xF3);
    } else if opc & P_SIMDF2 != 0 {
        buf.emit_u8(0xF2);
    }
    if rex != 0 {
        buf.emit_u8(0x40 | rex);
    }
    if opc & P_EXT != 0 {
        buf.emit_u8(0x0F);
    }
    buf.emit_u8(opc as u8);
}

/// Emit opcode with REX prefix. `r` is the reg field, `rm` is the r/m field.
pub fn emit_opc(buf: &mut CodeBuffer, opc: u32, r: u8, rm: u8) {
    emit_opc_3(buf, opc, r, rm, 0);
}

/// Emit opcode + ModR/M for a register-register operation. `r` may be
/// a register number or a /r extension.
pub fn emit_modrm(buf: &mut CodeBuffer, opc: u32, r: u8, rm: u8) {
    emit_opc(buf, opc, r, rm);
    buf.emit_u8(0xC0 | ((r & 7) << 3) | (rm & 7));
}

/// Emit opcode + ModR/M with /r extension (for group opcodes).
pub fn emit_modrm_ext(buf: &mut CodeBuffer, opc: u32, ext: u8, rm: Reg) {
    emit_modrm(buf, opc, ext, rm as u8);
}

/// Emit opcode + ModR/M + displacement for memory [base + offset].
/// Handles special cases: RBP needs explicit disp8=0, RSP needs SIB byte.
pub fn emit_modrm_offset(buf: &mut CodeBuffer, opc: u32, r: u8, base: Reg, offset: i32) {
    emit_opc(buf, opc, r, base as u8);

    let r3 = r & 7;
    let b3 = base.low3();

    if offset == 0 && b3 != 5 {
        // [base], mod=00 (RBP/R13 always need disp8)
        if b3 == 4 {
            buf.emit_u8((r3 << 3) | 0x04);
            buf.emit_u8(0x24); // SIB: index=none, base=RSP
        } else {
            buf.emit_u8((r3 << 3) | b3);
        }
    } else if (-128..=127).contains(&offset) {
        if b3 == 4 {
            buf.emit_u8(0x44 | (r3 << 3));
            buf.emit_u8(0x24);
        } else {
            buf.emit_u8(0x40 | (r3 << 3) | b3);
        }
        buf.emit_u8(offset as u8);
    } else {
        if b3 == 4 {
            buf.emit_u8(0x84 | (r3 << 3));
            buf.emit_u8(0x24);
        } else {
            buf.emit_u8(0x80 | (r3 << 3) | b3);
        }
        buf.emit_u32(offset as u32);
    }
}

/// Emit opcode + ModR/M + SIB for memory [base + index*scale + offset].
pub fn emit_modrm_sib(
    buf: &mut CodeBuffer,
    opc: u32,
    r: u8,
    base: Reg,
    index: Reg,
    shift: u8,
    offset: i32,
) {
    emit_opc_3(buf, opc, r, base as u8, index as u8);

    let r3 = r & 7;
    let b3 = base.low3();
    let x3 = index.low3();
    let sib = (shift << 6) | (x3 << 3) | b3;

    if offset == 0 && b3 != 5 {
        buf.emit_u8((r3 << 3) | 0x04);
        buf.emit_u8(sib);
    } else if (-128..=127).contains(&offset) {
        buf.emit_u8(0x44 | (r3 << 3));
        buf.emit_u8(sib);
        buf.emit_u8(offset as u8);
    } else {
        buf.emit_u8(0x84 | (r3 << 3));
        buf.emit_u8(sib);
        buf.emit_u32(offset as u32);
    }
}

// -- Arithmetic instructions --

/// Emit arithmetic reg, reg (ADD/SUB/AND/OR/XOR/CMP/ADC/SBB).
pub fn emit_arith_rr(buf: &mut CodeBuffer, op: ArithOp, rexw: bool, dst: Reg, src: Reg) {
    let opc = (OPC_ARITH_GvEv + ((op as u32) << 3)) | rexw_flag(rexw);
    emit_modrm(buf, opc, dst as u8, src as u8);
}

/// Emit arithmetic reg, imm (auto-selects imm8 vs imm32).
pub fn emit_arith_ri(buf: &mut CodeBuffer, op: ArithOp, rexw: bool, dst: Reg, imm: i32) {
    let w = rexw_flag(rexw);
    if (-128..=127).contains(&imm) {
        emit_modrm_ext(buf, OPC_ARITH_EvIb | w, op as u8, dst);
        buf.emit_u8(imm as u8);
    } else {
        emit_modrm_ext(buf, OPC_ARITH_EvIz | w, op as u8, dst);
        buf.emit_u32(imm as u32);
    }
}

/// Emit arithmetic [base+offset], reg (store-op) of the given width.
pub fn emit_arith_mr(
    buf: &mut CodeBuffer,
    op: ArithOp,
    size: OpSize,
    base: Reg,
    offset: i32,
    src: Reg,
) {
    let opc = match size {
        OpSize::Byte => OPC_ARITH_EbGb,
        _ => OPC_ARITH_EvGv,
    };
    let opc = (opc + ((op as u32) << 3)) | size.flags();
    emit_modrm_offset(buf, opc, src as u8, base, offset);
}

/// Emit arithmetic reg, [base+offset] (load-op) of the given width.
pub fn emit_arith_rm(
    buf: &mut CodeBuffer,
    op: ArithOp,
    size: OpSize,
    dst: Reg,
    base: Reg,
    offset: i32,
) {
    let opc = match size {
        OpSize::Byte => OPC_ARITH_GbEb,
        _ => OPC_ARITH_GvEv,
    };
    let opc = (opc + ((op as u32) << 3)) | size.flags();
    emit_modrm_offset(buf, opc, dst as u8, base, offset);
}

/// Emit arithmetic [base+offset], imm. The immediate is truncated to
/// the operand width.
pub fn emit_arith_mi(
    buf: &mut CodeBuffer,
    op: ArithOp,
    size: OpSize,
    base: Reg,
    offset: i32,
    imm: i32,
) {
    let ext = op as u8;
    match size {
        OpSize::Byte => {
            emit_modrm_offset(buf, OPC_ARITH_EbIb, ext, base, offset);
            buf.emit_u8(imm as u8);
        }
        OpSize::Word => {
            let imm = imm as i16;
            if (-128..=127).contains(&imm) {
                emit_modrm_offset(buf, OPC_ARITH_EvIb | P_DATA16, ext, base, offset);
                buf.emit_u8(imm as u8);
            } else {
                emit_modrm_offset(buf, OPC_ARITH_EvIz | P_DATA16, ext, base, offset);
                buf.emit_u16(imm as u16);
            }
        }
        OpSize::Dword | OpSize::Qword => {
            let w = size.flags();
            if (-128..=127).contains(&imm) {
                emit_modrm_offset(buf, OPC_ARITH_EvIb | w, ext, base, offset);
                buf.emit_u8(imm as u8);
            } else {
                emit_modrm_offset(buf, OPC_ARITH_EvIz | w, ext, base, offset);
                buf.emit_u32(imm as u32);
            }
        }
    }
}

/// Emit NOT reg.
pub fn emit_not(buf: &mut CodeBuffer, rexw: bool, reg: Reg) {
    emit_modrm_ext(buf, OPC_GRP3_Ev | rexw_flag(rexw), Ext3Op::Not as u8, reg);
}

/// Emit TEST reg, reg.
pub fn emit_test_rr(buf: &mut CodeBuffer, rexw: bool, r1: Reg, r2: Reg) {
    emit_modrm(buf, OPC_TESTL | rexw_flag(rexw), r2 as u8, r1 as u8);
}

// -- Shift instructions --

/// Emit shift reg, imm8.
pub fn emit_shift_ri(buf: &mut CodeBuffer, op: ShiftOp, rexw: bool, dst: Reg, imm: u8) {
    let w = rexw_flag(rexw);
    if imm == 1 {
        emit_modrm_ext(buf, OPC_SHIFT_1 | w, op as u8, dst);
    } else {
        emit_modrm_ext(buf, OPC_SHIFT_Ib | w, op as u8, dst);
        buf.emit_u8(imm);
    }
}

// -- Data movement --

/// Emit MOV reg, reg (32-bit or 64-bit).
pub fn emit_mov_rr(buf: &mut CodeBuffer, rexw: bool, dst: Reg, src: Reg) {
    emit_modrm(buf, OPC_MOVL_EvGv | rexw_flag(rexw), src as u8, dst as u8);
}

/// Emit MOV reg, imm (32-bit or 64-bit). Zero becomes XOR, which
/// clobbers the flags.
pub fn emit_mov_ri(buf: &mut CodeBuffer, rexw: bool, reg: Reg, val: u64) {
    if val == 0 {
        emit_modrm(buf, 0x31, reg as u8, reg as u8);
    } else if !rexw || val <= u32::MAX as u64 {
        emit_opc(buf, OPC_MOVL_Iv + (reg.low3() as u32), 0, reg as u8);
        buf.emit_u32(val as u32);
    } else {
        emit_opc(
            buf,
            (OPC_MOVL_Iv + (reg.low3() as u32)) | P_REXW,
            0,
            reg as u8,
        );
        buf.emit_u64(val);
    }
}

/// Emit MOV reg, imm32 without touching the flags.
pub fn emit_mov_ri32(buf: &mut CodeBuffer, reg: Reg, val: u32) {
    emit_opc(buf, OPC_MOVL_Iv + (reg.low3() as u32), 0, reg as u8);
    buf.emit_u32(val);
}

// -- Memory operations --

/// Emit MOV reg, [base+offset] (load).
pub fn emit_load(buf: &mut CodeBuffer, rexw: bool, dst: Reg, base: Reg, offset: i32) {
    emit_modrm_offset(buf, OPC_MOVL_GvEv | rexw_flag(rexw), dst as u8, base, offset);
}

/// Emit MOV [base+offset], reg of the given width.
pub fn emit_store(buf: &mut CodeBuffer, size: OpSize, src: Reg, base: Reg, offset: i32) {
    let opc = match size {
        OpSize::Byte => OPC_MOVB_EvGv,
        _ => OPC_MOVL_EvGv,
    };
    emit_modrm_offset(buf, opc | size.flags(), src as u8, base, offset);
}

/// Emit LEA dst, [base+index*scale+offset].
pub fn emit_lea_sib(
    buf: &mut CodeBuffer,
    rexw: bool,
    dst: Reg,
    base: Reg,
    index: Reg,
    shift: u8,
    offset: i32,
) {
    emit_modrm_sib(
        buf,
        OPC_LEA | rexw_flag(rexw),
        dst as u8,
        base,
        index,
        shift,
        offset,
    );
}

/// Emit LEA dst, [rip+disp32] with a zero displacement. Returns the
/// offset of the displacement for later patching.
pub fn emit_lea_rip(buf: &mut CodeBuffer, dst: Reg) -> usize {
    emit_opc(buf, OPC_LEA | P_REXW, dst as u8, 0);
    buf.emit_u8((dst.low3() << 3) | 0x05);
    let disp_offset = buf.offset();
    buf.emit_u32(0);
    disp_offset
}

/// Emit zero-extend load: MOVZBL/MOVZWL [base+offset].
pub fn emit_load_zx(buf: &mut CodeBuffer, opc: u32, dst: Reg, base: Reg, offset: i32) {
    emit_modrm_offset(buf, opc, dst as u8, base, offset);
}

/// Emit sign-extend load: MOVSBL/MOVSWL [base+offset].
pub fn emit_load_sx(buf: &mut CodeBuffer, opc: u32, dst: Reg, base: Reg, offset: i32) {
    emit_modrm_offset(buf, opc, dst as u8, base, offset);
}

/// Emit sign-extend load: MOVSBL/MOVSWL [base+index*scale+offset].
pub fn emit_load_sx_sib(
    buf: &mut CodeBuffer,
    opc: u32,
    dst: Reg,
    base: Reg,
    index: Reg,
    shift: u8,
    offset: i32,
) {
    emit_modrm_sib(buf, opc, dst as u8, base, index, shift, offset);
}

// -- Multiply --

/// Emit two-operand IMUL: dst = dst * src.
pub fn emit_imul_rr(buf: &mut CodeBuffer, rexw: bool, dst: Reg, src: Reg) {
    emit_modrm(buf, OPC_IMUL_GvEv | rexw_flag(rexw), dst as u8, src as u8);
}

// -- Branches --

/// Emit indirect JMP through [base+index*8].
pub fn emit_jmp_table(buf: &mut CodeBuffer, base: Reg, index: Reg) {
    emit_modrm_sib(buf, OPC_GRP5, Ext5Op::JmpN as u8, base, index, 3, 0);
}

/// Emit RET.
pub fn emit_ret(buf: &mut CodeBuffer) {
    buf.emit_u8(OPC_RET as u8);
}

/// Emit `n` bytes of NOP padding using recommended multi-byte NOPs.
pub fn emit_nops(buf: &mut CodeBuffer, mut n: usize) {
    while n > 0 {
        match n {
            1 => {
                buf.emit_u8(0x90);
                n -= 1;
            }
            2 => {
                buf.emit_u8(0x66);
                buf.emit_u8(0x90);
                n -= 2;
            }
            3 => {
                buf.emit_u8(0x0F);
                buf.emit_u8(0x1F);
                buf.emit_u8(0x00);
                n -= 3;
            }
            4 => {
                buf.emit_u8(0x0F);
                buf.emit_u8(0x1F);
                buf.emit_u8(0x40);
                buf.emit_u8(0x00);
                n -= 4;
            }
            5 => {
                buf.emit_u8(0x0F);
                buf.emit_u8(0x1F);
                buf.emit_u8(0x44);
                buf.emit_u8(0x00);
                buf.emit_u8(0x00);
                n -= 5;
            }
            6 => {
                buf.emit_u8(0x66);
                buf.emit_u8(0x0F);
                buf.emit_u8(0x1F);
                buf.emit_u8(0x44);
                buf.emit_u8(0x00);
                buf.emit_u8(0x00);
                n -= 6;
            }
            7 => {
                buf.emit_u8(0x0F);
                buf.emit_u8(0x1F);
                buf.emit_u8(0x80);
                buf.emit_u32(0);
                n -= 7;
            }
            _ => {
                buf.emit_u8(0x0F);
                buf.emit_u8(0x1F);
                buf.emit_u8(0x84);
                buf.emit_u8(0x00);
                buf.emit_u32(0);
                n -= 8;
            }
        }
    }
}

/// Pad with NOPs up to the next multiple of `align` (a power of two).
pub fn emit_align(buf: &mut CodeBuffer, align: usize) {
    let pad = buf.offset().wrapping_neg() & (align - 1);
    emit_nops(buf, pad);
}

// -- SSE2 --

/// Emit a packed op xmm, xmm.
pub fn emit_sse_rr(buf: &mut CodeBuffer, opc: u32, dst: Xmm, src: Xmm) {
    emit_modrm(buf, opc, dst as u8, src as u8);
}

/// Emit a packed op xmm, [base+offset]. Legacy encodings fault on
/// memory operands that are not 16-byte aligned, except MOVDQU.
pub fn emit_sse_rm(buf: &mut CodeBuffer, opc: u32, dst: Xmm, base: Reg, offset: i32) {
    emit_modrm_offset(buf, opc, dst as u8, base, offset);
}

/// Emit MOVD xmm, r32.
pub fn emit_movd_xr(buf: &mut CodeBuffer, dst: Xmm, src: Reg) {
    emit_modrm(buf, OPC_MOVD_VyEy, dst as u8, src as u8);
}

/// Emit MOVD r32, xmm.
pub fn emit_movd_rx(buf: &mut CodeBuffer, dst: Reg, src: Xmm) {
    emit_modrm(buf, OPC_MOVD_EyVy, src as u8, dst as u8);
}

/// Emit MOVD xmm, [base+offset].
pub fn emit_movd_xm(buf: &mut CodeBuffer, dst: Xmm, base: Reg, offset: i32) {
    emit_modrm_offset(buf, OPC_MOVD_VyEy, dst as u8, base, offset);
}

/// Emit PSRLW/PSRAW/PSLLW xmm, imm8.
pub fn emit_vec_shift_ri(buf: &mut CodeBuffer, op: VecShiftOp, reg: Xmm, imm: u8) {
    emit_modrm(buf, OPC_SHIFTW_Ib, op as u8, reg as u8);
    buf.emit_u8(imm);
}

/// Emit PSHUFLW xmm, xmm, imm8.
pub fn emit_pshuflw(buf: &mut CodeBuffer, dst: Xmm, src: Xmm, order: u8) {
    emit_modrm(buf, OPC_PSHUFLW, dst as u8, src as u8);
    buf.emit_u8(order);
}

/// Emit PEXTRW r32, xmm, imm8.
pub fn emit_pextrw(buf: &mut CodeBuffer, dst: Reg, src: Xmm, lane: u8) {
    emit_modrm(buf, OPC_PEXTRW, dst as u8, src as u8);
    buf.emit_u8(lane);
}

/// Emit PINSRW xmm, r32, imm8.
pub fn emit_pinsrw(buf: &mut CodeBuffer, dst: Xmm, src: Reg, lane: u8) {
    emit_modrm(buf, OPC_PINSRW, dst as u8, src as u8);
    buf.emit_u8(lane);
}
