use crate::regcache::RegSet;

/// x86-64 general-purpose register indices.
///
/// Encoding matches the x86-64 ModR/M and REX register numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reg {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

impl Reg {
    const ALL: [Reg; 16] = [
        Reg::Rax,
        Reg::Rcx,
        Reg::Rdx,
        Reg::Rbx,
        Reg::Rsp,
        Reg::Rbp,
        Reg::Rsi,
        Reg::Rdi,
        Reg::R8,
        Reg::R9,
        Reg::R10,
        Reg::R11,
        Reg::R12,
        Reg::R13,
        Reg::R14,
        Reg::R15,
    ];

    #[inline]
    pub const fn from_u8(n: u8) -> Self {
        Self::ALL[(n & 0xF) as usize]
    }

    /// Low 3 bits of the register encoding (for ModR/M).
    #[inline]
    pub const fn low3(self) -> u8 {
        (self as u8) & 0x7
    }

    /// Whether this register requires a REX prefix (R8-R15).
    #[inline]
    pub const fn needs_rex(self) -> bool {
        (self as u8) >= 8
    }
}

/// SSE register indices, numbered like [`Reg`] in ModR/M and REX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Xmm {
    Xmm0 = 0,
    Xmm1 = 1,
    Xmm2 = 2,
    Xmm3 = 3,
    Xmm4 = 4,
    Xmm5 = 5,
    Xmm6 = 6,
    Xmm7 = 7,
    Xmm8 = 8,
    Xmm9 = 9,
    Xmm10 = 10,
    Xmm11 = 11,
    Xmm12 = 12,
    Xmm13 = 13,
    Xmm14 = 14,
    Xmm15 = 15,
}

impl Xmm {
    const ALL: [Xmm; 16] = [
        Xmm::Xmm0,
        Xmm::Xmm1,
        Xmm::Xmm2,
        Xmm::Xmm3,
        Xmm::Xmm4,
        Xmm::Xmm5,
        Xmm::Xmm6,
        Xmm::Xmm7,
        Xmm::Xmm8,
        Xmm::Xmm9,
        Xmm::Xmm10,
        Xmm::Xmm11,
        Xmm::Xmm12,
        Xmm::Xmm13,
        Xmm::Xmm14,
        Xmm::Xmm15,
    ];

    #[inline]
    pub const fn from_u8(n: u8) -> Self {
        Self::ALL[(n & 0xF) as usize]
    }

    #[inline]
    pub const fn low3(self) -> u8 {
        (self as u8) & 0x7
    }
}

/// Pixel function arguments (System V AMD64 ABI):
/// x, y, z, fog, packed color, key pointer.
pub const PIXEL_ARG_REGS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

/// Caller-saved GPRs. Generated pixel functions only use these, so
/// they need neither prologue nor epilogue.
pub const ALLOCATABLE_GPRS: RegSet = RegSet::from_regs(&[
    Reg::Rax as u8,
    Reg::Rcx as u8,
    Reg::Rdx as u8,
    Reg::Rsi as u8,
    Reg::Rdi as u8,
    Reg::R8 as u8,
    Reg::R9 as u8,
    Reg::R10 as u8,
    Reg::R11 as u8,
]);

/// Every XMM register is caller-saved in the System V ABI.
pub const ALLOCATABLE_XMMS: RegSet = RegSet::from_raw(0xFFFF);
