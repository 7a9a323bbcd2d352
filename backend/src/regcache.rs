//! Purpose-based register cache.
//!
//! Stage compilers never name physical registers. They ask for a
//! register by [`Purpose`] and the cache maps purposes onto the
//! caller-saved register file, evicting the least recently used
//! binding it can rebuild cheaply when the file is full.

use crate::error::{CompileError, CompileResult};
use crate::x86_64::regs::{Reg, Xmm, ALLOCATABLE_GPRS, ALLOCATABLE_XMMS, PIXEL_ARG_REGS};

/// Bitmap of host registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegSet(u64);

impl RegSet {
    pub const EMPTY: RegSet = RegSet(0);

    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn from_regs(regs: &[u8]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < regs.len() {
            bits |= 1u64 << regs[i];
            i += 1;
        }
        Self(bits)
    }

    pub const fn set(self, reg: u8) -> Self {
        Self(self.0 | (1u64 << reg))
    }

    pub const fn subtract(self, other: RegSet) -> Self {
        Self(self.0 & !other.0)
    }

    /// Return the lowest set register, or None.
    pub const fn first(self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }
}

/// Register file a purpose lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegClass {
    Gen,
    Vec,
}

/// Semantic role of a value held in a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    ArgX,
    ArgY,
    ArgZ,
    ArgFog,
    ArgColor,
    ArgKey,
    /// Address of the shared GPU state block.
    GState,
    /// Address of the vector constant pool.
    ConstBase,
    /// Address of the pixel in the color buffer.
    ColorOff,
    /// Address of the pixel in the depth buffer.
    DepthOff,
    /// Stencil value carried from the tests to the write.
    Stencil,
    /// Source alpha saved across fog.
    SrcAlpha,
    GenTemp0,
    GenTemp1,
    GenTemp2,
    GenTemp3,
    GenTemp4,
    GenTemp5,
    TempHelper,

    VecArgColor,
    VecZero,
    VecTemp0,
    VecTemp1,
    VecTemp2,
    VecTemp3,
}

impl Purpose {
    /// Argument purposes in calling-convention order.
    pub const ARGS: [Purpose; 6] = [
        Purpose::ArgX,
        Purpose::ArgY,
        Purpose::ArgZ,
        Purpose::ArgFog,
        Purpose::ArgColor,
        Purpose::ArgKey,
    ];

    pub fn class(self) -> RegClass {
        match self {
            Purpose::VecArgColor
            | Purpose::VecZero
            | Purpose::VecTemp0
            | Purpose::VecTemp1
            | Purpose::VecTemp2
            | Purpose::VecTemp3 => RegClass::Vec,
            _ => RegClass::Gen,
        }
    }

    /// Purposes whose value the compiler can rebuild at any point
    /// with a single instruction, so evicting them loses nothing.
    pub fn is_reconstructible(self) -> bool {
        matches!(self, Purpose::GState | Purpose::ConstBase | Purpose::VecZero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    purpose: Purpose,
    reg: u8,
    locks: u32,
    retained: bool,
    last_use: u64,
}

/// Saved binding table, see [`RegCache::checkpoint`].
#[derive(Debug, Clone)]
pub struct RegCheckpoint {
    bindings: Vec<Binding>,
}

/// Purpose to register binding table.
///
/// Invariant: no physical register is bound to two purposes.
#[derive(Debug, Clone)]
pub struct RegCache {
    bindings: Vec<Binding>,
    gen_regs: RegSet,
    vec_regs: RegSet,
    clock: u64,
}

impl RegCache {
    pub fn new() -> Self {
        Self::with_registers(ALLOCATABLE_GPRS, ALLOCATABLE_XMMS)
    }

    /// A cache restricted to the given register sets.
    pub fn with_registers(gen_regs: RegSet, vec_regs: RegSet) -> Self {
        Self {
            bindings: Vec::with_capacity(24),
            gen_regs,
            vec_regs,
            clock: 0,
        }
    }

    /// Forget every binding.
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.clock = 0;
    }

    /// Bind the argument purposes to the incoming argument registers.
    pub fn setup_abi(&mut self) {
        self.reset();
        for (purpose, reg) in Purpose::ARGS.into_iter().zip(PIXEL_ARG_REGS) {
            let last_use = self.tick();
            self.bindings.push(Binding {
                purpose,
                reg: reg as u8,
                locks: 0,
                retained: false,
                last_use,
            });
        }
    }

    pub fn has(&self, purpose: Purpose) -> bool {
        self.position(purpose).is_some()
    }

    /// Number of outstanding locks on `purpose`, 0 if unbound.
    pub fn lock_count(&self, purpose: Purpose) -> u32 {
        self.position(purpose)
            .map_or(0, |i| self.bindings[i].locks)
    }

    /// Raw register number bound to `purpose`.
    pub fn reg_of(&self, purpose: Purpose) -> Option<u8> {
        self.position(purpose).map(|i| self.bindings[i].reg)
    }

    /// Bind `purpose` to a general register and lock it.
    pub fn alloc_gen(&mut self, purpose: Purpose) -> CompileResult<Reg> {
        debug_assert_eq!(purpose.class(), RegClass::Gen);
        self.alloc(purpose).map(Reg::from_u8)
    }

    /// Bind `purpose` to a vector register and lock it.
    pub fn alloc_vec(&mut self, purpose: Purpose) -> CompileResult<Xmm> {
        debug_assert_eq!(purpose.class(), RegClass::Vec);
        self.alloc(purpose).map(Xmm::from_u8)
    }

    /// Lock the general register bound to `purpose`.
    pub fn find_gen(&mut self, purpose: Purpose) -> CompileResult<Reg> {
        debug_assert_eq!(purpose.class(), RegClass::Gen);
        self.find(purpose).map(Reg::from_u8)
    }

    /// Lock the vector register bound to `purpose`.
    pub fn find_vec(&mut self, purpose: Purpose) -> CompileResult<Xmm> {
        debug_assert_eq!(purpose.class(), RegClass::Vec);
        self.find(purpose).map(Xmm::from_u8)
    }

    /// Drop one lock on `purpose`; the binding stays.
    pub fn unlock(&mut self, purpose: Purpose) {
        if let Some(i) = self.position(purpose) {
            let b = &mut self.bindings[i];
            b.locks = b.locks.saturating_sub(1);
        }
    }

    /// Drop one lock and forget the binding, unless it is retained.
    pub fn release(&mut self, purpose: Purpose) {
        if let Some(i) = self.position(purpose) {
            let b = &mut self.bindings[i];
            b.locks = b.locks.saturating_sub(1);
            if !b.retained {
                self.bindings.swap_remove(i);
            }
        }
    }

    /// Keep `purpose` bound across `release` until `force_release`.
    pub fn force_retain(&mut self, purpose: Purpose) {
        if let Some(i) = self.position(purpose) {
            self.bindings[i].retained = true;
        }
    }

    /// Forget `purpose` regardless of locks or retention.
    pub fn force_release(&mut self, purpose: Purpose) {
        if let Some(i) = self.position(purpose) {
            self.bindings.swap_remove(i);
        }
    }

    /// Rename `from` to `to` in place; the register keeps its value
    /// and lock state.
    pub fn change(&mut self, from: Purpose, to: Purpose) -> CompileResult<()> {
        debug_assert_eq!(from.class(), to.class());
        debug_assert!(!self.has(to));
        let i = self.position(from).ok_or(CompileError::UnboundPurpose(from))?;
        let last_use = self.tick();
        let b = &mut self.bindings[i];
        b.purpose = to;
        b.last_use = last_use;
        Ok(())
    }

    /// Snapshot the binding table before compiling a path that does
    /// not rejoin the current one.
    pub fn checkpoint(&self) -> RegCheckpoint {
        RegCheckpoint {
            bindings: self.bindings.clone(),
        }
    }

    /// Return to a snapshot, forgetting everything the diverging path
    /// bound or released.
    pub fn restore(&mut self, checkpoint: RegCheckpoint) {
        self.bindings = checkpoint.bindings;
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn position(&self, purpose: Purpose) -> Option<usize> {
        self.bindings.iter().position(|b| b.purpose == purpose)
    }

    fn find(&mut self, purpose: Purpose) -> CompileResult<u8> {
        let i = self
            .position(purpose)
            .ok_or(CompileError::UnboundPurpose(purpose))?;
        let last_use = self.tick();
        let b = &mut self.bindings[i];
        b.locks += 1;
        b.last_use = last_use;
        Ok(b.reg)
    }

    fn alloc(&mut self, purpose: Purpose) -> CompileResult<u8> {
        if self.has(purpose) {
            return self.find(purpose);
        }
        let class = purpose.class();
        let pool = match class {
            RegClass::Gen => self.gen_regs,
            RegClass::Vec => self.vec_regs,
        };
        let used = self
            .bindings
            .iter()
            .filter(|b| b.purpose.class() == class)
            .fold(RegSet::EMPTY, |set, b| set.set(b.reg));

        let reg = match pool.subtract(used).first() {
            Some(reg) => reg,
            None => {
                let victim = self
                    .bindings
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| {
                        b.purpose.class() == class
                            && b.locks == 0
                            && !b.retained
                            && b.purpose.is_reconstructible()
                    })
                    .min_by_key(|(_, b)| b.last_use)
                    .map(|(i, _)| i)
                    .ok_or(CompileError::OutOfRegisters(purpose))?;
                self.bindings.swap_remove(victim).reg
            }
        };

        let last_use = self.tick();
        self.bindings.push(Binding {
            purpose,
            reg,
            locks: 1,
            retained: false,
            last_use,
        });
        Ok(reg)
    }
}

impl Default for RegCache {
    fn default() -> Self {
        Self::new()
    }
}
