use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{debug, error};
use pixjit_backend::code_buffer::DEFAULT_CODE_BUF_SIZE;
use pixjit_backend::{
    CodeBuffer, CompileError, CompiledPixel, PixelCodeGen, X86_64PixelGen, MAX_FUNC_SIZE,
};
use pixjit_core::{PixelKey, SharedGpuState};

use crate::func::PixelFunc;

/// Sizing of a [`PixelJitCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Size of the executable code buffer in bytes.
    pub code_size: usize,
    /// Free space a compilation needs before it starts.
    pub min_free: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            code_size: DEFAULT_CODE_BUF_SIZE,
            min_free: MAX_FUNC_SIZE,
        }
    }
}

struct Entry {
    func: PixelFunc,
    code: CompiledPixel,
}

/// Everything a compilation mutates. Held under one lock, so at most
/// one compilation runs at a time and writes only past the end of
/// published code.
struct Arena<B> {
    buf: CodeBuffer,
    backend: B,
}

/// Map from [`PixelKey`] to compiled pixel functions.
///
/// Lookups share a read lock; a miss serializes on the arena lock and
/// re-checks the map before compiling, so each key compiles at most
/// once. Failed compilations are remembered until [`clear`].
///
/// [`clear`]: PixelJitCache::clear
pub struct PixelJitCache<B: PixelCodeGen = X86_64PixelGen> {
    entries: RwLock<HashMap<PixelKey, Result<Entry, CompileError>>>,
    arena: Mutex<Arena<B>>,
    /// Start of the code buffer. The mapping never moves.
    code_base: usize,
    code_capacity: usize,
    /// Bytes emitted, published after each compilation.
    code_used: AtomicUsize,
    min_free: usize,
    /// Baked into every function; kept alive as long as the code.
    state: Arc<SharedGpuState>,
}

impl PixelJitCache<X86_64PixelGen> {
    pub fn new(state: Arc<SharedGpuState>, config: CacheConfig) -> io::Result<Self> {
        Self::with_backend(X86_64PixelGen::new(), state, config)
    }
}

impl<B: PixelCodeGen> PixelJitCache<B> {
    pub fn with_backend(
        backend: B,
        state: Arc<SharedGpuState>,
        config: CacheConfig,
    ) -> io::Result<Self> {
        let buf = CodeBuffer::new(config.code_size)?;
        debug!(
            "pixel jit cache: {} KiB code buffer at {:p}",
            buf.capacity() / 1024,
            buf.base_ptr()
        );
        Ok(Self {
            entries: RwLock::new(HashMap::new()),
            code_base: buf.base_ptr() as usize,
            code_capacity: buf.capacity(),
            code_used: AtomicUsize::new(0),
            min_free: config.min_free,
            arena: Mutex::new(Arena { buf, backend }),
            state,
        })
    }

    /// The state block every function in this cache reads.
    pub fn state(&self) -> &Arc<SharedGpuState> {
        &self.state
    }

    /// Return the function for `key`, compiling it on first use.
    pub fn get_function(&self, key: &PixelKey) -> Result<PixelFunc, CompileError> {
        if let Some(found) = self.lookup(key) {
            return found;
        }

        let mut arena = self.arena.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have compiled it while we waited.
        if let Some(found) = self.lookup(key) {
            return found;
        }

        let entry = self.compile(&mut arena, key);
        let found = entry.as_ref().map(|e| e.func).map_err(Clone::clone);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*key, entry);
        found
    }

    fn lookup(&self, key: &PixelKey) -> Option<Result<PixelFunc, CompileError>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .map(|entry| entry.as_ref().map(|e| e.func).map_err(Clone::clone))
    }

    fn compile(&self, arena: &mut Arena<B>, key: &PixelKey) -> Result<Entry, CompileError> {
        let remaining = arena.buf.remaining();
        let result = if remaining < self.min_free {
            Err(CompileError::CodeBufferFull {
                remaining,
                needed: self.min_free,
            })
        } else {
            arena
                .backend
                .compile(&mut arena.buf, key, self.state.as_ptr())
        };

        match result {
            Ok(code) => {
                self.code_used.store(arena.buf.offset(), Ordering::Release);
                debug!(
                    "compiled {} at {:#x}: {} bytes, {} stages",
                    key,
                    code.start,
                    code.end - code.start,
                    code.markers.len()
                );
                // SAFETY: the backend returned a complete function at
                // `code.start` inside the executable mapping.
                let func = unsafe { PixelFunc::from_code_ptr(arena.buf.ptr_at(code.start)) };
                Ok(Entry { func, code })
            }
            Err(err) => {
                error!("failed to compile {}: {}", key, err);
                Err(err)
            }
        }
    }

    /// Drop every entry and rewind the code buffer. Every function
    /// returned before is invalid afterwards.
    pub fn clear(&mut self) {
        let entries = self
            .entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let count = entries.len();
        entries.clear();

        let arena = self.arena.get_mut().unwrap_or_else(PoisonError::into_inner);
        let used = arena.buf.offset();
        arena.buf.set_offset(0);
        self.code_used.store(0, Ordering::Release);
        debug!("pixel jit cache cleared: {} entries, {} bytes", count, used);
    }

    /// Number of keys seen, failed compilations included.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of code emitted since creation or the last clear.
    pub fn code_size(&self) -> usize {
        self.code_used.load(Ordering::Acquire)
    }

    pub fn code_capacity(&self) -> usize {
        self.code_capacity
    }

    /// Name the function and pipeline stage containing `ptr`, e.g.
    /// `"8888:AT=EQ80: AlphaTest"`. `None` for addresses outside
    /// compiled code.
    pub fn describe_code_ptr(&self, ptr: *const u8) -> Option<String> {
        let offset = (ptr as usize).checked_sub(self.code_base)?;
        if offset >= self.code_size() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find_map(|(key, entry)| {
            let code = &entry.as_ref().ok()?.code;
            let stage = code.stage_at(offset)?;
            Some(format!("{}: {}", key, stage))
        })
    }
}
