//! Lookups and draws from several threads sharing one cache.

use std::sync::{Arc, Barrier};
use std::thread;

use pixjit_core::{GpuState, PipelineConfig, PixelKey, SharedGpuState};
use pixjit_exec::{CacheConfig, PixelJitCache};

use super::{alpha_config, cache, key};

const THREADS: usize = 8;

#[test]
fn racing_first_lookups_compile_once() {
    let cache = Arc::new(cache(CacheConfig::default()));
    let barrier = Arc::new(Barrier::new(THREADS));
    let k = key(&alpha_config(0x42));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_function(&k).unwrap().as_ptr() as usize
            })
        })
        .collect();
    let ptrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ptrs.iter().all(|&p| p == ptrs[0]));
    assert_eq!(cache.len(), 1);
    let used = cache.code_size();
    cache.get_function(&k).unwrap();
    assert_eq!(cache.code_size(), used);
}

#[test]
fn mixed_keys_from_many_threads() {
    let cache = Arc::new(cache(CacheConfig::default()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Each thread walks the same keys from a different start.
                (0..32u8)
                    .map(|i| {
                        let reference = (i as usize + t * 4) % 32;
                        let k = key(&alpha_config(reference as u8));
                        (reference, cache.get_function(&k).unwrap().as_ptr() as usize)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = std::collections::HashMap::new();
    for handle in handles {
        for (reference, ptr) in handle.join().unwrap() {
            assert_eq!(*seen.entry(reference).or_insert(ptr), ptr);
        }
    }
    assert_eq!(seen.len(), 32);
    assert_eq!(cache.len(), 32);
}

#[test]
fn draws_run_in_parallel() {
    crate::init_logging();
    const WIDTH: usize = 512;
    let mut color = vec![0u32; WIDTH * THREADS];
    let state = Arc::new(SharedGpuState::new(GpuState {
        fb_base: color.as_mut_ptr() as *mut u8,
        ..GpuState::default()
    }));
    let cache = Arc::new(PixelJitCache::new(Arc::clone(&state), CacheConfig::default()).unwrap());
    let config = PipelineConfig::default();
    let k = PixelKey::new(&config, state.get());

    let handles: Vec<_> = (0..THREADS)
        .map(|row| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let func = cache.get_function(&k).unwrap();
                for x in 0..64 {
                    let value = 0xFF00_0000 | (row as u32) << 8 | x as u32;
                    // SAFETY: every thread owns its row and the cache
                    // outlives the call.
                    unsafe { func.invoke(x as i32, row as i32, 0, 0, value, &k) };
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for row in 0..THREADS {
        for x in 0..64 {
            // The alpha byte is not written without stencil.
            assert_eq!(color[row * WIDTH + x], (row as u32) << 8 | x as u32);
        }
    }
}
