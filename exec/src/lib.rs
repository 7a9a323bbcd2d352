//! Pixel JIT cache: maps specialization keys to compiled pixel
//! functions.
//!
//! The cache owns one executable code buffer and a host code
//! generator. Rasterizer threads look functions up concurrently and
//! call them per pixel; compilation happens on the first lookup of a
//! key, serialized behind a single lock.

pub mod cache;
pub mod func;

pub use cache::{CacheConfig, PixelJitCache};
pub use func::PixelFunc;
