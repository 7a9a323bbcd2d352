//! Data model for the pixel pipeline JIT: the specialization key, the
//! shared GPU state block read by generated code, blend analysis and
//! the scalar reference color conversions.

pub mod blend;
pub mod color;
pub mod key;
pub mod state;

pub use blend::BlendAnalysis;
pub use color::pack_color;
pub use key::{
    AlphaTest, Blend, BlendEq, BlendFactor, ClearFlags, ColorTestFunc, CompareFunc, FbFormat,
    KeyConstants, LogicOp, PipelineConfig, PixelKey, StencilOp, StencilTest,
    STANDARD_STRIDE_PIXELS,
};
pub use state::{GpuState, SharedGpuState, STANDARD_DITHER};
