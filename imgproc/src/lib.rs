//! Raster-facing layer: resampling through coordinate maps and the
//! composed correction entry points.

pub mod correct;
pub mod resample;

pub use correct::*;
pub use resample::*;

pub use defish_core::Error;
pub type Result<T> = defish_core::Result<T>;
