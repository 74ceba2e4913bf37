pub mod cache;
pub mod config;
pub mod lens;
pub mod map;
pub mod resolve;
pub mod runtime;

pub use cache::*;
pub use config::*;
pub use lens::*;
pub use map::*;
pub use resolve::*;
pub use runtime::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fov must be in (0, 180] degrees, got {fov}")]
    InvalidFov { fov: f64 },

    #[error("pfov must be in (0, 180] degrees, got {pfov}")]
    InvalidPfov { pfov: f64 },

    #[error("unknown lens model '{0}'")]
    UnknownLensModel(String),

    #[error("unknown output format '{0}'")]
    UnknownOutputFormat(String),

    #[error("{model} lens model has a degenerate normalizer at fov {fov}")]
    DegenerateLens { model: LensModel, fov: f64 },

    #[error("resolved fisheye radius must be positive, got {radius}")]
    DegenerateRadius { radius: f64 },

    #[error("raster size {actual:?} does not match the map's source size {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}
