//! Composed correction entry points.

use image::{ImageBuffer, Pixel};
use tracing::debug;

use defish_core::{build_map, resolve, CorrectionConfig, MapCache};

use crate::resample::remap_with_map;
use crate::Result;

/// One-shot correction: resolve the configuration, build the coordinate
/// map, resample.
///
/// Builds the map from scratch on every call; for repeated corrections
/// with an unchanged configuration use [`Defisher`], which reuses maps.
pub fn correct<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    config: &CorrectionConfig,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    let geom = resolve(config, src.width(), src.height())?;
    let map = build_map(&geom, src.width(), src.height(), config.pad);
    remap_with_map(src, &map)
}

/// Correction engine with a transparent coordinate-map cache.
///
/// The real-time case applies the same configuration frame after frame;
/// with the cache every call after the first costs only a resample.
pub struct Defisher {
    cache: MapCache,
}

impl Defisher {
    pub fn new() -> Self {
        Self {
            cache: MapCache::new(),
        }
    }

    /// Engine with a map cache bounded to `capacity` entries.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: MapCache::with_capacity(capacity),
        }
    }

    /// Correct one raster, reusing the coordinate map when the
    /// configuration and raster size are unchanged.
    pub fn correct<P>(
        &self,
        src: &ImageBuffer<P, Vec<u8>>,
        config: &CorrectionConfig,
    ) -> Result<ImageBuffer<P, Vec<u8>>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let geom = resolve(config, src.width(), src.height())?;
        let map = self
            .cache
            .get_or_build(&geom, src.width(), src.height(), config.pad);
        debug!(
            width = map.width(),
            height = map.height(),
            "resampling through cached coordinate map"
        );
        remap_with_map(src, &map)
    }

    /// Number of coordinate-map builds performed so far.
    pub fn map_builds(&self) -> u64 {
        self.cache.build_count()
    }

    /// Drop all cached maps; the next correction rebuilds.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for Defisher {
    fn default() -> Self {
        Self::new()
    }
}
