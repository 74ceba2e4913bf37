//! Coordinate-map construction: the geometric kernel of the engine.
//!
//! For every output pixel the builder reconstructs the ray the corrected
//! (rectilinear) image claims to represent, pushes it through the fisheye
//! lens model, and records where that ray landed on the source raster.
//! Resampling is a separate, purely mechanical pass over the finished map.

use rayon::prelude::*;

use crate::config::OutputFormat;
use crate::resolve::ResolvedGeometry;

/// Per-output-pixel fractional source coordinates.
///
/// Dense, row-major, one entry per canvas pixel. Entries without a valid
/// source location (outside the lens field, outside the inscribed circle
/// in circular mode, in the padded border, or off the source raster)
/// carry a NaN sentinel in both planes. A published map is never mutated.
#[derive(Debug, Clone)]
pub struct CoordinateMap {
    width: u32,
    height: u32,
    src_width: u32,
    src_height: u32,
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl CoordinateMap {
    /// Canvas width (`src_width + 2 * pad`).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height (`src_height + 2 * pad`).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width of the source raster this map samples from.
    pub fn src_width(&self) -> u32 {
        self.src_width
    }

    /// Height of the source raster this map samples from.
    pub fn src_height(&self) -> u32 {
        self.src_height
    }

    /// Source coordinate for output pixel `(x, y)`, or `None` if invalid.
    pub fn get(&self, x: u32, y: u32) -> Option<(f32, f32)> {
        let idx = (y as usize) * (self.width as usize) + x as usize;
        let sx = self.xs[idx];
        if sx.is_nan() {
            None
        } else {
            Some((sx, self.ys[idx]))
        }
    }

    /// Raw x/y planes, row-major; invalid entries are NaN in both.
    pub fn planes(&self) -> (&[f32], &[f32]) {
        (&self.xs, &self.ys)
    }

    /// Number of output pixels with a valid source coordinate.
    pub fn valid_count(&self) -> usize {
        self.xs.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Build the coordinate map for a resolved geometry and source size.
///
/// The canvas is the source size grown by `pad` on every edge. Rows are
/// computed in parallel; there is no cross-pixel state, so the same
/// inputs always produce a bit-identical map.
pub fn build_map(
    geom: &ResolvedGeometry,
    src_width: u32,
    src_height: u32,
    pad: u32,
) -> CoordinateMap {
    let width = src_width + 2 * pad;
    let height = src_height + 2 * pad;
    let len = width as usize * height as usize;
    let mut xs = vec![f32::NAN; len];
    let mut ys = vec![f32::NAN; len];

    let theta_max = geom.fov.to_radians() / 2.0;
    // Output is a pinhole projection with half-angle pfov/2.
    let pinhole_tan = (geom.pfov.to_radians() / 2.0).tan();
    let out_norm = match geom.output_format {
        OutputFormat::Fullframe => f64::from(width).hypot(f64::from(height)) / 2.0,
        OutputFormat::Circular => f64::from(width.min(height)) / 2.0,
    };
    let circular = geom.output_format == OutputFormat::Circular;

    let cx = geom.center.x;
    let cy = geom.center.y;
    let src_w = src_width as f32;
    let src_h = src_height as f32;
    let pad_f = f64::from(pad);

    xs.par_chunks_mut(width as usize)
        .zip(ys.par_chunks_mut(width as usize))
        .enumerate()
        .for_each(|(y, (row_x, row_y))| {
            let dy = y as f64 - cy;
            for x in 0..width as usize {
                let dx = x as f64 - cx;
                let r = dx.hypot(dy);
                let rho_out = r / out_norm;
                if circular && rho_out > 1.0 {
                    continue;
                }
                let theta = (rho_out * pinhole_tan).atan();
                if theta > theta_max {
                    continue;
                }
                let rho_src = geom.lens_model.source_radius(theta, theta_max);
                if rho_src > 1.0 {
                    continue;
                }
                let phi = dy.atan2(dx) + geom.angle_rad;
                // Subtracting pad re-expresses the coordinate in the
                // unpadded source raster's pixel space.
                let sx = (cx + rho_src * geom.radius * phi.cos() - pad_f) as f32;
                let sy = (cy + rho_src * geom.radius * phi.sin() - pad_f) as f32;
                // Bounds-check the stored f32 values: the f64->f32 cast
                // can round a coordinate up onto the exclusive edge.
                if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                    continue;
                }
                row_x[x] = sx;
                row_y[x] = sy;
            }
        });

    CoordinateMap {
        width,
        height,
        src_width,
        src_height,
        xs,
        ys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorrectionConfig, OutputFormat};
    use crate::lens::LensModel;
    use crate::resolve::resolve;

    fn near_identity(model: LensModel) -> CorrectionConfig {
        // Equal small fov/pfov makes every model approximate a pinhole,
        // so source coordinates track output coordinates closely.
        CorrectionConfig::new(10.0, 10.0).with_lens_model(model)
    }

    #[test]
    fn identity_config_maps_pixels_onto_themselves() {
        let config = near_identity(LensModel::Linear);
        let geom = resolve(&config, 32, 32).unwrap();
        let map = build_map(&geom, 32, 32, 0);

        assert_eq!((map.width(), map.height()), (32, 32));
        assert_eq!(map.get(16, 16), Some((16.0, 16.0)));

        let mut max_err = 0.0f32;
        for y in 0..32 {
            for x in 0..32 {
                if let Some((sx, sy)) = map.get(x, y) {
                    max_err = max_err.max((sx - x as f32).abs()).max((sy - y as f32).abs());
                }
            }
        }
        assert!(max_err < 0.1, "identity drift {max_err}");
        // The outermost ring may fall just outside the raster; the bulk
        // of the canvas must stay valid.
        assert!(map.valid_count() > 900, "valid {}", map.valid_count());
    }

    #[test]
    fn building_twice_is_bit_identical() {
        let config = CorrectionConfig::new(180.0, 140.0)
            .with_lens_model(LensModel::Stereographic)
            .with_angle(33.0)
            .with_pad(3);
        let geom = resolve(&config, 17, 13).unwrap();
        let a = build_map(&geom, 17, 13, 3);
        let b = build_map(&geom, 17, 13, 3);

        let (ax, ay) = a.planes();
        let (bx, by) = b.planes();
        assert!(ax.iter().map(|v| v.to_bits()).eq(bx.iter().map(|v| v.to_bits())));
        assert!(ay.iter().map(|v| v.to_bits()).eq(by.iter().map(|v| v.to_bits())));
    }

    #[test]
    fn pad_grows_the_canvas_and_stays_invalid() {
        for model in LensModel::ALL {
            let config = near_identity(model).with_pad(2);
            let geom = resolve(&config, 8, 8).unwrap();
            let map = build_map(&geom, 8, 8, 2);

            assert_eq!((map.width(), map.height()), (12, 12));
            for y in 0..12 {
                for x in 0..12 {
                    let in_border = x < 2 || y < 2 || x >= 10 || y >= 10;
                    if in_border {
                        assert_eq!(map.get(x, y), None, "{model} border pixel ({x},{y})");
                    }
                }
            }
            assert!(map.valid_count() > 0, "{model} produced an empty map");
        }
    }

    #[test]
    fn rotating_the_azimuth_rotates_the_valid_mask() {
        let base = CorrectionConfig::new(180.0, 140.0)
            .with_lens_model(LensModel::Stereographic)
            .with_output_format(OutputFormat::Circular);
        let rotated = base.with_angle(90.0);

        let n = 33u32;
        let map0 = build_map(&resolve(&base, n, n).unwrap(), n, n, 0);
        let map90 = build_map(&resolve(&rotated, n, n).unwrap(), n, n, 0);

        // An output pixel at azimuth phi under angle=90 samples the same
        // source direction as the pixel at azimuth phi+90 under angle=0.
        for y in 0..n {
            for x in 0..n {
                let (x2, y2) = (n - y, x);
                if x2 >= n {
                    continue;
                }
                assert_eq!(
                    map90.get(x, y).is_some(),
                    map0.get(x2, y2).is_some(),
                    "mask mismatch at ({x},{y})"
                );
            }
        }
    }

    #[test]
    fn circular_format_invalidates_outside_the_inscribed_circle() {
        let config = CorrectionConfig::new(180.0, 140.0)
            .with_lens_model(LensModel::Stereographic)
            .with_output_format(OutputFormat::Circular);
        let geom = resolve(&config, 32, 32).unwrap();
        let map = build_map(&geom, 32, 32, 0);

        for (x, y) in [(0, 0), (31, 0), (0, 31), (31, 31)] {
            assert_eq!(map.get(x, y), None, "corner ({x},{y})");
        }
        assert_eq!(map.get(16, 16), Some((16.0, 16.0)));
        assert!(map.valid_count() < 32 * 32);
    }
}
