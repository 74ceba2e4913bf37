//! Turns a configuration with auto fields into concrete geometry.

use nalgebra::Point2;
use tracing::debug;

use crate::config::{CorrectionConfig, OutputFormat};
use crate::lens::LensModel;
use crate::{Error, Result};

/// Fully concrete correction geometry for one source size.
///
/// Center coordinates are expressed in padded-canvas pixel space. Derived
/// once per `(config, width, height)` pair; pure data from there on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGeometry {
    pub center: Point2<f64>,
    /// Fisheye circle radius in pixels, always positive.
    pub radius: f64,
    /// Azimuth rotation in radians.
    pub angle_rad: f64,
    pub fov: f64,
    pub pfov: f64,
    pub lens_model: LensModel,
    pub output_format: OutputFormat,
}

/// Resolve a configuration against a concrete source size.
///
/// Validates `fov`/`pfov`, checks the lens model normalizer, and replaces
/// every auto field with its concrete value. Fails fast; nothing here is
/// best-effort.
pub fn resolve(config: &CorrectionConfig, width: u32, height: u32) -> Result<ResolvedGeometry> {
    if !(config.fov > 0.0 && config.fov <= 180.0) {
        return Err(Error::InvalidFov { fov: config.fov });
    }
    if !(config.pfov > 0.0 && config.pfov <= 180.0) {
        return Err(Error::InvalidPfov { pfov: config.pfov });
    }
    config.lens_model.validate(config.fov)?;

    let pad = f64::from(config.pad);
    let canvas_w = f64::from(width) + 2.0 * pad;
    let canvas_h = f64::from(height) + 2.0 * pad;

    let cx = config.xcenter.unwrap_or(f64::from(width) / 2.0 + pad);
    let cy = config.ycenter.unwrap_or(f64::from(height) / 2.0 + pad);

    let radius = match config.radius {
        Some(r) if r > 0.0 => r,
        // Negative radius scales half the smaller source dimension.
        Some(r) if r < 0.0 => -r * f64::from(width.min(height)) / 2.0,
        Some(r) => return Err(Error::DegenerateRadius { radius: r }),
        None => match config.output_format {
            OutputFormat::Fullframe => canvas_w.hypot(canvas_h) / 2.0,
            OutputFormat::Circular => canvas_w.min(canvas_h) / 2.0,
        },
    };
    if radius <= 0.0 {
        return Err(Error::DegenerateRadius { radius });
    }

    let angle_rad = config.angle.unwrap_or(0.0).to_radians();

    debug!(cx, cy, radius, angle_rad, "resolved correction geometry");

    Ok(ResolvedGeometry {
        center: Point2::new(cx, cy),
        radius,
        angle_rad,
        fov: config.fov,
        pfov: config.pfov,
        lens_model: config.lens_model,
        output_format: config.output_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn auto_center_is_the_canvas_center() {
        let config = CorrectionConfig::new(180.0, 140.0).with_pad(10);
        let geom = resolve(&config, 640, 480).unwrap();
        assert_eq!(geom.center, Point2::new(330.0, 250.0));
    }

    #[test]
    fn explicit_center_is_used_verbatim() {
        let config = CorrectionConfig::new(180.0, 140.0).with_center(300.5, 200.25);
        let geom = resolve(&config, 640, 480).unwrap();
        assert_eq!(geom.center, Point2::new(300.5, 200.25));
    }

    #[test]
    fn auto_radius_follows_the_output_format() {
        let fullframe = CorrectionConfig::new(180.0, 140.0);
        let geom = resolve(&fullframe, 300, 400).unwrap();
        assert!((geom.radius - 250.0).abs() < 1e-9);

        let circular = fullframe.with_output_format(OutputFormat::Circular);
        let geom = resolve(&circular, 300, 400).unwrap();
        assert_eq!(geom.radius, 150.0);
    }

    #[test]
    fn negative_radius_scales_half_the_smaller_dimension() {
        let config = CorrectionConfig::new(180.0, 140.0).with_radius(-1.4);
        let geom = resolve(&config, 100, 100).unwrap();
        assert!((geom.radius - 70.0).abs() < 1e-12);
    }

    #[test]
    fn positive_radius_is_used_verbatim() {
        let config = CorrectionConfig::new(180.0, 140.0).with_radius(123.5);
        let geom = resolve(&config, 640, 480).unwrap();
        assert_eq!(geom.radius, 123.5);
    }

    #[test]
    fn zero_radius_is_rejected() {
        let config = CorrectionConfig::new(180.0, 140.0).with_radius(0.0);
        assert!(matches!(
            resolve(&config, 640, 480),
            Err(Error::DegenerateRadius { .. })
        ));
    }

    #[test]
    fn fov_domain_is_enforced() {
        for fov in [0.0, -10.0, 180.1, f64::NAN] {
            let config = CorrectionConfig::new(fov, 140.0);
            assert!(
                matches!(resolve(&config, 64, 64), Err(Error::InvalidFov { .. })),
                "fov {fov} accepted"
            );
        }
        let config = CorrectionConfig::new(180.0, 181.0);
        assert!(matches!(
            resolve(&config, 64, 64),
            Err(Error::InvalidPfov { .. })
        ));
    }

    #[test]
    fn angle_defaults_to_zero_and_converts_to_radians() {
        let config = CorrectionConfig::new(180.0, 140.0);
        assert_eq!(resolve(&config, 64, 64).unwrap().angle_rad, 0.0);

        let rotated = config.with_angle(90.0);
        let geom = resolve(&rotated, 64, 64).unwrap();
        assert!((geom.angle_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn resolve_is_pure() {
        let config = CorrectionConfig::new(170.0, 130.0)
            .with_radius(-1.2)
            .with_angle(45.0)
            .with_pad(4);
        let a = resolve(&config, 320, 240).unwrap();
        let b = resolve(&config, 320, 240).unwrap();
        assert_eq!(a, b);
    }
}
