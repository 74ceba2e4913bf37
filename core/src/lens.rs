//! Fisheye lens projection models.
//!
//! Each variant relates the incidence angle `theta` of an incoming ray
//! (radians, measured from the optical axis) to a normalized radius on the
//! fisheye circle. The engine only ever evaluates the forward direction:
//! from the angle reconstructed for an output pixel to the source radius.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Angle-to-radius projection formula of a fisheye lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensModel {
    /// Equidistant: radius proportional to angle.
    Linear,
    /// Equisolid: preserves solid angle per area.
    EqualArea,
    Orthographic,
    Stereographic,
}

impl LensModel {
    pub const ALL: [LensModel; 4] = [
        LensModel::Linear,
        LensModel::EqualArea,
        LensModel::Orthographic,
        LensModel::Stereographic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LensModel::Linear => "linear",
            LensModel::EqualArea => "equalarea",
            LensModel::Orthographic => "orthographic",
            LensModel::Stereographic => "stereographic",
        }
    }

    /// Unnormalized radius term; the normalizer is this evaluated at `theta_max`.
    fn radius_term(&self, theta: f64) -> f64 {
        match self {
            LensModel::Linear => theta,
            LensModel::EqualArea => (theta / 2.0).sin(),
            LensModel::Orthographic => theta.sin(),
            LensModel::Stereographic => (theta / 2.0).tan(),
        }
    }

    /// Forward mapping from incidence angle to normalized source radius.
    ///
    /// For `theta` in `[0, theta_max]` and a non-degenerate `theta_max` the
    /// result lies in `[0, 1]` and increases monotonically with `theta`.
    pub fn source_radius(&self, theta: f64, theta_max: f64) -> f64 {
        self.radius_term(theta) / self.radius_term(theta_max)
    }

    /// Reject a field of view whose normalizer would be zero or non-finite.
    ///
    /// Within the accepted fov domain `(0, 180]` no variant is actually
    /// degenerate; the guard covers the full `theta_max` contract of
    /// `source_radius` (`(0, pi]`).
    pub(crate) fn validate(&self, fov_deg: f64) -> Result<()> {
        let theta_max = fov_deg.to_radians() / 2.0;
        let normalizer = self.radius_term(theta_max);
        if !normalizer.is_finite() || normalizer.abs() < f64::EPSILON {
            return Err(Error::DegenerateLens {
                model: *self,
                fov: fov_deg,
            });
        }
        Ok(())
    }
}

impl fmt::Display for LensModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LensModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(LensModel::Linear),
            "equalarea" => Ok(LensModel::EqualArea),
            "orthographic" => Ok(LensModel::Orthographic),
            "stereographic" => Ok(LensModel::Stereographic),
            other => Err(Error::UnknownLensModel(other.to_string())),
        }
    }
}
