//! Correction parameters and the named preset table.
//!
//! `CorrectionConfig` is the full user-facing parameter surface. Fields
//! that support an "auto" setting are `Option`s; the resolver is the only
//! place auto values are turned into concrete geometry, so the map math
//! never sees a sentinel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::lens::LensModel;
use crate::{Error, Result};

/// How output pixel distance from center maps onto the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Normalize by the canvas half-diagonal; the far corners reach 1.
    Fullframe,
    /// Normalize by half the smaller canvas dimension; pixels outside the
    /// inscribed circle are invalid regardless of lens model.
    Circular,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Fullframe => "fullframe",
            OutputFormat::Circular => "circular",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fullframe" => Ok(OutputFormat::Fullframe),
            "circular" => Ok(OutputFormat::Circular),
            other => Err(Error::UnknownOutputFormat(other.to_string())),
        }
    }
}

/// Parameters for one projection correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Input lens field of view in degrees, `(0, 180]`.
    pub fov: f64,
    /// Output (perspective) field of view in degrees, `(0, 180]`.
    pub pfov: f64,
    /// Fisheye circle center x in canvas pixels; `None` means canvas center.
    pub xcenter: Option<f64>,
    /// Fisheye circle center y in canvas pixels; `None` means canvas center.
    pub ycenter: Option<f64>,
    /// Fisheye circle radius. Positive values are pixels; negative values
    /// scale half the smaller source dimension (`-1.4` on a 100x100 image
    /// resolves to 70). `None` derives the radius from the output format.
    pub radius: Option<f64>,
    /// Azimuth rotation in degrees applied before sampling; `None` means 0.
    pub angle: Option<f64>,
    pub lens_model: LensModel,
    pub output_format: OutputFormat,
    /// Symmetric border in pixels added to each canvas edge before the
    /// geometry is computed.
    pub pad: u32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            fov: 180.0,
            pfov: 120.0,
            xcenter: None,
            ycenter: None,
            radius: None,
            angle: None,
            lens_model: LensModel::EqualArea,
            output_format: OutputFormat::Fullframe,
            pad: 0,
        }
    }
}

impl CorrectionConfig {
    pub fn new(fov: f64, pfov: f64) -> Self {
        Self {
            fov,
            pfov,
            ..Default::default()
        }
    }

    pub fn with_lens_model(mut self, lens_model: LensModel) -> Self {
        self.lens_model = lens_model;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_center(mut self, xcenter: f64, ycenter: f64) -> Self {
        self.xcenter = Some(xcenter);
        self.ycenter = Some(ycenter);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn with_pad(mut self, pad: u32) -> Self {
        self.pad = pad;
        self
    }
}

/// Names accepted by [`preset`], in presentation order.
pub const PRESET_NAMES: [&str; 6] = [
    "stereographic",
    "linear",
    "equalarea",
    "orthographic",
    "ultra_wide",
    "circular",
];

/// Look up a named correction preset.
///
/// Presets are plain data; callers that offer preset selection pass the
/// returned config through the normal entry points.
pub fn preset(name: &str) -> Option<CorrectionConfig> {
    let config = match name {
        "stereographic" => CorrectionConfig::new(180.0, 140.0)
            .with_lens_model(LensModel::Stereographic),
        "linear" => CorrectionConfig::new(180.0, 120.0).with_lens_model(LensModel::Linear),
        "equalarea" => CorrectionConfig::new(180.0, 130.0)
            .with_lens_model(LensModel::EqualArea)
            .with_output_format(OutputFormat::Circular),
        "orthographic" => {
            CorrectionConfig::new(180.0, 110.0).with_lens_model(LensModel::Orthographic)
        }
        "ultra_wide" => CorrectionConfig::new(140.0, 90.0)
            .with_lens_model(LensModel::Stereographic),
        "circular" => CorrectionConfig::new(180.0, 140.0)
            .with_lens_model(LensModel::Stereographic)
            .with_output_format(OutputFormat::Circular),
        _ => return None,
    };
    Some(config)
}
