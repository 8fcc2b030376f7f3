//! Orientation classification of a video stream.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AppError;

/// Tolerance band around 16:9 (~1.778).
const LANDSCAPE_RATIO: (f64, f64) = (1.7, 1.8);
/// Tolerance band around 9:16 (0.5625).
const PORTRAIT_RATIO: (f64, f64) = (0.55, 0.57);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Classify a stream from its pixel dimensions.
    ///
    /// Bounds are exclusive on both sides. A zero height is an inspection
    /// failure rather than an infinite ratio.
    pub fn classify(width: u32, height: u32) -> Result<Self, AppError> {
        if height == 0 {
            return Err(AppError::InspectionFailed(format!(
                "stream reports zero height (width {})",
                width
            )));
        }

        let ratio = f64::from(width) / f64::from(height);

        if ratio > LANDSCAPE_RATIO.0 && ratio < LANDSCAPE_RATIO.1 {
            Ok(Orientation::Landscape)
        } else if ratio > PORTRAIT_RATIO.0 && ratio < PORTRAIT_RATIO.1 {
            Ok(Orientation::Portrait)
        } else {
            Ok(Orientation::Other)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Pixel geometry of the first stream reported by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

impl VideoGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn orientation(&self) -> Result<Orientation, AppError> {
        Orientation::classify(self.width, self.height)
    }
}
