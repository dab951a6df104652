use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};

/// Ordered projection angles in degrees.
///
/// Angle `i` corresponds to sinogram column `i`; the order given at
/// construction is never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct AngleSequence {
    degrees: Vec<f64>,
}

impl AngleSequence {
    /// Angles in any order, each within `[0, 180]` degrees.
    pub fn new(degrees: Vec<f64>) -> Result<Self> {
        if degrees.is_empty() {
            return Err(ReconError::EmptyAngles);
        }
        if let Some(&bad) = degrees.iter().find(|d| !(0.0..=180.0).contains(*d)) {
            return Err(ReconError::InvalidAngle(bad));
        }
        Ok(Self { degrees })
    }

    /// `count` evenly spaced angles covering `[0, max_angle)`.
    pub fn evenly_spaced(max_angle: f64, count: usize) -> Result<Self> {
        if !(max_angle > 0.0 && max_angle <= 180.0) {
            return Err(ReconError::InvalidMaxAngle(max_angle));
        }
        if count == 0 {
            return Err(ReconError::EmptyAngles);
        }
        let step = max_angle / count as f64;
        Ok(Self {
            degrees: (0..count).map(|i| i as f64 * step).collect(),
        })
    }

    /// One angle per pixel along the larger image side.
    pub fn for_image(shape: (usize, usize), max_angle: f64) -> Result<Self> {
        Self::evenly_spaced(max_angle, shape.0.max(shape.1))
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    pub fn radians(&self) -> impl Iterator<Item = f64> + '_ {
        self.degrees.iter().map(|d| d.to_radians())
    }
}

impl TryFrom<Vec<f64>> for AngleSequence {
    type Error = ReconError;

    fn try_from(degrees: Vec<f64>) -> Result<Self> {
        Self::new(degrees)
    }
}

impl From<AngleSequence> for Vec<f64> {
    fn from(angles: AngleSequence) -> Self {
        angles.degrees
    }
}
