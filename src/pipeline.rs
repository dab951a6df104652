//! End-to-end run: rescale, project, reconstruct.
//!
//! [`ReconParams`] carries the user-facing knobs as plain values and can be
//! loaded from JSON, e.g.
//!
//! ```json
//! { "scale": 0.5, "max_angle": 180.0, "method": { "method": "sart", "iterations": 3 } }
//! ```

use std::time::Instant;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::angles::AngleSequence;
use crate::error::{ReconError, Result};
use crate::fbp::reconstruct_fbp_with;
use crate::filters::FilterKind;
use crate::radon::forward_project;
use crate::rescale::rescale;
use crate::sart::{reconstruct_sart_with, SartConfig};
use crate::sinogram::Sinogram;

/// Reconstruction algorithm and its settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum Method {
    Fbp {
        #[serde(default)]
        filter: FilterKind,
    },
    Sart(SartConfig),
}

impl Default for Method {
    fn default() -> Self {
        Method::Fbp {
            filter: FilterKind::Ramp,
        }
    }
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Fbp { .. } => "fbp",
            Method::Sart(_) => "sart",
        }
    }
}

/// Additive Gaussian noise applied to the simulated sinogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorNoise {
    pub std_dev: f64,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconParams {
    /// Rescale factor in (0, 1] applied to the input image.
    pub scale: f64,
    /// Angles are spread over `[0, max_angle)`, one per pixel of the larger side.
    pub max_angle: f64,
    pub method: Method,
    pub noise: Option<DetectorNoise>,
}

impl Default for ReconParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            max_angle: 150.0,
            method: Method::default(),
            noise: None,
        }
    }
}

impl ReconParams {
    /// Check every value before any numeric work starts.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0 && self.scale <= 1.0) {
            return Err(ReconError::InvalidScaleFactor(self.scale));
        }
        if !(self.max_angle > 0.0 && self.max_angle <= 180.0) {
            return Err(ReconError::InvalidMaxAngle(self.max_angle));
        }
        if let Method::Sart(config) = &self.method {
            config.validate()?;
        }
        if let Some(noise) = &self.noise {
            if !(noise.std_dev.is_finite() && noise.std_dev >= 0.0) {
                return Err(ReconError::InvalidNoise(noise.std_dev));
            }
        }
        Ok(())
    }
}

/// Every intermediate product of a [`run`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Input after rescaling; the reference for the reconstruction.
    pub image: Array2<f64>,
    pub angles: AngleSequence,
    pub sinogram: Sinogram,
    pub reconstruction: Array2<f64>,
}

/// Rescale `image`, simulate its sinogram and reconstruct it with the
/// selected method.
pub fn run(image: ArrayView2<f64>, params: &ReconParams) -> Result<RunOutput> {
    params.validate()?;
    let start = Instant::now();

    let image = rescale(image, params.scale)?;
    let angles = AngleSequence::for_image(image.dim(), params.max_angle)?;
    let mut sinogram = forward_project(image.view(), &angles)?;
    if let Some(noise) = params.noise {
        sinogram = sinogram.with_gaussian_noise(noise.std_dev, noise.seed)?;
    }
    info!(
        image_shape = ?image.dim(),
        angles = angles.len(),
        detectors = sinogram.detectors(),
        "sinogram ready"
    );

    let reconstruction = match &params.method {
        Method::Fbp { filter } => reconstruct_fbp_with(&sinogram, &angles, *filter)?,
        Method::Sart(config) => reconstruct_sart_with(&sinogram, &angles, config, None)?,
    };
    info!(
        method = params.method.name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "reconstruction done"
    );

    Ok(RunOutput {
        image,
        angles,
        sinogram,
        reconstruction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::nmse;
    use crate::phantom;

    #[test]
    fn test_defaults() {
        let params = ReconParams::default();
        assert_eq!(params.scale, 1.0);
        assert_eq!(params.max_angle, 150.0);
        assert_eq!(
            params.method,
            Method::Fbp {
                filter: FilterKind::Ramp
            }
        );
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn test_params_from_json() {
        let params: ReconParams = serde_json::from_str(
            r#"{"scale": 0.5, "method": {"method": "sart", "iterations": 3}}"#,
        )
        .unwrap();
        assert_eq!(params.scale, 0.5);
        assert_eq!(params.max_angle, 150.0);
        assert_eq!(
            params.method,
            Method::Sart(SartConfig {
                iterations: 3,
                ..Default::default()
            })
        );

        let params: ReconParams =
            serde_json::from_str(r#"{"method": {"method": "fbp", "filter": "hamming"}}"#).unwrap();
        assert_eq!(
            params.method,
            Method::Fbp {
                filter: FilterKind::Hamming
            }
        );

        assert!(serde_json::from_str::<ReconParams>(
            r#"{"method": {"method": "fbp", "filter": "box"}}"#
        )
        .is_err());
    }

    #[test]
    fn test_validation_precedes_work() {
        let image = phantom::shepp_logan(16);
        let params = ReconParams {
            scale: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            run(image.view(), &params),
            Err(ReconError::InvalidScaleFactor(_))
        ));
        let params = ReconParams {
            method: Method::Sart(SartConfig {
                iterations: 0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(run(image.view(), &params).unwrap_err(), ReconError::InvalidIterations);
    }

    #[test]
    fn test_run_fbp_and_sart() {
        let image = phantom::shepp_logan(48);
        let fbp = run(
            image.view(),
            &ReconParams {
                scale: 0.5,
                max_angle: 180.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(fbp.image.dim(), (24, 24));
        assert_eq!(fbp.angles.len(), 24);
        assert_eq!(fbp.sinogram.data().dim(), (34, 24));
        assert_eq!(fbp.reconstruction.dim(), (24, 24));

        let sart = run(
            image.view(),
            &ReconParams {
                scale: 0.5,
                max_angle: 180.0,
                method: Method::Sart(SartConfig {
                    iterations: 3,
                    relaxation: 0.3,
                    clip: Some((0.0, 1.0)),
                }),
                noise: None,
            },
        )
        .unwrap();
        assert_eq!(sart.reconstruction.dim(), (24, 24));
        assert!(nmse(sart.image.view(), sart.reconstruction.view()).unwrap() < 0.5);
    }

    #[test]
    fn test_noise_is_applied_to_sinogram() {
        let image = phantom::disk((16, 16), (7.5, 7.5), 5.0, 1.0);
        let clean = run(image.view(), &ReconParams::default()).unwrap();
        let noisy = run(
            image.view(),
            &ReconParams {
                noise: Some(DetectorNoise {
                    std_dev: 0.5,
                    seed: 3,
                }),
                ..Default::default()
            },
        )
        .unwrap();
        assert_ne!(clean.sinogram, noisy.sinogram);
    }
}
