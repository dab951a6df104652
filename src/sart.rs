//! Simultaneous Algebraic Reconstruction Technique.

use std::time::Instant;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::angles::AngleSequence;
use crate::error::{ReconError, Result};
use crate::geometry::{Frame, ParallelBeam};
use crate::sinogram::Sinogram;

/// Rays or pixels with less accumulated weight than this are left alone.
const WEIGHT_EPSILON: f64 = 1e-9;

/// Settings for an iterative SART run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SartConfig {
    /// Number of full sweeps over all angles.
    pub iterations: usize,
    /// Damping applied to every correction, typically in (0, 1].
    pub relaxation: f64,
    /// Optional `(min, max)` clamp applied after every angle update.
    pub clip: Option<(f64, f64)>,
}

impl Default for SartConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            relaxation: 0.15,
            clip: None,
        }
    }
}

impl SartConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(ReconError::InvalidIterations);
        }
        if !(self.relaxation.is_finite() && self.relaxation > 0.0) {
            return Err(ReconError::InvalidRelaxation(self.relaxation));
        }
        if let Some((min, max)) = self.clip {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(ReconError::InvalidClip { min, max });
            }
        }
        Ok(())
    }
}

/// Perform one SART update for a single projection angle.
///
/// measured:   projection at `theta`, one value per detector bin
/// estimate:   current image, updated in place
/// relaxation: damping factor (lambda)
pub fn sart_step(
    estimate: &mut Array2<f64>,
    measured: ArrayView1<f64>,
    beam: &ParallelBeam,
    theta: f64,
    relaxation: f64,
    clip: Option<(f64, f64)>,
) {
    let shape = beam.image_shape();
    let frame = Frame::from_radians(theta);
    let current = estimate.view();
    let job_size = (beam.detectors() / rayon::current_num_threads()).max(1);

    // Per-thread (correction, weight) grids, summed once all rays are done.
    let zeros = || (Array2::<f64>::zeros(shape), Array2::<f64>::zeros(shape));
    let (correction, weight) = (0..beam.detectors())
        .into_par_iter()
        .fold_chunks(job_size, zeros, |(mut correction, mut weight), bin| {
            let mut simulated = 0.0;
            let mut length = 0.0;
            beam.trace_ray(frame, bin, |r, c, w| {
                simulated += w * current[[r, c]];
                length += w;
            });
            if length > WEIGHT_EPSILON {
                let residual = (measured[bin] - simulated) / length;
                beam.trace_ray(frame, bin, |r, c, w| {
                    correction[[r, c]] += w * residual;
                    weight[[r, c]] += w;
                });
            }
            (correction, weight)
        })
        .reduce(zeros, |(c1, w1), (c2, w2)| (c1 + c2, w1 + w2));

    ndarray::Zip::from(estimate)
        .and(&correction)
        .and(&weight)
        .for_each(|x, &num, &den| {
            if den > WEIGHT_EPSILON {
                *x += relaxation * num / den;
                if let Some((min, max)) = clip {
                    *x = x.clamp(min, max);
                }
            }
        });
}

/// One sweep: a SART step for every angle, in sequence order.
pub fn sart_sweep(
    estimate: &mut Array2<f64>,
    sinogram: &Sinogram,
    angles: &AngleSequence,
    config: &SartConfig,
) {
    let beam = sinogram.geometry();
    for (i, theta) in angles.radians().enumerate() {
        sart_step(
            estimate,
            sinogram.projection(i),
            &beam,
            theta,
            config.relaxation,
            config.clip,
        );
    }
}

/// SART reconstruction with explicit iteration count and relaxation.
///
/// Starts from `initial` when given, otherwise from an all-zero image.
pub fn reconstruct_sart(
    sinogram: &Sinogram,
    angles: &AngleSequence,
    iterations: usize,
    relaxation: f64,
    initial: Option<&Array2<f64>>,
) -> Result<Array2<f64>> {
    let config = SartConfig {
        iterations,
        relaxation,
        clip: None,
    };
    reconstruct_sart_with(sinogram, angles, &config, initial)
}

pub fn reconstruct_sart_with(
    sinogram: &Sinogram,
    angles: &AngleSequence,
    config: &SartConfig,
    initial: Option<&Array2<f64>>,
) -> Result<Array2<f64>> {
    config.validate()?;
    sinogram.check_angles(angles)?;

    let shape = sinogram.image_shape();
    let mut estimate = match initial {
        Some(init) if init.dim() != shape => {
            return Err(ReconError::EstimateShapeMismatch {
                expected: shape,
                found: init.dim(),
            });
        }
        Some(init) => init.clone(),
        None => Array2::zeros(shape),
    };

    for sweep in 0..config.iterations {
        let start = Instant::now();
        sart_sweep(&mut estimate, sinogram, angles, config);
        debug!(
            sweep = sweep + 1,
            of = config.iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "SART sweep done"
        );
    }

    Ok(estimate)
}
