//! Forward projection (discrete Radon transform).

use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::angles::AngleSequence;
use crate::error::{ReconError, Result};
use crate::geometry::{Frame, ParallelBeam};
use crate::sinogram::Sinogram;

/// Line integrals of `image` along every ray of one angle.
pub fn project_angle(image: ArrayView2<f64>, beam: &ParallelBeam, theta: f64) -> Array1<f64> {
    let frame = Frame::from_radians(theta);
    Array1::from_shape_fn(beam.detectors(), |bin| {
        let mut sum = 0.0;
        beam.trace_ray(frame, bin, |r, c, w| sum += w * image[[r, c]]);
        sum
    })
}

/// Simulate the sinogram of `image` at every angle of `angles`.
///
/// Column `i` of the result is the projection at `angles[i]`.
pub fn forward_project(image: ArrayView2<f64>, angles: &AngleSequence) -> Result<Sinogram> {
    if image.is_empty() {
        return Err(ReconError::EmptyImage);
    }
    if angles.is_empty() {
        return Err(ReconError::EmptyAngles);
    }

    let start = Instant::now();
    let beam = ParallelBeam::new(image.dim());
    let thetas: Vec<f64> = angles.radians().collect();

    let projections: Vec<Array1<f64>> = thetas
        .par_iter()
        .map(|&theta| project_angle(image, &beam, theta))
        .collect();

    let mut data = Array2::<f64>::zeros((beam.detectors(), thetas.len()));
    for (i, projection) in projections.into_iter().enumerate() {
        data.column_mut(i).assign(&projection);
    }

    debug!(
        image_shape = ?image.dim(),
        detectors = beam.detectors(),
        angles = thetas.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "forward projection done"
    );
    Sinogram::with_image_shape(data, image.dim())
}
