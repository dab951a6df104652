//! Image and sinogram comparison measures.
//!
//! Every measure compares its arguments elementwise and fails with
//! [`ReconError::EstimateShapeMismatch`] when their shapes differ.

use ndarray::{ArrayView2, Zip};

use crate::angles::AngleSequence;
use crate::error::{ReconError, Result};
use crate::radon::forward_project;
use crate::sinogram::Sinogram;

fn check_shapes(reference: &ArrayView2<f64>, estimate: &ArrayView2<f64>) -> Result<()> {
    if reference.dim() != estimate.dim() {
        return Err(ReconError::EstimateShapeMismatch {
            expected: reference.dim(),
            found: estimate.dim(),
        });
    }
    Ok(())
}

/// Mean squared error.
pub fn mse(reference: ArrayView2<f64>, estimate: ArrayView2<f64>) -> Result<f64> {
    check_shapes(&reference, &estimate)?;
    if reference.is_empty() {
        return Ok(0.0);
    }
    let mut sum = 0.0;
    Zip::from(&reference)
        .and(&estimate)
        .for_each(|&a, &b| sum += (a - b).powi(2));
    Ok(sum / reference.len() as f64)
}

/// Squared error normalised by the energy of `reference`.
pub fn nmse(reference: ArrayView2<f64>, estimate: ArrayView2<f64>) -> Result<f64> {
    check_shapes(&reference, &estimate)?;
    let mut err = 0.0;
    let mut energy = 0.0;
    Zip::from(&reference).and(&estimate).for_each(|&a, &b| {
        err += (a - b).powi(2);
        energy += a * a;
    });
    if energy == 0.0 {
        return Ok(if err == 0.0 { 0.0 } else { f64::INFINITY });
    }
    Ok(err / energy)
}

/// Peak signal-to-noise ratio in dB for the given data range.
pub fn psnr(
    reference: ArrayView2<f64>,
    estimate: ArrayView2<f64>,
    data_range: f64,
) -> Result<f64> {
    let err = mse(reference, estimate)?;
    if err == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (data_range * data_range / err).log10())
}

/// Pearson correlation coefficient; 0 when either image is constant.
pub fn correlation(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<f64> {
    check_shapes(&a, &b)?;
    let n = a.len() as f64;
    if n == 0.0 {
        return Ok(0.0);
    }
    let mean_a = a.sum() / n;
    let mean_b = b.sum() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    Zip::from(&a).and(&b).for_each(|&x, &y| {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    });
    if var_a == 0.0 || var_b == 0.0 {
        return Ok(0.0);
    }
    Ok(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// `sum((forward_project(estimate) - sinogram)^2)`.
pub fn residual_energy(
    estimate: ArrayView2<f64>,
    sinogram: &Sinogram,
    angles: &AngleSequence,
) -> Result<f64> {
    sinogram.check_angles(angles)?;
    if estimate.dim() != sinogram.image_shape() {
        return Err(ReconError::EstimateShapeMismatch {
            expected: sinogram.image_shape(),
            found: estimate.dim(),
        });
    }
    let simulated = forward_project(estimate, angles)?;
    let mut energy = 0.0;
    Zip::from(simulated.data())
        .and(sinogram.data())
        .for_each(|&s, &m| energy += (s - m).powi(2));
    Ok(energy)
}
