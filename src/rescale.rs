//! Image rescaling with anti-aliasing and mirrored borders.

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};
use tracing::debug;

use crate::error::{ReconError, Result};

/// Gaussian kernels are truncated at this many standard deviations.
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Mirror an out-of-range index back into `[0, len)` without repeating the
/// edge sample: `-1 -> 1`, `len -> len - 2`.
#[inline]
fn mirror_index(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = idx.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// Normalised 1D Gaussian kernel with radius `ceil(4 sigma)`.
fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma).ceil() as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-(x * x) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

fn convolve_lane(input: ArrayView1<f64>, kernel: &[f64], mut output: ArrayViewMut1<f64>) {
    let n = input.len();
    let radius = (kernel.len() / 2) as isize;
    for (i, out) in output.iter_mut().enumerate() {
        *out = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * input[mirror_index(i as isize + k as isize - radius, n)])
            .sum();
    }
}

/// Gaussian blur along `axis` with mirrored borders.
fn blur_axis(input: ArrayView2<f64>, axis: Axis, sigma: f64) -> Array2<f64> {
    let kernel = gaussian_kernel_1d(sigma);
    if kernel.len() == 1 {
        return input.to_owned();
    }
    let mut output = Array2::<f64>::zeros(input.raw_dim());
    Zip::from(output.lanes_mut(axis))
        .and(input.lanes(axis))
        .for_each(|out, lane| convolve_lane(lane, &kernel, out));
    output
}

/// Source sample positions and weights for one output axis.
fn axis_taps(in_len: usize, out_len: usize) -> Vec<(usize, usize, f64)> {
    let scale = in_len as f64 / out_len as f64;
    (0..out_len)
        .map(|i| {
            let src = (i as f64 + 0.5) * scale - 0.5;
            let i0 = src.floor();
            let frac = src - i0;
            let i0 = i0 as isize;
            (
                mirror_index(i0, in_len),
                mirror_index(i0 + 1, in_len),
                frac,
            )
        })
        .collect()
}

/// Resize `image` by `factor` in (0, 1].
///
/// Output dimensions are `round(dim * factor)` with ties to even (at least
/// 1), so `5 * 0.5` gives 2. Downscaling
/// applies a Gaussian anti-aliasing filter first; resampling is bilinear.
/// Values are not clipped.
pub fn rescale(image: ArrayView2<f64>, factor: f64) -> Result<Array2<f64>> {
    if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
        return Err(ReconError::InvalidScaleFactor(factor));
    }
    if image.is_empty() {
        return Err(ReconError::EmptyImage);
    }

    let (rows, cols) = image.dim();
    let out_rows = ((rows as f64 * factor).round_ties_even() as usize).max(1);
    let out_cols = ((cols as f64 * factor).round_ties_even() as usize).max(1);

    let sigma_r = ((rows as f64 / out_rows as f64 - 1.0) / 2.0).max(0.0);
    let sigma_c = ((cols as f64 / out_cols as f64 - 1.0) / 2.0).max(0.0);
    let smoothed = blur_axis(image, Axis(0), sigma_r);
    let smoothed = blur_axis(smoothed.view(), Axis(1), sigma_c);

    let row_taps = axis_taps(rows, out_rows);
    let col_taps = axis_taps(cols, out_cols);
    let output = Array2::from_shape_fn((out_rows, out_cols), |(i, j)| {
        let (r0, r1, fr) = row_taps[i];
        let (c0, c1, fc) = col_taps[j];
        let top = smoothed[[r0, c0]] * (1.0 - fc) + smoothed[[r0, c1]] * fc;
        let bottom = smoothed[[r1, c0]] * (1.0 - fc) + smoothed[[r1, c1]] * fc;
        top * (1.0 - fr) + bottom * fr
    });

    debug!(
        from = ?(rows, cols),
        to = ?(out_rows, out_cols),
        factor,
        "rescaled image"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mirror_index() {
        assert_eq!(mirror_index(0, 5), 0);
        assert_eq!(mirror_index(4, 5), 4);
        assert_eq!(mirror_index(-1, 5), 1);
        assert_eq!(mirror_index(-2, 5), 2);
        assert_eq!(mirror_index(5, 5), 3);
        assert_eq!(mirror_index(6, 5), 2);
        assert_eq!(mirror_index(-7, 3), 1);
        assert_eq!(mirror_index(-3, 1), 0);
    }

    #[test]
    fn test_gaussian_kernel_sums_to_one() {
        for sigma in [0.25, 0.5, 1.0, 2.5] {
            let sum: f64 = gaussian_kernel_1d(sigma).iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        }
        assert_eq!(gaussian_kernel_1d(0.0), vec![1.0]);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let image = crate::phantom::shepp_logan(33);
        let out = rescale(image.view(), 1.0).unwrap();
        assert_eq!(out.dim(), image.dim());
        for (a, b) in out.iter().zip(image.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_output_dims_are_rounded() {
        let image = Array2::<f64>::ones((50, 31));
        let out = rescale(image.view(), 0.5).unwrap();
        assert_eq!(out.dim(), (25, 16));
        let tiny = rescale(Array2::<f64>::ones((3, 3)).view(), 0.1).unwrap();
        assert_eq!(tiny.dim(), (1, 1));
    }

    #[test]
    fn test_half_dims_round_to_even() {
        let out = rescale(Array2::from_elem((5, 5), 0.5).view(), 0.5).unwrap();
        assert_eq!(out.dim(), (2, 2));
        let out = rescale(Array2::from_elem((25, 25), 0.5).view(), 0.5).unwrap();
        assert_eq!(out.dim(), (12, 12));
        let out = rescale(Array2::from_elem((7, 9), 0.5).view(), 0.5).unwrap();
        assert_eq!(out.dim(), (4, 4));
    }

    #[test]
    fn test_constant_image_stays_constant() {
        // Mirrored borders mean no darkening at the edges.
        let image = Array2::from_elem((40, 40), 0.7);
        let out = rescale(image.view(), 0.3).unwrap();
        for &v in out.iter() {
            assert_abs_diff_eq!(v, 0.7, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_range_is_preserved() {
        let image = crate::phantom::shepp_logan(64);
        for factor in [0.1, 0.25, 0.5, 0.8] {
            let out = rescale(image.view(), factor).unwrap();
            assert!(out.iter().all(|&v| (-1e-9..=1.0 + 1e-9).contains(&v)));
        }
    }

    #[test]
    fn test_invalid_factor_rejected() {
        let image = Array2::<f64>::ones((4, 4));
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                rescale(image.view(), bad),
                Err(ReconError::InvalidScaleFactor(_))
            ));
        }
        let empty = Array2::<f64>::zeros((0, 4));
        assert_eq!(rescale(empty.view(), 0.5), Err(ReconError::EmptyImage));
    }
}
