//! Frequency-domain projection filters for filtered back-projection.
//!
//! Every filter is the ramp `2|f|` (f in cycles per detector bin) optionally
//! tapered by a window that suppresses high frequencies. The ramp is built
//! from the spatial Ram-Lak kernel rather than sampled directly in frequency
//! space, which avoids the zero DC term and the resulting offset.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Smallest zero-padded projection length handed to the FFT.
const MIN_PADDED_LENGTH: usize = 64;

/// Projection filter applied before back-projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterKind {
    #[default]
    Ramp,
    SheppLogan,
    Cosine,
    Hamming,
    Hann,
    /// Plain back-projection with no filtering.
    None,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Ramp,
        FilterKind::SheppLogan,
        FilterKind::Cosine,
        FilterKind::Hamming,
        FilterKind::Hann,
        FilterKind::None,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Ramp => "ramp",
            FilterKind::SheppLogan => "shepp-logan",
            FilterKind::Cosine => "cosine",
            FilterKind::Hamming => "hamming",
            FilterKind::Hann => "hann",
            FilterKind::None => "none",
        }
    }

    /// Window multiplying the ramp at frequency `f` (cycles/sample, |f| <= 1/2).
    fn window(self, f: f64) -> f64 {
        match self {
            FilterKind::Ramp | FilterKind::None => 1.0,
            FilterKind::SheppLogan => {
                let half = PI * f / 2.0;
                if half == 0.0 {
                    1.0
                } else {
                    half.sin() / half
                }
            }
            FilterKind::Cosine => (PI * f).cos(),
            FilterKind::Hamming => 0.54 + 0.46 * (2.0 * PI * f).cos(),
            FilterKind::Hann => 0.5 + 0.5 * (2.0 * PI * f).cos(),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| ReconError::UnknownFilter(s.to_string()))
    }
}

impl TryFrom<String> for FilterKind {
    type Error = ReconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterKind> for String {
    fn from(kind: FilterKind) -> Self {
        kind.name().to_string()
    }
}

/// Zero-padded projection length: a power of two at least twice the
/// detector length, so circular convolution does not wrap.
pub fn padded_length(detectors: usize) -> usize {
    (2 * detectors).next_power_of_two().max(MIN_PADDED_LENGTH)
}

/// Signed frequency of DFT bin `k` in cycles/sample (numpy `fftfreq` order).
fn fft_frequency(k: usize, size: usize) -> f64 {
    let k = if k < size.div_ceil(2) {
        k as f64
    } else {
        k as f64 - size as f64
    };
    k / size as f64
}

/// Real frequency response of `kind` over `size` DFT bins (power of two).
pub fn frequency_response(kind: FilterKind, size: usize) -> Array1<f64> {
    if kind == FilterKind::None {
        return Array1::ones(size);
    }

    // Ram-Lak kernel: h[0] = 1/4, h[n] = -1/(pi n)^2 for odd n, else 0.
    let mut kernel = vec![Complex::new(0.0, 0.0); size];
    kernel[0].re = 0.25;
    for (i, value) in kernel.iter_mut().enumerate().skip(1).step_by(2) {
        let n = (if i <= size / 2 { i } else { size - i }) as f64;
        value.re = -1.0 / (PI * n).powi(2);
    }

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(size).process(&mut kernel);

    Array1::from_shape_fn(size, |k| {
        2.0 * kernel[k].re * kind.window(fft_frequency(k, size))
    })
}

/// Filter every projection (column) of `sinogram` with `kind`.
///
/// Each column is zero-padded to [`padded_length`], multiplied by the
/// frequency response and truncated back to the detector length.
pub fn filter_projections(sinogram: ArrayView2<f64>, kind: FilterKind) -> Array2<f64> {
    if kind == FilterKind::None {
        return sinogram.to_owned();
    }

    let (detectors, num_angles) = sinogram.dim();
    let size = padded_length(detectors);
    let response = frequency_response(kind, size);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(size);
    let ifft = planner.plan_fft_inverse(size);
    let norm = 1.0 / size as f64;

    let filtered: Vec<Array1<f64>> = (0..num_angles)
        .into_par_iter()
        .map(|i| {
            let mut buffer = vec![Complex::new(0.0, 0.0); size];
            for (slot, &v) in buffer.iter_mut().zip(sinogram.column(i).iter()) {
                slot.re = v;
            }
            fft.process(&mut buffer);
            for (slot, &h) in buffer.iter_mut().zip(response.iter()) {
                *slot *= h;
            }
            ifft.process(&mut buffer);
            buffer[..detectors].iter().map(|c| c.re * norm).collect()
        })
        .collect();

    let mut output = Array2::<f64>::zeros((detectors, num_angles));
    for (i, column) in filtered.into_iter().enumerate() {
        output.column_mut(i).assign(&column);
    }
    output
}
