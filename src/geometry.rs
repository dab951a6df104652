//! Parallel-beam sampling geometry shared by projection and back-projection.
//!
//! Image coordinates are measured from the geometric centre of the grid, `x`
//! along columns and `y` along rows. For a projection angle θ the detector
//! axis points along `(cos θ, sin θ)` and rays travel along `(-sin θ, cos θ)`,
//! so at θ = 0 each detector bin integrates one image column.
//!
//! Forward projection and the SART correction both walk rays through
//! [`ParallelBeam::trace_ray`]; FBP maps pixels onto the detector with
//! [`ParallelBeam::detector_position`], the exact inverse of the same frame.

use ndarray::ArrayView1;

/// Rotation of the sampling frame for one projection angle.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    cos: f64,
    sin: f64,
}

impl Frame {
    pub fn from_radians(theta: f64) -> Self {
        Self {
            cos: theta.cos(),
            sin: theta.sin(),
        }
    }
}

/// Detector and image layout for a parallel-beam scan of one image shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallelBeam {
    rows: usize,
    cols: usize,
    detectors: usize,
    row_center: f64,
    col_center: f64,
    detector_center: f64,
}

impl ParallelBeam {
    pub fn new(image_shape: (usize, usize)) -> Self {
        let (rows, cols) = image_shape;
        let detectors = Self::detector_count(image_shape);
        Self {
            rows,
            cols,
            detectors,
            row_center: (rows as f64 - 1.0) / 2.0,
            col_center: (cols as f64 - 1.0) / 2.0,
            detector_center: (detectors as f64 - 1.0) / 2.0,
        }
    }

    /// Detector bins needed so that no rotated projection is truncated:
    /// `ceil` of the image diagonal.
    pub fn detector_count(image_shape: (usize, usize)) -> usize {
        let (rows, cols) = image_shape;
        ((rows * rows + cols * cols) as f64).sqrt().ceil() as usize
    }

    pub fn image_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn detectors(&self) -> usize {
        self.detectors
    }

    /// Visit every pixel touched by the ray of detector `bin`, together with
    /// its bilinear weight. Rays are sampled at unit steps across the full
    /// detector length; samples outside the image contribute nothing.
    #[inline]
    pub fn trace_ray<F>(&self, frame: Frame, bin: usize, mut visit: F)
    where
        F: FnMut(usize, usize, f64),
    {
        let t = bin as f64 - self.detector_center;
        let rows = self.rows as f64;
        let cols = self.cols as f64;

        for j in 0..self.detectors {
            let s = j as f64 - self.detector_center;
            let row_f = t * frame.sin + s * frame.cos + self.row_center;
            let col_f = t * frame.cos - s * frame.sin + self.col_center;
            if row_f <= -1.0 || row_f >= rows || col_f <= -1.0 || col_f >= cols {
                continue;
            }

            let r0 = row_f.floor();
            let c0 = col_f.floor();
            let fr = row_f - r0;
            let fc = col_f - c0;
            let r0 = r0 as isize;
            let c0 = c0 as isize;

            for (dr, wr) in [(0, 1.0 - fr), (1, fr)] {
                let r = r0 + dr;
                if wr <= 0.0 || r < 0 || r >= self.rows as isize {
                    continue;
                }
                for (dc, wc) in [(0, 1.0 - fc), (1, fc)] {
                    let c = c0 + dc;
                    if wc <= 0.0 || c < 0 || c >= self.cols as isize {
                        continue;
                    }
                    visit(r as usize, c as usize, wr * wc);
                }
            }
        }
    }

    /// Fractional detector bin that pixel `(row, col)` projects onto.
    #[inline]
    pub fn detector_position(&self, frame: Frame, row: usize, col: usize) -> f64 {
        let x = col as f64 - self.col_center;
        let y = row as f64 - self.row_center;
        x * frame.cos + y * frame.sin + self.detector_center
    }
}

/// Linear interpolation of `values` at fractional index `pos`; zero outside
/// `[0, len - 1]`.
#[inline]
pub fn interp_linear(values: ArrayView1<f64>, pos: f64) -> f64 {
    let n = values.len();
    if n == 0 || pos < 0.0 || pos > (n - 1) as f64 {
        return 0.0;
    }
    let i0 = pos.floor() as usize;
    if i0 + 1 >= n {
        return values[n - 1];
    }
    let frac = pos - i0 as f64;
    values[i0] * (1.0 - frac) + values[i0 + 1] * frac
}
