//! Synthetic test images.
//!
//! Ellipse coordinates are normalised: `x` runs from -1 (left) to 1 (right)
//! and `y` from -1 (bottom) to 1 (top) across the image.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One additive ellipse of a phantom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub intensity: f64,
    pub semi_x: f64,
    pub semi_y: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Counter-clockwise rotation in degrees.
    pub rotation: f64,
}

impl Ellipse {
    const fn new(
        intensity: f64,
        semi_x: f64,
        semi_y: f64,
        center_x: f64,
        center_y: f64,
        rotation: f64,
    ) -> Self {
        Self {
            intensity,
            semi_x,
            semi_y,
            center_x,
            center_y,
            rotation,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;
        (u / self.semi_x).powi(2) + (v / self.semi_y).powi(2) <= 1.0
    }
}

/// Modified Shepp-Logan head phantom (Toft), intensities in [0, 1].
pub const SHEPP_LOGAN: [Ellipse; 10] = [
    Ellipse::new(1.0, 0.69, 0.92, 0.0, 0.0, 0.0),
    Ellipse::new(-0.8, 0.6624, 0.874, 0.0, -0.0184, 0.0),
    Ellipse::new(-0.2, 0.11, 0.31, 0.22, 0.0, -18.0),
    Ellipse::new(-0.2, 0.16, 0.41, -0.22, 0.0, 18.0),
    Ellipse::new(0.1, 0.21, 0.25, 0.0, 0.35, 0.0),
    Ellipse::new(0.1, 0.046, 0.046, 0.0, 0.1, 0.0),
    Ellipse::new(0.1, 0.046, 0.046, 0.0, -0.1, 0.0),
    Ellipse::new(0.1, 0.046, 0.023, -0.08, -0.605, 0.0),
    Ellipse::new(0.1, 0.023, 0.023, 0.0, -0.606, 0.0),
    Ellipse::new(0.1, 0.023, 0.046, 0.06, -0.605, 0.0),
];

/// Sum of `ellipses` rasterised onto a `shape` grid.
pub fn ellipses(shape: (usize, usize), ellipses: &[Ellipse]) -> Array2<f64> {
    let (rows, cols) = shape;
    let half_w = cols as f64 / 2.0;
    let half_h = rows as f64 / 2.0;
    Array2::from_shape_fn(shape, |(r, c)| {
        let x = (c as f64 + 0.5 - half_w) / half_w;
        let y = (half_h - r as f64 - 0.5) / half_h;
        ellipses
            .iter()
            .filter(|e| e.contains(x, y))
            .map(|e| e.intensity)
            .sum()
    })
}

pub fn shepp_logan(size: usize) -> Array2<f64> {
    ellipses((size, size), &SHEPP_LOGAN)
}

/// Filled disk of `value` centred at `(row, col)` in pixel coordinates.
pub fn disk(shape: (usize, usize), center: (f64, f64), radius: f64, value: f64) -> Array2<f64> {
    let r2 = radius * radius;
    Array2::from_shape_fn(shape, |(r, c)| {
        let dr = r as f64 - center.0;
        let dc = c as f64 - center.1;
        if dr * dr + dc * dc <= r2 {
            value
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_area() {
        let d = disk((64, 64), (31.5, 31.5), 10.0, 1.0);
        let area = d.sum();
        let expected = std::f64::consts::PI * 100.0;
        assert!((area - expected).abs() / expected < 0.05);
        assert_eq!(d[[0, 0]], 0.0);
        assert_eq!(d[[31, 31]], 1.0);
    }

    #[test]
    fn test_shepp_logan_range() {
        let p = shepp_logan(128);
        assert_eq!(p.dim(), (128, 128));
        let min = p.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = p.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min >= -1e-12);
        assert!((max - 1.0).abs() < 1e-12);
        // Corners are empty, the skull rim is bright, brain matter is 0.2.
        assert_eq!(p[[0, 0]], 0.0);
        assert!((p[[64, 20]] - 1.0).abs() < 1e-12);
        assert!((p[[64, 64]] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_rotated_ellipse() {
        let tilted = Ellipse::new(1.0, 0.8, 0.1, 0.0, 0.0, 90.0);
        let img = ellipses((41, 41), &[tilted]);
        // Rotated by 90 degrees the long axis is vertical.
        assert_eq!(img[[5, 20]], 1.0);
        assert_eq!(img[[20, 5]], 0.0);
    }
}
