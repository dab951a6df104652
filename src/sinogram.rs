use ndarray::{Array2, ArrayView1, ArrayView2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::angles::AngleSequence;
use crate::error::{ReconError, Result};
use crate::geometry::ParallelBeam;

/// Projection measurements, one column per angle, plus the shape of the
/// image they were taken from.
///
/// Rows index detector bins, `ceil(diagonal)` of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Sinogram {
    data: Array2<f64>,
    image_shape: (usize, usize),
}

impl Sinogram {
    /// Wrap measurements taken from an image of the given shape.
    pub fn with_image_shape(data: Array2<f64>, image_shape: (usize, usize)) -> Result<Self> {
        if image_shape.0 == 0 || image_shape.1 == 0 {
            return Err(ReconError::EmptyImage);
        }
        let expected = ParallelBeam::detector_count(image_shape);
        if data.nrows() != expected {
            return Err(ReconError::DetectorMismatch {
                image_shape,
                expected,
                found: data.nrows(),
            });
        }
        if data.ncols() == 0 {
            return Err(ReconError::EmptyAngles);
        }
        Ok(Self { data, image_shape })
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn image_shape(&self) -> (usize, usize) {
        self.image_shape
    }

    pub fn detectors(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_angles(&self) -> usize {
        self.data.ncols()
    }

    pub fn projection(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.column(index)
    }

    pub fn geometry(&self) -> ParallelBeam {
        ParallelBeam::new(self.image_shape)
    }

    /// Fail unless there is exactly one column per angle.
    pub fn check_angles(&self, angles: &AngleSequence) -> Result<()> {
        if self.num_angles() != angles.len() {
            return Err(ReconError::SinogramAngleMismatch {
                columns: self.num_angles(),
                angles: angles.len(),
            });
        }
        Ok(())
    }

    /// Copy of the sinogram with additive Gaussian detector noise.
    pub fn with_gaussian_noise(&self, std_dev: f64, seed: u64) -> Result<Self> {
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(ReconError::InvalidNoise(std_dev));
        }
        if std_dev == 0.0 {
            return Ok(self.clone());
        }
        let normal = Normal::new(0.0, std_dev).map_err(|_| ReconError::InvalidNoise(std_dev))?;
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Array2::random_using(self.data.raw_dim(), normal, &mut rng);
        Ok(Self {
            data: &self.data + &noise,
            image_shape: self.image_shape,
        })
    }
}
