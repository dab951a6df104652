use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconError>;

/// Broad classification of a [`ReconError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A parameter value is outside its accepted domain.
    Configuration,
    /// Array dimensions disagree with each other.
    ShapeMismatch,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReconError {
    #[error("scale factor must lie in (0, 1], got {0}")]
    InvalidScaleFactor(f64),
    #[error("unknown filter '{0}' (expected ramp, shepp-logan, cosine, hamming, hann or none)")]
    UnknownFilter(String),
    #[error("iteration count must be positive")]
    InvalidIterations,
    #[error("relaxation must be a positive finite number, got {0}")]
    InvalidRelaxation(f64),
    #[error("clip range is empty: min {min} > max {max}")]
    InvalidClip { min: f64, max: f64 },
    #[error("angle sequence is empty")]
    EmptyAngles,
    #[error("angle {0} is outside [0, 180] degrees")]
    InvalidAngle(f64),
    #[error("max angle must lie in (0, 180], got {0}")]
    InvalidMaxAngle(f64),
    #[error("noise standard deviation must be finite and non-negative, got {0}")]
    InvalidNoise(f64),
    #[error("image has no pixels")]
    EmptyImage,
    #[error("sinogram has {columns} columns but {angles} angles were given")]
    SinogramAngleMismatch { columns: usize, angles: usize },
    #[error("initial estimate has shape {found:?}, expected {expected:?}")]
    EstimateShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("sinogram has {found} detector bins, image shape {image_shape:?} needs {expected}")]
    DetectorMismatch {
        image_shape: (usize, usize),
        expected: usize,
        found: usize,
    },
}

impl ReconError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconError::SinogramAngleMismatch { .. }
            | ReconError::EstimateShapeMismatch { .. }
            | ReconError::DetectorMismatch { .. } => ErrorKind::ShapeMismatch,
            _ => ErrorKind::Configuration,
        }
    }
}
