//! 2D parallel-beam CT reconstruction.
//!
//! Forward projection of an image into a sinogram, and two inverse methods:
//! filtered back-projection (FBP) and the iterative SART solver.
//!
//! ```
//! use ct_recon::{forward_project, phantom, reconstruct_fbp, AngleSequence};
//!
//! let image = phantom::shepp_logan(32);
//! let angles = AngleSequence::evenly_spaced(180.0, 32).unwrap();
//! let sinogram = forward_project(image.view(), &angles).unwrap();
//! let recon = reconstruct_fbp(&sinogram, &angles, "shepp-logan").unwrap();
//! assert_eq!(recon.dim(), (32, 32));
//! ```

pub mod angles;
pub mod error;
pub mod fbp;
pub mod filters;
pub mod geometry;
pub mod metrics;
pub mod phantom;
pub mod pipeline;
pub mod radon;
pub mod rescale;
pub mod sart;
pub mod sinogram;

pub use angles::AngleSequence;
pub use error::{ErrorKind, ReconError, Result};
pub use fbp::{backproject, reconstruct_fbp, reconstruct_fbp_with};
pub use filters::FilterKind;
pub use pipeline::{run, DetectorNoise, Method, ReconParams, RunOutput};
pub use radon::forward_project;
pub use rescale::rescale;
pub use sart::{reconstruct_sart, reconstruct_sart_with, SartConfig};
pub use sinogram::Sinogram;
