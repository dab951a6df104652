use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use ct_recon::metrics::{nmse, psnr};
use ct_recon::{phantom, run, DetectorNoise, FilterKind, Method, ReconParams, SartConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    Fbp,
    Sart,
}

/// Simulate a parallel-beam CT scan of an image and reconstruct it.
///
/// The input is a 2D `.npy` array (f64 or f32, values roughly in [0, 1]).
/// Without `--input` a modified Shepp-Logan phantom is used. Parameters come
/// from `--config` (JSON) when given; individual flags override it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a 2D .npy image
    #[arg(long)]
    input: Option<PathBuf>,

    /// Side length of the built-in phantom used when no input is given
    #[arg(long, default_value_t = 256)]
    phantom_size: usize,

    /// JSON file with reconstruction parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rescale factor in (0, 1]
    #[arg(long)]
    scale: Option<f64>,

    /// Largest projection angle in degrees, in (0, 180]
    #[arg(long)]
    max_angle: Option<f64>,

    /// Reconstruction method
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// FBP filter: ramp, shepp-logan, cosine, hamming, hann or none
    #[arg(long)]
    filter: Option<String>,

    /// Number of SART sweeps
    #[arg(long)]
    iterations: Option<usize>,

    /// SART relaxation parameter
    #[arg(long)]
    relaxation: Option<f64>,

    /// Lower clamp for SART estimates
    #[arg(long)]
    clip_min: Option<f64>,

    /// Upper clamp for SART estimates
    #[arg(long)]
    clip_max: Option<f64>,

    /// Standard deviation of Gaussian noise added to the sinogram
    #[arg(long)]
    noise_std: Option<f64>,

    /// Seed for the detector noise
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output path for the reconstructed image (.npy)
    #[arg(long)]
    output: PathBuf,

    /// Optional output path for the sinogram (.npy)
    #[arg(long)]
    sinogram_out: Option<PathBuf>,

    /// Optional output path for a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    params: &'a ReconParams,
    input_shape: (usize, usize),
    image_shape: (usize, usize),
    angles: usize,
    detectors: usize,
    nmse: f64,
    psnr_db: f64,
    elapsed_ms: u64,
}

fn load_image(path: &Path) -> Result<Array2<f64>> {
    match read_npy::<_, Array2<f64>>(path) {
        Ok(image) => Ok(image),
        Err(_) => {
            let image: Array2<f32> = read_npy(path)
                .map_err(|e| anyhow::anyhow!("Failed to read 2D f64/f32 NPY {:?}: {}", path, e))?;
            Ok(image.mapv(f64::from))
        }
    }
}

fn load_params(args: &Args) -> Result<ReconParams> {
    let mut params = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config {:?}", path))?;
            serde_json::from_reader(file)
                .with_context(|| format!("Failed to parse config {:?}", path))?
        }
        None => ReconParams::default(),
    };

    if let Some(scale) = args.scale {
        params.scale = scale;
    }
    if let Some(max_angle) = args.max_angle {
        params.max_angle = max_angle;
    }
    match (args.method, params.method) {
        (Some(MethodArg::Sart), Method::Fbp { .. }) => {
            params.method = Method::Sart(SartConfig::default());
        }
        (Some(MethodArg::Fbp), Method::Sart(_)) => {
            params.method = Method::default();
        }
        _ => {}
    }

    match &mut params.method {
        Method::Fbp { filter } => {
            if let Some(name) = &args.filter {
                *filter = name.parse::<FilterKind>()?;
            }
            let sart_only = [
                args.iterations.is_some(),
                args.relaxation.is_some(),
                args.clip_min.is_some(),
                args.clip_max.is_some(),
            ];
            if sart_only.contains(&true) {
                bail!("--iterations, --relaxation, --clip-min and --clip-max only apply to --method sart");
            }
        }
        Method::Sart(config) => {
            if args.filter.is_some() {
                bail!("--filter only applies to --method fbp");
            }
            if let Some(iterations) = args.iterations {
                config.iterations = iterations;
            }
            if let Some(relaxation) = args.relaxation {
                config.relaxation = relaxation;
            }
            if args.clip_min.is_some() || args.clip_max.is_some() {
                config.clip = Some((
                    args.clip_min.unwrap_or(f64::NEG_INFINITY),
                    args.clip_max.unwrap_or(f64::INFINITY),
                ));
            }
        }
    }

    if let Some(std_dev) = args.noise_std {
        params.noise = Some(DetectorNoise {
            std_dev,
            seed: args.seed,
        });
    }

    params.validate()?;
    Ok(params)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let params = load_params(&args)?;

    // --- Image source: NPY file or built-in phantom ---
    let input = match &args.input {
        Some(path) => load_image(path)?,
        None => phantom::shepp_logan(args.phantom_size),
    };
    info!(
        shape = ?input.dim(),
        method = params.method.name(),
        scale = params.scale,
        max_angle = params.max_angle,
        "starting reconstruction"
    );

    // --- Rescale, project, reconstruct ---
    let start = Instant::now();
    let output = run(input.view(), &params)?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    // --- Save results as .npy ---
    write_npy(&args.output, &output.reconstruction)
        .map_err(|e| anyhow::anyhow!("Failed to write output NPY {:?}: {}", args.output, e))?;
    if let Some(path) = &args.sinogram_out {
        write_npy(path, &output.sinogram.data().to_owned())
            .map_err(|e| anyhow::anyhow!("Failed to write sinogram NPY {:?}: {}", path, e))?;
    }

    let report = Report {
        params: &params,
        input_shape: input.dim(),
        image_shape: output.image.dim(),
        angles: output.angles.len(),
        detectors: output.sinogram.detectors(),
        nmse: nmse(output.image.view(), output.reconstruction.view())?,
        psnr_db: psnr(output.image.view(), output.reconstruction.view(), 1.0)?,
        elapsed_ms,
    };
    info!(nmse = report.nmse, psnr_db = report.psnr_db, "reconstruction quality");
    if let Some(path) = &args.report {
        let file = File::create(path).with_context(|| format!("Failed to create report {:?}", path))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("Failed to write report {:?}", path))?;
    }

    println!("Reconstruction written to {:?}", args.output);

    Ok(())
}
