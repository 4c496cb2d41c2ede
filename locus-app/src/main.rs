//! Locus
//!
//! Batch step that turns per-frame tracked detections into one 3D point per
//! track, using camera poses and intrinsics from a COLMAP text model.
//!
//! Outputs:
//! - Point cloud PLY (always)
//! - Box mesh and wireframe PLYs (optional)
//! - JSON label sidecar (optional)

mod args;

use args::{Args, ArgsError};
use clap::Parser;
use locus_solve::PipelineError;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ArgsError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

fn run(args: Args) -> Result<(), AppError> {
    let config = args.into_config()?;
    info!(
        "Locating tracks from {} with poses {}",
        config.detections.display(),
        config.images.display()
    );

    let summary = locus_solve::run(&config)?;
    let stats = summary.stats;
    info!(
        "{} detections, {} tracks seen, {} located ({} dropped before triangulation)",
        stats.detections,
        stats.tracks_seen,
        summary.points.len(),
        stats.tracks_too_short
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
