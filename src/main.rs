use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reel_compositor::{Config, ReelError, RenderEngine, RenderJob};

#[derive(Parser)]
#[command(
    name = "reel-compositor",
    version,
    about = "Turn still images into a short video reel",
    long_about = "Reel-Compositor renders a project of still images, each with its own filters, caption and duration, into one video with optional background music."
)]
struct Cli {
    /// Project file describing images, settings and audio (TOML)
    #[arg(short, long)]
    project: PathBuf,

    /// Output video path (or PNG path with --frame)
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only build the frame of this image index and save it as PNG
    #[arg(short, long)]
    frame: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Reel-Compositor v{}", env!("CARGO_PKG_VERSION"));
    info!("Project: {:?}", cli.project);
    info!("Output: {:?}", cli.output);

    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(report)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let job = RenderJob::from_file(&cli.project).map_err(report)?;
    let engine = RenderEngine::new(config);

    if let Some(index) = cli.frame {
        engine
            .render_frame(&job, index, &cli.output)
            .map_err(report)
            .with_context(|| format!("building frame {}", index))?;
        info!("Frame {} saved to {:?}", index, cli.output);
        return Ok(());
    }

    let last_decile = AtomicU32::new(0);
    let progress = |fraction: f32| {
        let decile = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u32;
        if decile > last_decile.fetch_max(decile, Ordering::Relaxed) {
            info!("Progress: {}%", decile * 10);
        }
    };

    let output = engine
        .render(&job, &cli.output, &progress)
        .await
        .map_err(report)
        .with_context(|| format!("rendering {:?}", cli.output))?;

    info!(
        "Render complete! {:.2}s, {} frames saved to {:?}",
        output.duration, output.frame_count, output.path
    );
    Ok(())
}

/// Log the user-facing explanation before handing the error to anyhow
fn report(err: ReelError) -> anyhow::Error {
    if err.is_user_correctable() {
        error!("{}", err.user_message());
    }
    anyhow::Error::new(err)
}
