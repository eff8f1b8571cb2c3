use clap::Parser;
use pose_pipeline::config::Configuration;
use pose_pipeline::coordinator::CoordinatorBuilder;
use pose_pipeline::error::AppError;
use pose_pipeline::pipeline::services::pose::OnnxModelLoader;
use pose_pipeline::pipeline::services::{FfmpegSampler, HttpFetcher};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Downloads a video, samples frames from it and writes per-frame body keypoints.
#[derive(Debug, Parser)]
#[command(name = "pose-pipeline", version, about)]
struct Cli {
    /// TOML configuration file (defaults to ./pose-pipeline.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video to download
    #[arg(long)]
    url: Option<String>,

    /// Directory holding the video, frames and results
    #[arg(short, long)]
    work_dir: Option<PathBuf>,

    /// Frames sampled per second of video
    #[arg(long)]
    fps: Option<f64>,

    /// ONNX pose model
    #[arg(short, long)]
    model: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let configuration = Configuration::load(cli.config.as_deref())?;

    let mut builder = CoordinatorBuilder::new(configuration.clone());
    if let Some(url) = cli.url {
        builder = builder.video_url(url);
    }
    if let Some(work_dir) = cli.work_dir {
        builder = builder.work_dir(work_dir);
    }
    if let Some(fps) = cli.fps {
        builder = builder.sampling_rate(fps);
    }
    let mut model = configuration.model.clone();
    if let Some(path) = cli.model {
        model.path = path.clone();
        builder = builder.model_path(path);
    }

    let mut coordinator = builder
        .fetcher(Box::new(HttpFetcher::new(configuration.fetch_timeout())?))
        .sampler(Box::new(FfmpegSampler::new(
            configuration.ffmpeg_path.clone(),
            configuration.transcode_timeout(),
        )))
        .model_loader(Box::new(OnnxModelLoader::new(model)))
        .build()?;

    coordinator.run().await?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let outcome = runtime.block_on(run(cli));
    // A timed-out inference may still be running on the blocking pool.
    runtime.shutdown_background();

    match outcome {
        Ok(()) => {
            tracing::info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
