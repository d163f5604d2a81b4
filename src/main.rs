mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use mediastrip::cache::CacheStore;
use mediastrip::config::{self, Config};
use mediastrip::coordinator::RequestCoordinator;
use mediastrip::db::init_pool;
use mediastrip::extract::{FfmpegCapture, MediaFrameExtractor, UnavailableCapture, VideoCapture};
use mediastrip::filmstrip::FilmstripCompositor;
use mediastrip::media::MediaKind;
use mediastrip::render::PreviewRenderer;
use mediastrip::scanner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { dir } => generate(&config, &dir).await,
        Commands::Preview { file, raw } => preview(&config, &file, raw).await,
        Commands::CheckTools => check_tools(),
    }
}

fn build_coordinator(config: &Config) -> Result<RequestCoordinator> {
    let pool = init_pool(&config.db_path.to_string_lossy())?;
    let cache = Arc::new(CacheStore::new(pool, config.memory_capacity));

    let capture: Arc<dyn VideoCapture> = match FfmpegCapture::discover() {
        Ok(capture) => Arc::new(capture),
        Err(err) => {
            tracing::warn!(error = %err, "video previews disabled");
            Arc::new(UnavailableCapture)
        }
    };

    let extractor = Arc::new(MediaFrameExtractor::new(capture, config.frames_per_strip));
    let renderer = Arc::new(PreviewRenderer::new(
        Arc::clone(&cache),
        extractor,
        FilmstripCompositor::new(config),
    ));

    Ok(RequestCoordinator::new(
        cache,
        renderer,
        config.concurrency_limit,
    ))
}

async fn generate(config: &Config, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let coordinator = build_coordinator(config)?;
    let files = scanner::scan_directory(dir)?;

    coordinator
        .generate_all(&files, |current, total| {
            println!("[{current}/{total}] previews generated");
        })
        .await
        .context("batch preview generation failed")?;

    Ok(())
}

async fn preview(config: &Config, file: &Path, raw: bool) -> Result<()> {
    let Some(kind) = MediaKind::from_path(file) else {
        bail!("unrecognized media kind: {}", file.display());
    };
    let metadata = std::fs::metadata(file)
        .with_context(|| format!("cannot stat {}", file.display()))?;
    let mtime = scanner::unix_mtime(&metadata);

    let coordinator = build_coordinator(config)?;
    let data_url = coordinator
        .request(file, kind, mtime)
        .await
        .context("preview generation failed")?;

    match data_url {
        Some(url) if raw => println!("{url}"),
        Some(url) => println!("{} ({}, {} bytes encoded)", file.display(), kind, url.len()),
        None => println!("{}: no preview", file.display()),
    }
    Ok(())
}

fn check_tools() -> Result<()> {
    match FfmpegCapture::discover() {
        Ok(_) => println!("ffmpeg/ffprobe: found"),
        Err(err) => println!("ffmpeg/ffprobe: missing ({err}) - video previews disabled"),
    }
    println!("image decoding: built-in (still images and GIF animations)");
    Ok(())
}
