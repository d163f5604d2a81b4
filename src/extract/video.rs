//! Video probing and frame capture via external ffmpeg tools.
//!
//! Seeking and decoding arbitrary video containers is delegated to
//! `ffprobe`/`ffmpeg`, discovered on `PATH` at construction. Environments
//! without the tools get [`UnavailableCapture`], which fails fast with a
//! distinct unsupported error instead of breaking mid-pipeline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbaImage;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Capability interface for probing video duration and capturing one frame
/// at a timestamp.
#[async_trait]
pub trait VideoCapture: Send + Sync {
    /// Duration of the video in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Decode a single frame at `timestamp` seconds.
    async fn capture_frame(&self, path: &Path, timestamp: f64) -> Result<RgbaImage>;
}

/// Production capture backend shelling out to ffprobe/ffmpeg.
pub struct FfmpegCapture {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegCapture {
    /// Locate ffmpeg and ffprobe on `PATH`.
    pub fn discover() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg")
            .map_err(|_| Error::unsupported("ffmpeg not found on PATH"))?;
        let ffprobe = which::which("ffprobe")
            .map_err(|_| Error::unsupported("ffprobe not found on PATH"))?;
        Ok(Self { ffmpeg, ffprobe })
    }
}

#[async_trait]
impl VideoCapture for FfmpegCapture {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::probe(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::probe(format!("unparseable duration for {}", path.display())))
    }

    async fn capture_frame(&self, path: &Path, timestamp: f64) -> Result<RgbaImage> {
        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-ss", &format!("{timestamp:.3}")])
            .arg("-i")
            .arg(path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::decode(format!(
                "ffmpeg frame capture failed at {:.3}s: {}",
                timestamp,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(Error::decode(format!(
                "ffmpeg produced no frame data at {timestamp:.3}s"
            )));
        }

        Ok(image::load_from_memory(&output.stdout)?.to_rgba8())
    }
}

/// Backend used when ffmpeg is not installed; every call fails fast.
pub struct UnavailableCapture;

#[async_trait]
impl VideoCapture for UnavailableCapture {
    async fn probe_duration(&self, _path: &Path) -> Result<f64> {
        Err(Error::unsupported("video capture requires ffmpeg"))
    }

    async fn capture_frame(&self, _path: &Path, _timestamp: f64) -> Result<RgbaImage> {
        Err(Error::unsupported("video capture requires ffmpeg"))
    }
}
