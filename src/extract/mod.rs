//! Format-specific frame extraction.
//!
//! Pulls one or more raw frames from a media file: the whole image for still
//! images, evenly spaced timestamps for videos, evenly spaced frame indices
//! for animated images. Extraction returns full-size frames; scaling and
//! cropping belong to the compositor.

pub mod animated;
pub mod video;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use tracing::warn;

use crate::error::{Error, Result};

pub use video::{FfmpegCapture, UnavailableCapture, VideoCapture};

/// Fraction of the duration the last video sample is clamped to, avoiding
/// end-of-stream decode failures.
const LAST_SAMPLE_CLAMP: f64 = 0.95;

/// Frame extraction interface, one method per media kind.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Decode a still image in full.
    async fn load_image(&self, path: &Path) -> Result<RgbaImage>;

    /// Sample frames at evenly spaced timestamps across the video.
    async fn sample_video(&self, path: &Path) -> Result<Vec<RgbaImage>>;

    /// Sample frames at evenly spaced indices across an animated image.
    async fn sample_animated(&self, path: &Path) -> Result<Vec<RgbaImage>>;
}

/// Production extractor: `image` crate decoding plus a pluggable video
/// capture backend.
pub struct MediaFrameExtractor {
    capture: Arc<dyn VideoCapture>,
    frame_count: usize,
}

impl MediaFrameExtractor {
    /// Create an extractor sampling `frame_count` frames per strip.
    pub fn new(capture: Arc<dyn VideoCapture>, frame_count: usize) -> Self {
        Self {
            capture,
            frame_count: frame_count.max(1),
        }
    }
}

#[async_trait]
impl FrameExtractor for MediaFrameExtractor {
    async fn load_image(&self, path: &Path) -> Result<RgbaImage> {
        let bytes = tokio::fs::read(path).await?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    async fn sample_video(&self, path: &Path) -> Result<Vec<RgbaImage>> {
        // Duration is required; a probe failure aborts extraction outright.
        let duration = self.capture.probe_duration(path).await?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::probe(format!(
                "invalid duration {duration} for {}",
                path.display()
            )));
        }

        let mut frames = Vec::with_capacity(self.frame_count);
        for timestamp in sample_timestamps(duration, self.frame_count) {
            match self.capture.capture_frame(path, timestamp).await {
                Ok(frame) => frames.push(frame),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        timestamp,
                        error = %err,
                        "skipping video frame"
                    );
                }
            }
        }

        if frames.is_empty() {
            return Err(Error::decode(format!(
                "no frames captured from {}",
                path.display()
            )));
        }
        Ok(frames)
    }

    async fn sample_animated(&self, path: &Path) -> Result<Vec<RgbaImage>> {
        let bytes = tokio::fs::read(path).await?;
        let all = animated::decode_frames(path, bytes)?;
        Ok(animated::sample_indices(all.len(), self.frame_count)
            .into_iter()
            .map(|i| all[i].clone())
            .collect())
    }
}

/// Evenly spaced timestamps across `[0, duration]`, with the last sample
/// clamped to 95% of the duration.
fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.0
            } else {
                duration * i as f64 / (count - 1) as f64
            };
            t.min(duration * LAST_SAMPLE_CLAMP)
        })
        .collect()
}
