//! Per-request preview rendering.
//!
//! Re-checks the cache authoritatively, dispatches to the extractor and
//! compositor by media kind, contains extraction/composition failures into a
//! cached placeholder, and writes the outcome back. Only durable-store
//! failures escape this layer.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore};
use crate::error::Result;
use crate::extract::FrameExtractor;
use crate::filmstrip::FilmstripCompositor;
use crate::media::MediaKind;

/// Orchestrates one preview generation end to end.
pub struct PreviewRenderer {
    cache: Arc<CacheStore>,
    extractor: Arc<dyn FrameExtractor>,
    compositor: FilmstripCompositor,
}

impl PreviewRenderer {
    /// Create a renderer over shared cache and extractor.
    pub fn new(
        cache: Arc<CacheStore>,
        extractor: Arc<dyn FrameExtractor>,
        compositor: FilmstripCompositor,
    ) -> Self {
        Self {
            cache,
            extractor,
            compositor,
        }
    }

    /// Produce the preview data URL for one file.
    ///
    /// Extraction or composition failures never escape: the result is then a
    /// placeholder, and either way the outcome is cached under (path, mtime)
    /// before returning, so a transient failure stays cached until the file's
    /// mtime changes. Cache I/O failures do propagate.
    pub async fn render(&self, path: &Path, kind: MediaKind, mtime: i64) -> Result<Option<String>> {
        let key = path.to_string_lossy().into_owned();

        // Authoritative check covering the durable tier, unlike the
        // coordinator's memory-only fast path.
        if let Some(entry) = self.cache.get(&key)? {
            if entry.is_fresh(mtime) {
                debug!(path = %key, "durable-tier preview still fresh");
                return Ok(Some(entry.data_url));
            }
        }

        let data_url = match self.generate(path, kind).await {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    path = %key,
                    kind = %kind,
                    error = %err,
                    "preview generation failed, caching placeholder"
                );
                self.compositor.placeholder()?
            }
        };

        self.cache.put(CacheEntry {
            file_path: key,
            data_url: data_url.clone(),
            mtime,
        })?;

        Ok(Some(data_url))
    }

    async fn generate(&self, path: &Path, kind: MediaKind) -> Result<String> {
        let frames = match kind {
            MediaKind::Image => vec![self.extractor.load_image(path).await?],
            MediaKind::Video => self.extractor.sample_video(path).await?,
            MediaKind::Animated => self.extractor.sample_animated(path).await?,
        };
        self.compositor.compose(&frames)
    }
}
