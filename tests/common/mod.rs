//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] wiring an in-memory durable tier, the real
//! cache/renderer/coordinator stack, and a [`StubExtractor`] that counts
//! extraction calls and tracks how many run concurrently.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use mediastrip::cache::CacheStore;
use mediastrip::config::Config;
use mediastrip::coordinator::RequestCoordinator;
use mediastrip::db::init_memory_pool;
use mediastrip::error::{Error, Result};
use mediastrip::extract::FrameExtractor;
use mediastrip::filmstrip::FilmstripCompositor;
use mediastrip::render::PreviewRenderer;

/// Counting, delaying stub standing in for real media decoding.
pub struct StubExtractor {
    delay: Duration,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl StubExtractor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    /// Make every extraction for `path` fail with a decode error.
    pub fn fail_for(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    /// Total number of extraction calls across all kinds.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of extractions observed running at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    async fn extract(&self, path: &Path, frames: usize) -> Result<Vec<RgbaImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        let key = path.to_string_lossy().into_owned();
        if self.failing.lock().contains(&key) {
            return Err(Error::decode(format!("stubbed failure for {key}")));
        }

        let shade = (key.len() % 200) as u8;
        Ok(vec![
            RgbaImage::from_pixel(32, 32, Rgba([shade, 90, 90, 255]));
            frames
        ])
    }
}

#[async_trait]
impl FrameExtractor for StubExtractor {
    async fn load_image(&self, path: &Path) -> Result<RgbaImage> {
        let mut frames = self.extract(path, 1).await?;
        Ok(frames.remove(0))
    }

    async fn sample_video(&self, path: &Path) -> Result<Vec<RgbaImage>> {
        self.extract(path, 5).await
    }

    async fn sample_animated(&self, path: &Path) -> Result<Vec<RgbaImage>> {
        self.extract(path, 5).await
    }
}

/// Full pipeline over an in-memory database and a stub extractor.
pub struct TestHarness {
    pub coordinator: RequestCoordinator,
    pub cache: Arc<CacheStore>,
    pub extractor: Arc<StubExtractor>,
    pub db: mediastrip::db::DbPool,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(10))
    }

    pub fn with_delay(delay: Duration) -> Self {
        let config = Config::default();
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let cache = Arc::new(CacheStore::new(db.clone(), config.memory_capacity));
        let extractor = Arc::new(StubExtractor::new(delay));

        let renderer = Arc::new(PreviewRenderer::new(
            Arc::clone(&cache),
            Arc::clone(&extractor) as Arc<dyn FrameExtractor>,
            FilmstripCompositor::new(&config),
        ));
        let coordinator =
            RequestCoordinator::new(Arc::clone(&cache), renderer, config.concurrency_limit);

        Self {
            coordinator,
            cache,
            extractor,
            db,
        }
    }
}
