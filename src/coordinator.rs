//! Request coordination: deduplication, bounded concurrency, batch driving.
//!
//! The coordinator is the public entry point of the pipeline. Concurrent
//! requests for the same file coalesce onto a single job through one shared
//! waiter map covering both queued and dispatched jobs, so every caller
//! settles with the identical result. Distinct files flow through a FIFO
//! backlog drained up to a global concurrency limit.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::media::{MediaDescriptor, MediaKind};
use crate::render::PreviewRenderer;

/// A caller waiting on a job's settle.
type Waiter = oneshot::Sender<Result<Option<String>>>;

/// One unit of underlying work; all callers for the same path attach here,
/// whether the job is still queued or already dispatched.
struct PendingJob {
    kind: MediaKind,
    mtime: i64,
    waiters: Vec<Waiter>,
}

struct CoordinatorState {
    /// Shared completion signal per path, alive from enqueue to settle.
    jobs: HashMap<String, PendingJob>,
    /// Paths queued but not yet dispatched, in arrival order.
    backlog: VecDeque<String>,
    /// Number of currently dispatched generation tasks.
    active: usize,
}

struct Inner {
    cache: Arc<CacheStore>,
    renderer: Arc<PreviewRenderer>,
    state: Mutex<CoordinatorState>,
    concurrency_limit: usize,
}

/// Public entry point for preview generation. Cheap to clone; all clones
/// share the same queue, active set, and cache.
#[derive(Clone)]
pub struct RequestCoordinator {
    inner: Arc<Inner>,
}

impl RequestCoordinator {
    /// Create a coordinator over shared cache and renderer.
    pub fn new(
        cache: Arc<CacheStore>,
        renderer: Arc<PreviewRenderer>,
        concurrency_limit: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                renderer,
                state: Mutex::new(CoordinatorState {
                    jobs: HashMap::new(),
                    backlog: VecDeque::new(),
                    active: 0,
                }),
                concurrency_limit: concurrency_limit.max(1),
            }),
        }
    }

    /// Request the preview for one file.
    ///
    /// Fast path: a fresh memory-tier entry resolves immediately. Otherwise
    /// the caller attaches to the path's job, creating and queueing it if
    /// absent, and awaits the shared settle.
    pub async fn request(
        &self,
        path: &Path,
        kind: MediaKind,
        mtime: i64,
    ) -> Result<Option<String>> {
        let key = path.to_string_lossy().into_owned();

        if let Some(entry) = self.inner.cache.get_memory(&key) {
            if entry.is_fresh(mtime) {
                return Ok(Some(entry.data_url));
            }
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.inner.state.lock();
            match state.jobs.entry(key.clone()) {
                Entry::Occupied(mut job) => {
                    debug!(path = %key, "coalescing onto in-flight preview job");
                    job.get_mut().waiters.push(tx);
                }
                Entry::Vacant(slot) => {
                    slot.insert(PendingJob {
                        kind,
                        mtime,
                        waiters: vec![tx],
                    });
                    state.backlog.push_back(key);
                }
            }
        }

        self.drain();

        rx.await
            .map_err(|_| Error::internal("preview job dropped without settling"))?
    }

    /// Synchronous memory-tier lookup; never triggers generation.
    pub fn preview_data_url(&self, path: &Path) -> Option<String> {
        self.inner
            .cache
            .get_memory(&path.to_string_lossy())
            .map(|entry| entry.data_url)
    }

    /// Regenerate previews for a whole file listing.
    ///
    /// Clears both cache tiers first so stale entries cannot short-circuit
    /// fresh work, then requests each non-directory file with a recognized
    /// kind sequentially, reporting `(current, total)` after each settle.
    /// Per-file failures are logged and do not stop the batch.
    pub async fn generate_all<F>(&self, files: &[MediaDescriptor], mut on_progress: F) -> Result<()>
    where
        F: FnMut(usize, usize),
    {
        self.inner.cache.clear()?;

        let eligible: Vec<&MediaDescriptor> = files
            .iter()
            .filter(|f| !f.is_dir && f.kind.is_some())
            .collect();
        let total = eligible.len();
        info!(total, "regenerating previews");

        for (i, file) in eligible.into_iter().enumerate() {
            let Some(kind) = file.kind else { continue };
            if let Err(err) = self.request(&file.path, kind, file.mtime).await {
                warn!(
                    path = %file.path.display(),
                    error = %err,
                    "batch preview failed"
                );
            }
            on_progress(i + 1, total);
        }

        Ok(())
    }

    /// Dispatch queued jobs while capacity remains.
    ///
    /// Fire-and-forget from the caller's perspective: each dispatched task
    /// settles its job, then drains again so the backlog keeps flowing as
    /// capacity frees up.
    fn drain(&self) {
        loop {
            let next = {
                let mut state = self.inner.state.lock();
                if state.active >= self.inner.concurrency_limit {
                    return;
                }
                let Some(key) = state.backlog.pop_front() else {
                    return;
                };
                let job = state.jobs.get(&key).map(|job| (job.kind, job.mtime));
                match job {
                    Some((kind, mtime)) => {
                        state.active += 1;
                        Some((key, kind, mtime))
                    }
                    None => None,
                }
            };

            let Some((key, kind, mtime)) = next else {
                continue;
            };

            let this = self.clone();
            tokio::spawn(async move {
                let render = this.inner.renderer.render(Path::new(&key), kind, mtime);
                // A panicking render task must still settle its waiters and
                // release its concurrency slot.
                let result = match AssertUnwindSafe(render).catch_unwind().await {
                    Ok(result) => result,
                    Err(_) => Err(Error::internal("preview task panicked")),
                };
                if let Err(err) = &result {
                    warn!(path = %key, error = %err, "preview job failed");
                }
                this.settle(&key, result);
            });
        }
    }

    /// Remove the job, fan the result out to every waiter identically, and
    /// resume draining.
    fn settle(&self, key: &str, result: Result<Option<String>>) {
        let waiters = {
            let mut state = self.inner.state.lock();
            state.active -= 1;
            state
                .jobs
                .remove(key)
                .map(|job| job.waiters)
                .unwrap_or_default()
        };

        for waiter in waiters {
            // A dropped receiver only means that caller went away.
            let _ = waiter.send(result.clone());
        }

        self.drain();
    }
}
