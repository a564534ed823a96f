//! Pool coordinator: enqueue jobs, drive a fixed set of workers, aggregate
//! results.
//!
//! The worker count is the admission-control knob: every worker holds a
//! full browser process, so concurrency stays small and fixed for the run.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::geometry::PageGeometry;
use crate::job::{validate_jobs, RenderJob, RenderResult};
use crate::progress::ProgressCallback;
use crate::queue::{JobQueue, QueueItem};
use crate::session::SessionLauncher;
use crate::worker::{run_worker, WorkerContext};
use crate::Result;

/// Default number of concurrent browser workers.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Default jobs per session before it is recycled.
pub const DEFAULT_RECYCLE_THRESHOLD: usize = 50;

/// Default dequeue poll interval; bounds how long a cancellation request can
/// go unnoticed by an idle worker.
pub const DEFAULT_DEQUEUE_POLL: Duration = Duration::from_millis(500);

/// Sizing and per-job settings for a pool run.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub worker_count: usize,
    pub recycle_threshold: usize,
    pub dequeue_poll: Duration,
    pub geometry: PageGeometry,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            recycle_threshold: DEFAULT_RECYCLE_THRESHOLD,
            dequeue_poll: DEFAULT_DEQUEUE_POLL,
            geometry: PageGeometry::default(),
        }
    }
}

/// Runs batches of render jobs over a fixed pool of browser workers.
pub struct RenderPool<L> {
    options: PoolOptions,
    launcher: Arc<L>,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl<L: SessionLauncher> RenderPool<L> {
    pub fn new(launcher: L, options: PoolOptions) -> Self {
        Self {
            options,
            launcher: Arc::new(launcher),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token for cooperative cancellation; workers stop consuming jobs at
    /// their next dequeue tick, without interrupting in-flight browser calls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Renders every job, returning exactly one result per job.
    ///
    /// Output paths are pre-cleaned so a previous run's artifact can never be
    /// mistaken for this run's success. Jobs left in the queue when no worker
    /// remains (startup failure or cancellation) are reported as failed
    /// rather than hanging the drain.
    pub async fn run(&self, jobs: Vec<RenderJob>) -> Result<Vec<RenderResult>> {
        validate_jobs(&jobs)?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        pre_clean(&jobs)?;

        let queue = Arc::new(JobQueue::new());
        let total = jobs.len();
        for job in jobs {
            queue.enqueue(QueueItem::Job(job));
        }
        self.log(&format!(
            "rendering {} page(s) with {} worker(s)",
            total,
            self.options.worker_count.max(1)
        ));

        let worker_count = self.options.worker_count.max(1);
        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            workers.spawn(run_worker(WorkerContext {
                id,
                queue: queue.clone(),
                launcher: self.launcher.clone(),
                geometry: self.options.geometry,
                recycle_threshold: self.options.recycle_threshold,
                dequeue_poll: self.options.dequeue_poll,
                cancel: self.cancel.clone(),
                progress: self.progress.clone(),
            }));
        }

        let mut results: Vec<RenderResult> = Vec::with_capacity(total);

        // Wait for the queue to drain. A worker finishing in this phase died
        // before shutdown (it never got a sentinel); when none are left the
        // remaining jobs can never be processed.
        let mut alive = worker_count;
        while alive > 0 {
            tokio::select! {
                _ = queue.wait_drained() => break,
                joined = workers.join_next() => {
                    alive -= 1;
                    absorb(&mut results, joined);
                }
            }
        }

        // Account for jobs no surviving worker will ever take.
        let leftover_reason = if self.cancel.is_cancelled() {
            "run cancelled"
        } else {
            "no render workers available"
        };
        while let Some(item) = queue.try_dequeue() {
            if let QueueItem::Job(job) = item {
                results.push(RenderResult::failed(job, Duration::ZERO, leftover_reason));
                queue.mark_done();
            }
        }

        // Shutdown: one sentinel per worker, enqueued only after drain.
        for _ in 0..worker_count {
            queue.enqueue(QueueItem::Sentinel);
        }
        while let Some(joined) = workers.join_next().await {
            absorb(&mut results, Some(joined));
        }

        self.log(&format!(
            "run complete: {}/{} page(s) rendered",
            results.iter().filter(|r| r.is_success()).count(),
            total
        ));
        Ok(results)
    }

    fn log(&self, message: &str) {
        if let Some(cb) = &self.progress {
            cb(message);
        }
    }
}

fn absorb(
    results: &mut Vec<RenderResult>,
    joined: Option<std::result::Result<Vec<RenderResult>, tokio::task::JoinError>>,
) {
    if let Some(Ok(mut worker_results)) = joined {
        results.append(&mut worker_results);
    }
}

/// Deletes pre-existing output files so re-runs are idempotent.
fn pre_clean(jobs: &[RenderJob]) -> Result<()> {
    for job in jobs {
        if job.output_path.exists() {
            std::fs::remove_file(&job.output_path)?;
        }
    }
    Ok(())
}
