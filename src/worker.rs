//! Render worker: one long-lived browser session draining the shared queue.
//!
//! Loop: dequeue → prepare output path → navigate → wait for readiness →
//! capture → write file → record result. Every per-job error is converted
//! into a `Failed` result at this boundary; nothing a single page does can
//! take down the worker or the pool. Sessions are recycled after a fixed
//! number of jobs to bound browser memory growth.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::geometry::PageGeometry;
use crate::job::{RenderJob, RenderResult};
use crate::progress::ProgressCallback;
use crate::queue::{JobQueue, QueueItem};
use crate::session::{PageSession, ReadyOutcome, SessionLauncher};
use crate::Result;

pub(crate) struct WorkerContext<L> {
    pub id: usize,
    pub queue: Arc<JobQueue>,
    pub launcher: Arc<L>,
    pub geometry: PageGeometry,
    pub recycle_threshold: usize,
    pub dequeue_poll: Duration,
    pub cancel: CancellationToken,
    pub progress: Option<ProgressCallback>,
}

/// Runs one worker to completion, returning the results it produced.
///
/// A worker that cannot construct its initial session (or a recycle
/// replacement) exits without consuming a sentinel; the coordinator's drain
/// accounting covers the jobs it never took.
pub(crate) async fn run_worker<L: SessionLauncher>(ctx: WorkerContext<L>) -> Vec<RenderResult> {
    let mut results = Vec::new();
    log(&ctx.progress, &format!("worker {} starting", ctx.id));

    let mut session = match ctx.launcher.launch().await {
        Ok(session) => session,
        Err(err) => {
            log(
                &ctx.progress,
                &format!("worker {} could not start a browser session: {err}", ctx.id),
            );
            return results;
        }
    };

    let mut processed = 0usize;
    loop {
        if ctx.cancel.is_cancelled() {
            log(&ctx.progress, &format!("worker {} stopping: run cancelled", ctx.id));
            break;
        }

        let item = match ctx.queue.dequeue(ctx.dequeue_poll).await {
            Some(item) => item,
            // Timeout tick: loop back and re-check the cancellation flag.
            None => continue,
        };
        let job = match item {
            QueueItem::Sentinel => break,
            QueueItem::Job(job) => job,
        };

        let started = Instant::now();
        let result = match render_one(&mut session, &job, &ctx.geometry, &ctx.progress).await {
            Ok(()) => RenderResult::success(job, started.elapsed()),
            Err(err) => {
                log(
                    &ctx.progress,
                    &format!("worker {}: {} failed: {err}", ctx.id, job.source_url),
                );
                RenderResult::failed(job, started.elapsed(), err.to_string())
            }
        };
        results.push(result);
        ctx.queue.mark_done();
        processed += 1;

        if ctx.recycle_threshold > 0 && processed % ctx.recycle_threshold == 0 {
            log(
                &ctx.progress,
                &format!(
                    "worker {} recycling its session after {} jobs",
                    ctx.id, processed
                ),
            );
            session.close().await;
            session = match ctx.launcher.launch().await {
                Ok(fresh) => fresh,
                Err(err) => {
                    log(
                        &ctx.progress,
                        &format!(
                            "worker {} could not relaunch its session, exiting: {err}",
                            ctx.id
                        ),
                    );
                    return results;
                }
            };
        }
    }

    session.close().await;
    log(
        &ctx.progress,
        &format!("worker {} finished after {} jobs", ctx.id, processed),
    );
    results
}

async fn render_one<S: PageSession>(
    session: &mut S,
    job: &RenderJob,
    geometry: &PageGeometry,
    progress: &Option<ProgressCallback>,
) -> Result<()> {
    prepare_output_path(&job.output_path)?;

    session.navigate(&job.source_url).await?;
    if session.wait_until_ready().await? == ReadyOutcome::WaitExpired {
        log(
            progress,
            &format!(
                "{}: readiness wait expired, capturing anyway",
                job.source_url
            ),
        );
    }

    let bytes = session.capture_pdf(geometry).await?;
    if let Err(err) = tokio::fs::write(&job.output_path, &bytes).await {
        // Do not leave a partial file behind a reported failure.
        let _ = tokio::fs::remove_file(&job.output_path).await;
        return Err(err.into());
    }
    Ok(())
}

/// Creates the output's parent directory and removes any stale file, so a
/// failed capture never leaves a prior run's artifact at the path.
fn prepare_output_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

fn log(progress: &Option<ProgressCallback>, message: &str) {
    if let Some(cb) = progress {
        cb(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PagePressError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeState {
        launches: AtomicUsize,
        closes: AtomicUsize,
        rendered: Mutex<Vec<String>>,
    }

    struct FakeLauncher {
        state: Arc<FakeState>,
    }

    struct FakeSession {
        state: Arc<FakeState>,
        url: Option<String>,
    }

    #[async_trait]
    impl SessionLauncher for FakeLauncher {
        type Session = FakeSession;

        async fn launch(&self) -> crate::Result<FakeSession> {
            self.state.launches.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession {
                state: self.state.clone(),
                url: None,
            })
        }
    }

    #[async_trait]
    impl PageSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> crate::Result<()> {
            if url.contains("unreachable") {
                return Err(PagePressError::navigation(format!("{url}: refused")));
            }
            self.url = Some(url.to_string());
            Ok(())
        }

        async fn wait_until_ready(&mut self) -> crate::Result<ReadyOutcome> {
            Ok(ReadyOutcome::Settled)
        }

        async fn capture_pdf(&mut self, _geometry: &PageGeometry) -> crate::Result<Vec<u8>> {
            let url = self.url.clone().expect("navigate first");
            self.state.rendered.lock().unwrap().push(url);
            Ok(b"%PDF-1.4 fake\n%%EOF\n".to_vec())
        }

        async fn close(&mut self) {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn context(
        state: &Arc<FakeState>,
        queue: &Arc<JobQueue>,
        recycle_threshold: usize,
    ) -> WorkerContext<FakeLauncher> {
        WorkerContext {
            id: 0,
            queue: queue.clone(),
            launcher: Arc::new(FakeLauncher {
                state: state.clone(),
            }),
            geometry: PageGeometry::default(),
            recycle_threshold,
            dequeue_poll: Duration::from_millis(20),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    fn enqueue_jobs(queue: &JobQueue, dir: &Path, count: usize) {
        for n in 0..count {
            queue.enqueue(QueueItem::Job(RenderJob::new(
                format!("http://localhost:8000/page-{n}/"),
                dir.join(format!("page-{n}.pdf")),
            )));
        }
    }

    #[tokio::test]
    async fn worker_processes_jobs_until_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(FakeState::default());
        let queue = Arc::new(JobQueue::new());
        enqueue_jobs(&queue, dir.path(), 3);
        queue.enqueue(QueueItem::Sentinel);

        let results = run_worker(context(&state, &queue, 50)).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_success()));
        assert!(queue.is_drained());
        for result in &results {
            assert!(result.job.output_path.exists());
        }
        // One session for the whole run, closed at shutdown.
        assert_eq!(state.launches.load(Ordering::SeqCst), 1);
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn worker_recycles_session_at_threshold_multiples() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(FakeState::default());
        let queue = Arc::new(JobQueue::new());
        enqueue_jobs(&queue, dir.path(), 5);
        queue.enqueue(QueueItem::Sentinel);

        let results = run_worker(context(&state, &queue, 2)).await;

        assert_eq!(results.len(), 5);
        // Recycled after jobs 2 and 4: three launches, two recycle closes plus
        // the shutdown close.
        assert_eq!(state.launches.load(Ordering::SeqCst), 3);
        assert_eq!(state.closes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn one_failed_job_does_not_stop_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(FakeState::default());
        let queue = Arc::new(JobQueue::new());
        queue.enqueue(QueueItem::Job(RenderJob::new(
            "http://localhost:8000/ok-1/",
            dir.path().join("ok-1.pdf"),
        )));
        queue.enqueue(QueueItem::Job(RenderJob::new(
            "http://unreachable.localhost/",
            dir.path().join("bad.pdf"),
        )));
        queue.enqueue(QueueItem::Job(RenderJob::new(
            "http://localhost:8000/ok-2/",
            dir.path().join("ok-2.pdf"),
        )));
        queue.enqueue(QueueItem::Sentinel);

        let results = run_worker(context(&state, &queue, 50)).await;

        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].job.source_url.contains("unreachable"));
        assert!(failed[0].error.as_deref().unwrap().contains("refused"));
        assert!(dir.path().join("ok-1.pdf").exists());
        assert!(dir.path().join("ok-2.pdf").exists());
        assert!(!dir.path().join("bad.pdf").exists());
    }

    #[tokio::test]
    async fn stale_output_is_removed_before_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("page.pdf");
        std::fs::write(&stale, b"stale bytes from an earlier run").unwrap();

        let state = Arc::new(FakeState::default());
        let queue = Arc::new(JobQueue::new());
        queue.enqueue(QueueItem::Job(RenderJob::new(
            "http://unreachable.localhost/page/",
            stale.clone(),
        )));
        queue.enqueue(QueueItem::Sentinel);

        let results = run_worker(context(&state, &queue, 50)).await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
        assert!(
            !stale.exists(),
            "failed capture must not leave the stale file behind"
        );
    }

    #[tokio::test]
    async fn cancelled_worker_exits_without_consuming_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(FakeState::default());
        let queue = Arc::new(JobQueue::new());
        enqueue_jobs(&queue, dir.path(), 2);

        let ctx = context(&state, &queue, 50);
        ctx.cancel.cancel();
        let results = run_worker(ctx).await;

        assert!(results.is_empty());
        assert_eq!(queue.open_jobs(), 2);
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
    }
}
