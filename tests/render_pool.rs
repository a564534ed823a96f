//! Pool integration tests against an in-memory session backend.
//!
//! The mock launcher counts session launches and closes so recycling and
//! shutdown behavior can be asserted without a browser.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pagepress_lib::{
    PageGeometry, PagePressError, PageSession, PoolOptions, ReadyOutcome, RenderJob, RenderPool,
    Result, SessionLauncher,
};

#[derive(Default)]
struct MockState {
    launches: AtomicUsize,
    closes: AtomicUsize,
    fail_all_launches: AtomicBool,
}

struct MockLauncher {
    state: Arc<MockState>,
}

struct MockSession {
    state: Arc<MockState>,
    url: Option<String>,
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    type Session = MockSession;

    async fn launch(&self) -> Result<MockSession> {
        if self.state.fail_all_launches.load(Ordering::SeqCst) {
            return Err(PagePressError::session("mock launch refused"));
        }
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            state: self.state.clone(),
            url: None,
        })
    }
}

#[async_trait]
impl PageSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if url.contains("unreachable") {
            return Err(PagePressError::navigation(format!(
                "{url}: connection refused"
            )));
        }
        self.url = Some(url.to_string());
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> Result<ReadyOutcome> {
        Ok(ReadyOutcome::Settled)
    }

    async fn capture_pdf(&mut self, _geometry: &PageGeometry) -> Result<Vec<u8>> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| PagePressError::capture("no page loaded"))?;
        if url.contains("badrender") {
            return Err(PagePressError::capture("renderer crashed"));
        }
        Ok(format!("%PDF-1.4\n% rendered from {url}\n%%EOF\n").into_bytes())
    }

    async fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn pool(state: &Arc<MockState>, workers: usize, recycle_threshold: usize) -> RenderPool<MockLauncher> {
    RenderPool::new(
        MockLauncher {
            state: state.clone(),
        },
        PoolOptions {
            worker_count: workers,
            recycle_threshold,
            dequeue_poll: Duration::from_millis(20),
            geometry: PageGeometry::default(),
        },
    )
}

fn jobs_in(dir: &Path, count: usize) -> Vec<RenderJob> {
    (0..count)
        .map(|n| {
            RenderJob::new(
                format!("http://localhost:8000/page-{n}/"),
                dir.join(format!("page-{n}.pdf")),
            )
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_job_appears_exactly_once_in_results() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    let jobs = jobs_in(dir.path(), 12);
    let expected: HashSet<_> = jobs.iter().map(|j| j.output_path.clone()).collect();

    let results = pool(&state, 3, 50).run(jobs).await.unwrap();

    assert_eq!(results.len(), 12);
    let seen: HashSet<_> = results.iter().map(|r| r.job.output_path.clone()).collect();
    assert_eq!(seen, expected, "no duplicates, no omissions");
    assert!(results.iter().all(|r| r.is_success()));
    for path in &expected {
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "output is a PDF");
        assert!(!bytes.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_jobs_two_workers_recycling_after_two() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    let jobs = jobs_in(dir.path(), 5);

    let results = pool(&state, 2, 2).run(jobs).await.unwrap();

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.is_success()));

    // However the two workers split five jobs, two recycles happen in total,
    // plus one shutdown close per worker.
    let closes = state.closes.load(Ordering::SeqCst);
    assert!(closes >= 4, "expected at least 4 session closes, got {closes}");
    assert_eq!(
        state.launches.load(Ordering::SeqCst),
        closes,
        "every launched session is closed exactly once"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_unreachable_page_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    let mut jobs = jobs_in(dir.path(), 6);
    jobs.push(RenderJob::new(
        "http://unreachable.localhost/page/",
        dir.path().join("unreachable.pdf"),
    ));

    let results = pool(&state, 2, 50).run(jobs).await.unwrap();

    assert_eq!(results.len(), 7);
    let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].job.source_url.contains("unreachable"));
    assert!(failed[0]
        .error
        .as_deref()
        .unwrap()
        .contains("connection refused"));
    assert_eq!(results.iter().filter(|r| r.is_success()).count(), 6);
    assert!(!dir.path().join("unreachable.pdf").exists());
}

#[tokio::test]
async fn failed_capture_never_leaves_a_stale_output() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("chapter.pdf");
    std::fs::write(&stale, b"contents from a previous run").unwrap();

    let state = Arc::new(MockState::default());
    let jobs = vec![RenderJob::new(
        "http://localhost:8000/badrender/",
        stale.clone(),
    )];

    let results = pool(&state, 1, 50).run(jobs).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].is_success());
    assert!(results[0].error.as_deref().unwrap().contains("renderer"));
    assert!(
        !stale.exists(),
        "pre-clean must remove the stale artifact even though the capture failed"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rerun_replaces_all_previous_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    let jobs = jobs_in(dir.path(), 4);

    let first = pool(&state, 2, 50).run(jobs.clone()).await.unwrap();
    assert_eq!(first.len(), 4);

    // Scribble over one output to simulate a partially stale cache.
    std::fs::write(dir.path().join("page-2.pdf"), b"junk").unwrap();

    let second = pool(&state, 2, 50).run(jobs).await.unwrap();
    assert_eq!(second.len(), 4);
    assert!(second.iter().all(|r| r.is_success()));
    for n in 0..4 {
        let bytes = std::fs::read(dir.path().join(format!("page-{n}.pdf"))).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "run 2 fully replaced run 1");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_closes_every_launched_session() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    let jobs = jobs_in(dir.path(), 4);

    let results = pool(&state, 3, 50).run(jobs).await.unwrap();

    assert_eq!(results.len(), 4);
    let launches = state.launches.load(Ordering::SeqCst);
    let closes = state.closes.load(Ordering::SeqCst);
    assert_eq!(launches, 3, "one session per worker");
    assert_eq!(closes, launches, "no leaked sessions after shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_terminates_and_fails_jobs_when_no_worker_can_start() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    state.fail_all_launches.store(true, Ordering::SeqCst);
    let jobs = jobs_in(dir.path(), 3);

    let results = tokio::time::timeout(Duration::from_secs(10), pool(&state, 2, 50).run(jobs))
        .await
        .expect("run must not hang when every worker dies at startup")
        .unwrap();

    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(!result.is_success());
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("no render workers available"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_run_reports_unconsumed_jobs_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(MockState::default());
    let jobs = jobs_in(dir.path(), 5);

    let pool = pool(&state, 2, 50);
    pool.cancellation_token().cancel();

    let results = tokio::time::timeout(Duration::from_secs(10), pool.run(jobs))
        .await
        .expect("cancelled run must still terminate")
        .unwrap();

    assert_eq!(results.len(), 5, "accounting covers never-dequeued jobs");
    assert!(results.iter().all(|r| !r.is_success()));
    assert!(results
        .iter()
        .all(|r| r.error.as_deref().unwrap().contains("run cancelled")));
}

#[tokio::test]
async fn parent_directories_are_created_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("book").join("part-1").join("intro.pdf");
    let state = Arc::new(MockState::default());
    let jobs = vec![RenderJob::new("http://localhost:8000/intro/", nested.clone())];

    let results = pool(&state, 1, 50).run(jobs).await.unwrap();

    assert!(results[0].is_success());
    assert!(nested.exists());
}
