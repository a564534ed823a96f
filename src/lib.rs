//! pagepress library
//!
//! A concurrent rendering pipeline that captures batches of web pages to PDF
//! files with a bounded pool of headless-Chrome workers, for later assembly
//! into a single document. Callers hand over a list of (URL, output path)
//! jobs; after [`RenderPool::run`] returns, every output path either contains
//! a valid PDF or the job appears in the results as failed.
//!
//! # Module Overview
//!
//! - [`session`] - Browser session abstraction (Chrome backend + test stub)
//! - [`queue`] - Shared job queue with sentinel-based shutdown
//! - [`pool`] - Pool coordinator driving a fixed set of workers
//! - [`job`] - Render jobs, results, and manifest loading
//! - [`report`] - Aggregated run reporting
//! - [`config`] - Configuration file support
//! - [`geometry`] - Paper formats and margins for capture
//!
//! # Example
//!
//! ```no_run
//! use pagepress_lib::{ChromeLauncher, ChromeOptions, PoolOptions, RenderJob, RenderPool};
//!
//! # async fn example() -> pagepress_lib::Result<()> {
//! let jobs = vec![
//!     RenderJob::new("http://localhost:8000/intro/", "cache/intro.pdf"),
//!     RenderJob::new("http://localhost:8000/usage/", "cache/usage.pdf"),
//! ];
//!
//! let launcher = ChromeLauncher::new(ChromeOptions::default());
//! let pool = RenderPool::new(launcher, PoolOptions::default());
//! let results = pool.run(jobs).await?;
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod job;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod report;
pub mod session;
mod worker;

pub use config::{ChromeConfig, Config, Timeouts};
pub use error::{ErrorCategory, ErrorPayload, PagePressError, Result};
pub use geometry::{mm_to_inches, PageGeometry, PageMargins, PaperFormat};
pub use job::{load_manifest, validate_jobs, RenderJob, RenderResult, RenderStatus};
pub use pool::{
    PoolOptions, RenderPool, DEFAULT_DEQUEUE_POLL, DEFAULT_RECYCLE_THRESHOLD, DEFAULT_WORKER_COUNT,
};
pub use progress::ProgressCallback;
pub use queue::{JobQueue, QueueItem};
pub use report::{JobRecord, RenderReport, REPORT_VERSION};
pub use session::{
    ensure_chrome_available, stub_renderer_enabled, ChromeLauncher, ChromeOptions, ChromeSession,
    PageSession, ReadyOutcome, SessionLauncher, StubLauncher, StubSession,
    DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_READY_TIMEOUT, STUB_RENDERER_ENV,
};
