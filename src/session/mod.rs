//! Browser session abstraction for page rendering.
//!
//! Automation backends differ in how they signal readiness and paint
//! completion, so workers talk to a small capability interface instead of a
//! concrete driver:
//!
//! - [`chrome`] - headless Chrome sessions over the DevTools protocol
//! - [`stub`] - in-process fake used by tests and the `PAGEPRESS_STUB_RENDERER`
//!   escape hatch
//!
//! A session is exclusively owned by one worker for its entire lifetime and
//! is torn down either by recycling or at worker shutdown.

mod chrome;
mod stub;

pub use chrome::{
    ensure_chrome_available, ChromeLauncher, ChromeOptions, ChromeSession,
    DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_READY_TIMEOUT,
};
pub use stub::{stub_renderer_enabled, StubLauncher, StubSession, STUB_RENDERER_ENV};

use async_trait::async_trait;

use crate::geometry::PageGeometry;
use crate::Result;

/// How a readiness wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Load event fired, fonts resolved, and a frame was painted.
    Settled,
    /// The bound elapsed first; capture proceeds best-effort.
    WaitExpired,
}

/// One live browser context, able to render the current page to PDF.
#[async_trait]
pub trait PageSession: Send {
    /// Loads `url`, failing on network errors, terminal HTTP failures, or the
    /// hard navigation timeout.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Waits for the page to settle (document loaded, fonts ready, a painted
    /// frame), bounded by the configured readiness timeout.
    async fn wait_until_ready(&mut self) -> Result<ReadyOutcome>;

    /// Renders the current page to PDF bytes with the given paper geometry.
    async fn capture_pdf(&mut self, geometry: &PageGeometry) -> Result<Vec<u8>>;

    /// Releases all underlying resources. Idempotent; close runs on cleanup
    /// paths and must never raise, so failures are logged and swallowed.
    async fn close(&mut self);
}

/// Constructs sessions; each worker launches its own and relaunches on
/// recycle.
#[async_trait]
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: PageSession + 'static;

    async fn launch(&self) -> Result<Self::Session>;
}

/// Readiness script shared by backends: resolves once the document has fully
/// loaded AND web fonts are ready AND a double animation-frame tick has
/// occurred, i.e. at least one frame was painted after load.
pub(crate) const READY_SCRIPT: &str = r#"
() => Promise.all([
    document.fonts.ready,
    new Promise(resolve => {
        if (document.readyState === 'complete') resolve();
        else window.addEventListener('load', resolve);
    }),
    new Promise(resolve => {
        requestAnimationFrame(() => {
            requestAnimationFrame(resolve);
        });
    })
]).then(() => true)
"#;
