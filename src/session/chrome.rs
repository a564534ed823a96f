//! Headless Chrome sessions over the DevTools protocol.
//!
//! Each session owns one long-lived browser process whose event handler is
//! drained on a spawned task. Navigation opens a fresh page per job; capture
//! uses Chrome's print-to-PDF with fixed paper geometry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::detection::{default_executable, DetectionOptions};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::{PageSession, ReadyOutcome, SessionLauncher, READY_SCRIPT};
use crate::geometry::{mm_to_inches, PageGeometry};
use crate::progress::ProgressCallback;
use crate::{PagePressError, Result};

/// Hard bound on page navigation, after which the job fails rather than
/// wedging its worker.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound on the readiness wait; slow pages are captured as-is once it
/// elapses.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on browser process launch.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period for the browser process to exit on close.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on the best-effort HTTP status probe after navigation.
const STATUS_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the HTTP status of the document response where the browser exposes
/// it; reports 0 when unavailable.
const NAV_STATUS_SCRIPT: &str = r#"
() => {
    const entries = performance.getEntriesByType('navigation');
    if (!entries.length) return 0;
    return entries[0].responseStatus || 0;
}
"#;

/// Configuration for Chrome-backed sessions.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Explicit Chrome/Chromium executable; auto-detected when absent.
    pub executable: Option<PathBuf>,
    /// Launch with `--no-sandbox --disable-setuid-sandbox` (required in most
    /// containers).
    pub no_sandbox: bool,
    pub navigation_timeout: Duration,
    pub ready_timeout: Duration,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            executable: None,
            no_sandbox: true,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

/// Launches one [`ChromeSession`] per call.
#[derive(Clone)]
pub struct ChromeLauncher {
    options: ChromeOptions,
    progress: Option<ProgressCallback>,
}

impl ChromeLauncher {
    pub fn new(options: ChromeOptions) -> Self {
        Self {
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        ChromeSession::launch(self.options.clone(), self.progress.clone()).await
    }
}

/// One launched browser process plus the page currently being rendered.
pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    options: ChromeOptions,
    progress: Option<ProgressCallback>,
    closed: bool,
}

impl ChromeSession {
    async fn launch(options: ChromeOptions, progress: Option<ProgressCallback>) -> Result<Self> {
        let executable = ensure_chrome_available(options.executable.as_deref())?;

        let mut builder = BrowserConfig::builder().chrome_executable(executable);
        if options.no_sandbox {
            builder = builder.no_sandbox().arg("--disable-setuid-sandbox");
        }
        let config = builder.build().map_err(PagePressError::Session)?;

        let (browser, mut handler) = timeout(LAUNCH_TIMEOUT, Browser::launch(config))
            .await
            .map_err(|_| {
                PagePressError::timeout(format!(
                    "browser launch exceeded {}s",
                    LAUNCH_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|err| PagePressError::Session(format!("failed to launch Chrome: {err}")))?;

        // The CDP event stream must be polled for the whole browser lifetime.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page: None,
            options,
            progress,
            closed: false,
        })
    }

    fn log(&self, message: &str) {
        if let Some(cb) = &self.progress {
            cb(message);
        }
    }

    /// Best-effort HTTP status of the navigated document; `None` when the
    /// browser does not expose it.
    async fn nav_response_status(page: &Page) -> Option<i64> {
        let eval = timeout(STATUS_CHECK_TIMEOUT, page.evaluate_function(NAV_STATUS_SCRIPT))
            .await
            .ok()?
            .ok()?;
        eval.into_value::<i64>().ok().filter(|status| *status > 0)
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if let Some(old) = self.page.take() {
            if let Err(err) = old.close().await {
                self.log(&format!("closing previous page failed: {err}"));
            }
        }

        let bound = self.options.navigation_timeout;
        let navigation = async {
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|err| map_navigation_error(url, err))?;
            page.wait_for_navigation()
                .await
                .map_err(|err| map_navigation_error(url, err))?;
            Ok::<Page, PagePressError>(page)
        };

        let page = match timeout(bound, navigation).await {
            Err(_elapsed) => {
                return Err(PagePressError::timeout(format!(
                    "navigation to {url} exceeded {}s",
                    bound.as_secs()
                )))
            }
            Ok(result) => result?,
        };

        if let Some(status) = Self::nav_response_status(&page).await {
            if status >= 400 {
                if let Err(err) = page.close().await {
                    self.log(&format!("closing failed page failed: {err}"));
                }
                return Err(PagePressError::navigation(format!(
                    "{url} returned HTTP {status}"
                )));
            }
        }

        self.page = Some(page);
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> Result<ReadyOutcome> {
        let page = self.page.as_ref().ok_or_else(|| {
            PagePressError::session("wait_until_ready called before a successful navigation")
        })?;

        match timeout(self.options.ready_timeout, page.evaluate_function(READY_SCRIPT)).await {
            Ok(Ok(_)) => Ok(ReadyOutcome::Settled),
            Ok(Err(err)) => Err(PagePressError::session(format!(
                "readiness evaluation failed: {err}"
            ))),
            Err(_elapsed) => Ok(ReadyOutcome::WaitExpired),
        }
    }

    async fn capture_pdf(&mut self, geometry: &PageGeometry) -> Result<Vec<u8>> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| PagePressError::capture("no page loaded"))?;

        let bound = self.options.navigation_timeout;
        let bytes = match timeout(bound, page.pdf(print_params(geometry))).await {
            Err(_elapsed) => {
                return Err(PagePressError::timeout(format!(
                    "PDF capture exceeded {}s",
                    bound.as_secs()
                )))
            }
            Ok(Err(err)) => {
                return Err(PagePressError::capture(format!("renderer failed: {err}")))
            }
            Ok(Ok(bytes)) => bytes,
        };

        if bytes.is_empty() {
            return Err(PagePressError::capture("renderer returned an empty document"));
        }
        Ok(bytes)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(page) = self.page.take() {
            if let Err(err) = page.close().await {
                self.log(&format!("page close failed: {err}"));
            }
        }
        if let Err(err) = self.browser.close().await {
            self.log(&format!("browser close failed: {err}"));
        }
        if timeout(CLOSE_TIMEOUT, self.browser.wait()).await.is_err() {
            self.log("browser did not exit in time; killing the process");
            let _ = self.browser.kill().await;
        }
        self.handler_task.abort();
    }
}

/// Finds a usable Chrome/Chromium executable, preferring an explicit path.
pub fn ensure_chrome_available(executable: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = executable {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(PagePressError::Session(format!(
            "Chrome executable {} does not exist",
            path.display()
        )));
    }
    default_executable(DetectionOptions::default()).map_err(|err| {
        PagePressError::Session(format!("no Chrome/Chromium executable found: {err}"))
    })
}

fn print_params(geometry: &PageGeometry) -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(geometry.paper.width_inches()),
        paper_height: Some(geometry.paper.height_inches()),
        margin_top: Some(mm_to_inches(geometry.margins.top_mm)),
        margin_bottom: Some(mm_to_inches(geometry.margins.bottom_mm)),
        margin_left: Some(mm_to_inches(geometry.margins.left_mm)),
        margin_right: Some(mm_to_inches(geometry.margins.right_mm)),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

fn map_navigation_error(url: &str, err: CdpError) -> PagePressError {
    let text = err.to_string();
    if text.to_ascii_lowercase().contains("timeout") {
        PagePressError::timeout(format!("navigating to {url}: {text}"))
    } else {
        PagePressError::navigation(format!("{url}: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_options_default_values() {
        let opts = ChromeOptions::default();
        assert!(opts.executable.is_none());
        assert!(opts.no_sandbox);
        assert_eq!(opts.navigation_timeout, DEFAULT_NAVIGATION_TIMEOUT);
        assert_eq!(opts.ready_timeout, DEFAULT_READY_TIMEOUT);
    }

    #[test]
    fn ensure_chrome_available_rejects_missing_explicit_path() {
        let err = ensure_chrome_available(Some(Path::new("/definitely/not/chrome"))).unwrap_err();
        assert!(matches!(err, PagePressError::Session(_)));
        assert!(err.to_string().contains("/definitely/not/chrome"));
    }

    #[test]
    fn print_params_convert_margins_to_inches() {
        let geometry = PageGeometry::default();
        let params = print_params(&geometry);
        assert_eq!(params.print_background, Some(true));
        assert!((params.paper_width.unwrap() - 8.27).abs() < f64::EPSILON);
        assert!((params.paper_height.unwrap() - 11.69).abs() < f64::EPSILON);
        assert!((params.margin_top.unwrap() - 25.5 / 25.4).abs() < 1e-9);
        assert!((params.margin_left.unwrap() - 19.0 / 25.4).abs() < 1e-9);
    }

    #[test]
    fn ready_script_mentions_all_three_barriers() {
        assert!(READY_SCRIPT.contains("document.fonts.ready"));
        assert!(READY_SCRIPT.contains("readyState"));
        assert!(READY_SCRIPT.contains("requestAnimationFrame"));
    }
}
