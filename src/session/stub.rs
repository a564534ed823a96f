//! In-process fake renderer.
//!
//! Selected by setting `PAGEPRESS_STUB_RENDERER` to a non-empty value other
//! than `0`, which lets the full pipeline (queue, workers, recycling, report)
//! run end-to-end without a browser installed, primarily for the CLI test
//! suite. URLs containing `unreachable` fail with a navigation error so
//! failure paths can be exercised too.

use async_trait::async_trait;

use super::{PageSession, ReadyOutcome, SessionLauncher};
use crate::geometry::PageGeometry;
use crate::{PagePressError, Result};

/// Environment variable that switches the CLI to the stub backend.
pub const STUB_RENDERER_ENV: &str = "PAGEPRESS_STUB_RENDERER";

pub fn stub_renderer_enabled() -> bool {
    std::env::var(STUB_RENDERER_ENV)
        .map(|value| !value.is_empty() && value != "0")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StubLauncher;

#[async_trait]
impl SessionLauncher for StubLauncher {
    type Session = StubSession;

    async fn launch(&self) -> Result<StubSession> {
        Ok(StubSession { current_url: None })
    }
}

#[derive(Debug)]
pub struct StubSession {
    current_url: Option<String>,
}

#[async_trait]
impl PageSession for StubSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if url.contains("unreachable") {
            return Err(PagePressError::navigation(format!(
                "{url}: connection refused"
            )));
        }
        self.current_url = Some(url.to_string());
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> Result<ReadyOutcome> {
        Ok(ReadyOutcome::Settled)
    }

    async fn capture_pdf(&mut self, _geometry: &PageGeometry) -> Result<Vec<u8>> {
        match &self.current_url {
            Some(_) => Ok(minimal_pdf()),
            None => Err(PagePressError::capture("no page loaded")),
        }
    }

    async fn close(&mut self) {
        self.current_url = None;
    }
}

/// A complete single-page PDF with a correct cross-reference table.
fn minimal_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] >>",
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, body));
    }

    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in &offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    out.into_bytes()
}
