//! Aggregated run reporting.
//!
//! The pool returns raw per-job results; this module folds them into the
//! versioned payload handed back to callers (and printed by the CLI), plus
//! human-readable summary lines for pretty output.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::{RenderResult, RenderStatus};

/// Schema version for report payloads.
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub version: String,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub jobs: Vec<JobRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub url: String,
    pub output: PathBuf,
    pub status: RenderStatus,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderReport {
    pub fn from_results(results: &[RenderResult], wall_elapsed: Duration) -> Self {
        let jobs: Vec<JobRecord> = results
            .iter()
            .map(|result| JobRecord {
                url: result.job.source_url.clone(),
                output: result.job.output_path.clone(),
                status: result.status,
                elapsed_ms: result.elapsed.as_millis() as u64,
                error: result.error.clone(),
            })
            .collect();

        let succeeded = jobs
            .iter()
            .filter(|job| job.status == RenderStatus::Success)
            .count();
        Self {
            version: REPORT_VERSION.to_string(),
            requested: jobs.len(),
            succeeded,
            failed: jobs.len() - succeeded,
            elapsed_ms: wall_elapsed.as_millis() as u64,
            jobs,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs
            .iter()
            .filter(|job| job.status == RenderStatus::Failed)
    }

    /// Human-readable lines for the CLI's pretty format: a status line first,
    /// then one line per failed job with its error string.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.all_succeeded() {
            lines.push(format!(
                "Rendered {}/{} page(s) in {:.1}s",
                self.succeeded,
                self.requested,
                self.elapsed_ms as f64 / 1000.0
            ));
        } else {
            lines.push(format!(
                "Rendered {}/{} page(s) in {:.1}s, {} failed",
                self.succeeded,
                self.requested,
                self.elapsed_ms as f64 / 1000.0,
                self.failed
            ));
        }
        for failure in self.failures() {
            lines.push(format!(
                "  {} -> {}: {}",
                failure.url,
                failure.output.display(),
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
        lines
    }
}
