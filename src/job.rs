//! Render jobs and per-job outcomes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{PagePressError, Result};

/// One URL → output path rendering request. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJob {
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "output")]
    pub output_path: PathBuf,
}

impl RenderJob {
    pub fn new(source_url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            output_path: output_path.into(),
        }
    }
}

/// Outcome of a single render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    Success,
    Failed,
}

/// Created exactly once per job, by exactly one worker.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub job: RenderJob,
    pub status: RenderStatus,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl RenderResult {
    pub fn success(job: RenderJob, elapsed: Duration) -> Self {
        Self {
            job,
            status: RenderStatus::Success,
            elapsed,
            error: None,
        }
    }

    pub fn failed(job: RenderJob, elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            job,
            status: RenderStatus::Failed,
            elapsed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RenderStatus::Success
    }
}

/// Rejects job lists that would race on an output file.
///
/// Two jobs writing the same path would make the final contents depend on
/// worker scheduling, so duplicates are a caller error.
pub fn validate_jobs(jobs: &[RenderJob]) -> Result<()> {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(jobs.len());
    for job in jobs {
        if job.source_url.trim().is_empty() {
            return Err(PagePressError::Config(format!(
                "job for {} has an empty URL",
                job.output_path.display()
            )));
        }
        if job.output_path.as_os_str().is_empty() {
            return Err(PagePressError::Config(format!(
                "job for {} has an empty output path",
                job.source_url
            )));
        }
        if !seen.insert(job.output_path.as_path()) {
            return Err(PagePressError::DuplicateOutput(
                job.output_path.display().to_string(),
            ));
        }
    }
    Ok(())
}

/// Loads a JSON manifest: an array of `{"url": ..., "output": ...}` entries.
///
/// Absolute URLs must parse; relative paths are accepted as-is since they
/// are resolved by whatever serves the pages.
pub fn load_manifest(path: &Path) -> Result<Vec<RenderJob>> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        PagePressError::Config(format!("Failed to read manifest {}: {}", path.display(), e))
    })?;
    let jobs: Vec<RenderJob> = serde_json::from_str(&data).map_err(|e| {
        PagePressError::Config(format!(
            "Invalid manifest JSON (expected array of {{url, output}}): {}",
            e
        ))
    })?;

    for job in &jobs {
        if job.source_url.contains("://") {
            Url::parse(&job.source_url).map_err(|e| {
                PagePressError::Config(format!("Invalid URL {}: {}", job.source_url, e))
            })?;
        }
    }

    validate_jobs(&jobs)?;
    Ok(jobs)
}
