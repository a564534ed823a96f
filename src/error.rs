use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagePressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("PDF capture failed: {0}")]
    Capture(String),

    #[error("Duplicate output path: {0}")]
    DuplicateOutput(String),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PagePressError {
    pub fn navigation(message: impl Into<String>) -> Self {
        PagePressError::Navigation(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        PagePressError::Timeout(message.into())
    }

    pub fn capture(message: impl Into<String>) -> Self {
        PagePressError::Capture(message.into())
    }

    pub fn session(message: impl Into<String>) -> Self {
        PagePressError::Session(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            PagePressError::Io(e) => ErrorPayload::new(
                ErrorCategory::Io,
                e.to_string(),
                "Check output paths and filesystem permissions.",
            ),
            PagePressError::Navigation(msg) => ErrorPayload::new(
                ErrorCategory::Navigation,
                msg.to_string(),
                "Check that the URL is reachable from this host (is the local server running?).",
            ),
            PagePressError::Timeout(msg) => ErrorPayload::new(
                ErrorCategory::Timeout,
                msg.to_string(),
                "Try increasing --nav-timeout/--ready-timeout and ensure the page finishes loading.",
            ),
            PagePressError::Capture(msg) => ErrorPayload::new(
                ErrorCategory::Capture,
                msg.to_string(),
                "Re-run the job; if the failure persists the page may be crashing the renderer.",
            ),
            PagePressError::DuplicateOutput(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                format!("Duplicate output path: {}", msg),
                "Every job in a run must write to a distinct output path.",
            ),
            PagePressError::Session(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("chrome") || lower.contains("chromium") || lower.contains("executable") {
                    ErrorPayload::new(
                        ErrorCategory::Session,
                        msg.to_string(),
                        "Install Chrome/Chromium, or point --chrome (or chrome.executable in the config) at the binary.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Session,
                        msg.to_string(),
                        "Re-run with --verbose for the worker lifecycle log.",
                    )
                }
            }
            PagePressError::Config(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                msg.to_string(),
                "Check flags, manifest/config paths, and the config file contents.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, PagePressError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Navigation,
    Timeout,
    Capture,
    Io,
    Session,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
