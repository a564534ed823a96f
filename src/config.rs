//! Render configuration: pool sizing, timeouts, page geometry, and the
//! Chrome launch surface. Loadable from a TOML file; durations use humantime
//! strings (`"60s"`, `"500ms"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::PageGeometry;
use crate::pool::{PoolOptions, DEFAULT_DEQUEUE_POLL, DEFAULT_RECYCLE_THRESHOLD, DEFAULT_WORKER_COUNT};
use crate::session::{ChromeOptions, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_READY_TIMEOUT};
use crate::{PagePressError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workers: usize,
    pub recycle_threshold: usize,
    pub timeouts: Timeouts,
    pub geometry: PageGeometry,
    pub chrome: ChromeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            recycle_threshold: DEFAULT_RECYCLE_THRESHOLD,
            timeouts: Timeouts::default(),
            geometry: PageGeometry::default(),
            chrome: ChromeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub ready: Duration,
    #[serde(with = "humantime_serde")]
    pub dequeue_poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: DEFAULT_NAVIGATION_TIMEOUT,
            ready: DEFAULT_READY_TIMEOUT,
            dequeue_poll: DEFAULT_DEQUEUE_POLL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub executable: Option<PathBuf>,
    pub no_sandbox: bool,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            no_sandbox: true,
        }
    }
}

impl Config {
    /// Loads from an explicit TOML file, or returns defaults when no path is
    /// given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| {
            PagePressError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            PagePressError::Config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PagePressError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.recycle_threshold == 0 {
            return Err(PagePressError::Config(
                "recycle_threshold must be at least 1".to_string(),
            ));
        }
        if self.timeouts.navigation.is_zero() || self.timeouts.ready.is_zero() {
            return Err(PagePressError::Config(
                "timeouts must be non-zero".to_string(),
            ));
        }
        if self.timeouts.dequeue_poll.is_zero() {
            return Err(PagePressError::Config(
                "dequeue_poll must be non-zero".to_string(),
            ));
        }
        self.geometry.validate()
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            worker_count: self.workers,
            recycle_threshold: self.recycle_threshold,
            dequeue_poll: self.timeouts.dequeue_poll,
            geometry: self.geometry,
        }
    }

    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            executable: self.chrome.executable.clone(),
            no_sandbox: self.chrome.no_sandbox,
            navigation_timeout: self.timeouts.navigation,
            ready_timeout: self.timeouts.ready,
        }
    }
}
