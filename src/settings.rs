use std::path::{Path, PathBuf};
use std::time::Duration;

use pagepress_lib::{Config, PageGeometry, PagePressError, PaperFormat};

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct RenderFlagSources {
    pub workers: bool,
    pub recycle_after: bool,
    pub nav_timeout: bool,
    pub ready_timeout: bool,
    pub paper: bool,
}

impl RenderFlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            workers: flag_present(args, "--workers"),
            recycle_after: flag_present(args, "--recycle-after"),
            nav_timeout: flag_present(args, "--nav-timeout"),
            ready_timeout: flag_present(args, "--ready-timeout"),
            paper: flag_present(args, "--paper"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Resolved settings after merging CLI args and config file.
#[derive(Debug, Clone)]
pub struct ResolvedRenderSettings {
    pub workers: usize,
    pub recycle_threshold: usize,
    pub navigation_timeout: Duration,
    pub ready_timeout: Duration,
    pub dequeue_poll: Duration,
    pub geometry: PageGeometry,
    pub chrome_executable: Option<PathBuf>,
    pub no_sandbox: bool,
}

/// Merge CLI arguments with config file, preferring CLI when flags are
/// present. An explicit `--chrome` always wins over the config file.
#[allow(clippy::too_many_arguments)]
pub fn resolve_render_settings(
    cli_workers: usize,
    cli_recycle_after: usize,
    cli_nav_timeout: u64,
    cli_ready_timeout: u64,
    cli_paper: PaperFormat,
    cli_chrome: Option<PathBuf>,
    config: &Config,
    flags: &RenderFlagSources,
) -> ResolvedRenderSettings {
    ResolvedRenderSettings {
        workers: if flags.workers {
            cli_workers
        } else {
            config.workers
        },
        recycle_threshold: if flags.recycle_after {
            cli_recycle_after
        } else {
            config.recycle_threshold
        },
        navigation_timeout: if flags.nav_timeout {
            Duration::from_secs(cli_nav_timeout)
        } else {
            config.timeouts.navigation
        },
        ready_timeout: if flags.ready_timeout {
            Duration::from_secs(cli_ready_timeout)
        } else {
            config.timeouts.ready
        },
        dequeue_poll: config.timeouts.dequeue_poll,
        geometry: if flags.paper {
            PageGeometry {
                paper: cli_paper,
                margins: config.geometry.margins,
            }
        } else {
            config.geometry
        },
        chrome_executable: cli_chrome.or_else(|| config.chrome.executable.clone()),
        no_sandbox: config.chrome.no_sandbox,
    }
}

/// Load config from a TOML file or return defaults, then validate.
pub fn load_config(path: Option<&Path>) -> Result<Config, PagePressError> {
    let cfg = Config::load(path)?;
    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        PagePressError::Config(prefix)
    })?;
    Ok(cfg)
}
