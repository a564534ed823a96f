use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use pagepress_lib::{
    load_manifest, stub_renderer_enabled, ChromeLauncher, ChromeOptions, PagePressError,
    PaperFormat, PoolOptions, ProgressCallback, RenderJob, RenderPool, RenderReport, Result,
    SessionLauncher, StubLauncher,
};

use super::emit_error;
use crate::cli::OutputFormat;
use crate::settings::{load_config, resolve_render_settings, RenderFlagSources, ResolvedRenderSettings};

#[allow(clippy::too_many_arguments)]
pub async fn run_render(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    manifest: PathBuf,
    workers: usize,
    recycle_after: usize,
    nav_timeout: u64,
    ready_timeout: u64,
    paper: PaperFormat,
    chrome: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            emit_error(&err);
            return ExitCode::from(2);
        }
    };

    let flags = RenderFlagSources::from_args(raw_args);
    let settings = resolve_render_settings(
        workers,
        recycle_after,
        nav_timeout,
        ready_timeout,
        paper,
        chrome,
        &config,
        &flags,
    );

    let jobs = match load_manifest(&manifest) {
        Ok(jobs) => jobs,
        Err(err) => {
            emit_error(&err);
            return ExitCode::from(2);
        }
    };

    let progress: Option<ProgressCallback> = if verbose {
        Some(Arc::new(|message: &str| eprintln!("[pagepress] {message}")))
    } else {
        None
    };

    let report = if stub_renderer_enabled() {
        execute(StubLauncher, jobs, &settings, progress).await
    } else {
        let launcher = ChromeLauncher::new(ChromeOptions {
            executable: settings.chrome_executable.clone(),
            no_sandbox: settings.no_sandbox,
            navigation_timeout: settings.navigation_timeout,
            ready_timeout: settings.ready_timeout,
        });
        let launcher = match progress.clone() {
            Some(cb) => launcher.with_progress(cb),
            None => launcher,
        };
        execute(launcher, jobs, &settings, progress).await
    };

    let report = match report {
        Ok(report) => report,
        Err(err) => {
            emit_error(&err);
            return ExitCode::from(2);
        }
    };

    if let Err(err) = write_report(&report, format, output.as_deref()) {
        emit_error(&err);
        return ExitCode::from(2);
    }

    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

async fn execute<L: SessionLauncher>(
    launcher: L,
    jobs: Vec<RenderJob>,
    settings: &ResolvedRenderSettings,
    progress: Option<ProgressCallback>,
) -> Result<RenderReport> {
    let options = PoolOptions {
        worker_count: settings.workers,
        recycle_threshold: settings.recycle_threshold,
        dequeue_poll: settings.dequeue_poll,
        geometry: settings.geometry,
    };

    let mut pool = RenderPool::new(launcher, options);
    if let Some(cb) = progress {
        pool = pool.with_progress(cb);
    }

    let started = Instant::now();
    let results = pool.run(jobs).await?;
    Ok(RenderReport::from_results(&results, started.elapsed()))
}

fn write_report(
    report: &RenderReport,
    format: OutputFormat,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| PagePressError::Config(format!("Failed to serialize report: {e}")))?,
        OutputFormat::Pretty => report.summary_lines().join("\n"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, format!("{rendered}\n"))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
