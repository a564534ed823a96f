use clap::{Parser, Subcommand, ValueEnum};
use pagepress_lib::PaperFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagepress")]
#[command(
    version,
    about = "Render batches of web pages to PDF with a pool of headless Chrome workers",
    long_about = "pagepress\n\nModes:\n- render: capture every page in a JSON job manifest to a PDF file, concurrently.\n- check: verify that a usable Chrome/Chromium executable can be found.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose worker progress output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) to set defaults for workers/timeouts/geometry; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render every page in a job manifest to PDF
    Render {
        #[arg(
            long,
            value_name = "PATH",
            help = "JSON manifest: array of {\"url\": ..., \"output\": ...} entries"
        )]
        manifest: PathBuf,

        #[arg(long, default_value = "2", help = "Number of concurrent browser workers")]
        workers: usize,

        #[arg(
            long,
            default_value = "50",
            help = "Jobs a worker processes before its browser session is recycled"
        )]
        recycle_after: usize,

        #[arg(
            long,
            default_value = "60",
            help = "Navigation timeout (seconds) per page"
        )]
        nav_timeout: u64,

        #[arg(
            long,
            default_value = "30",
            help = "Readiness wait bound (seconds) per page"
        )]
        ready_timeout: u64,

        #[arg(long, default_value = "a4", help = "Paper format (a4, letter, legal)")]
        paper: PaperFormat,

        #[arg(
            long,
            value_name = "PATH",
            help = "Chrome/Chromium executable (auto-detected if omitted)"
        )]
        chrome: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json", help = "Report format")]
        format: OutputFormat,

        #[arg(long, short, help = "Write the report to this file (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Verify that a usable Chrome/Chromium executable can be found
    Check {
        #[arg(
            long,
            value_name = "PATH",
            help = "Chrome/Chromium executable (auto-detected if omitted)"
        )]
        chrome: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
