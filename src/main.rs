mod cli;
mod commands;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_check, run_render};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();

    match args.command {
        Commands::Render {
            manifest,
            workers,
            recycle_after,
            nav_timeout,
            ready_timeout,
            paper,
            chrome,
            format,
            output,
        } => {
            run_render(
                &raw_args,
                args.config,
                args.verbose,
                manifest,
                workers,
                recycle_after,
                nav_timeout,
                ready_timeout,
                paper,
                chrome,
                format,
                output,
            )
            .await
        }
        Commands::Check { chrome } => run_check(chrome),
    }
}
