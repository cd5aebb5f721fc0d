use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Result;
use fatscope::cli::{self, Commands};
use fatscope::commands;

fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

// RUST_LOG, when set, wins over -v
fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: cli::Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Select { input } => commands::select_buckets(&input)?,
        Commands::ShouldRun {
            bucket,
            exit_code,
            input,
        } => {
            let run = commands::should_run(&bucket, &input)?;
            if exit_code && !run {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Classify {
            paths,
            config,
            format,
        } => commands::classify_paths(&paths, config.as_deref(), format.into())?,
        Commands::Explain { input } => commands::explain_selection(&input)?,
        Commands::Init { force } => commands::init_config(force)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = cli::parse_args();
    init_logging(cli.verbosity);

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    run(cli)
}
