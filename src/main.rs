//! Main entry point for iptracking
use anyhow::Context;
use clap::Parser;
use log::error;
use std::process::ExitCode;

use iptracking::cli::args::Cli;
use iptracking::formats::traits::OutputWriter;
use iptracking::scanner::{scan_path, ScanSummary};

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(summary) => {
            if summary.skipped > 0 {
                log::info!("{} line(s) could not be decoded", summary.skipped);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ScanSummary> {
    let config = cli.scan_config();
    let destination = cli.destination();

    let mut sink = OutputWriter::open(cli.format.into(), &destination)
        .with_context(|| format!("cannot open output {:?}", destination))?;

    let summary = scan_path(&config, &mut sink)
        .with_context(|| format!("scan of {} failed", config.table_path.display()))?;

    Ok(summary)
}
