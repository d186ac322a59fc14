//! MicroPath - tripline crossing aggregation and subpath fingerprints
//!
//! Reads tab-separated rows on stdin, writes tab-separated rows on stdout, logs on stderr.

use std::io::{self, BufWriter};
use std::process::ExitCode;

use micropath::cli::Cli;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // stdout is the data channel
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    match cli.command.execute(stdin, stdout) {
        Ok(summary) => {
            summary.log();
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
