//! Command-line interface

use std::io::{Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};

use crate::config::MicroPathConfig;
use crate::micropath_errors::MicroPathError;
use crate::pipeline::{self, RunSummary};

/// MicroPath - tripline crossings and movement fingerprints from position reports
///
/// Every command reads tab-separated rows on stdin and writes tab-separated rows on stdout.
#[derive(Parser, Debug)]
#[command(name = "micropath")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Turn raw reports into travel segments
    Segments {
        /// TOML configuration with a [segments] section
        config: Utf8PathBuf,
    },

    /// Detect tripline crossings on segment rows
    Crossings {
        /// TOML configuration with a [triplines] section
        config: Utf8PathBuf,
    },

    /// Aggregate crossing rows per cell and time bucket
    Aggregate,

    /// Merge partial aggregate rows
    Merge,

    /// Resample raw reports onto a uniform time grid
    Resample {
        /// Optional TOML configuration ([columns], [resample])
        config: Option<Utf8PathBuf>,
    },

    /// Fingerprint resampled subpaths of raw reports
    Subpaths {
        /// Optional TOML configuration ([columns], [resample], [subpaths])
        config: Option<Utf8PathBuf>,
    },
}

fn load_or_default(path: Option<&Utf8Path>) -> Result<MicroPathConfig, MicroPathError> {
    match path {
        Some(path) => MicroPathConfig::load(path),
        None => Ok(MicroPathConfig::default()),
    }
}

impl Commands {
    /// Run the command from `input` to `output`.
    pub fn execute<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<RunSummary, MicroPathError> {
        match self {
            Commands::Segments { config } => {
                pipeline::run_segments(&MicroPathConfig::load(config)?, input, output)
            }
            Commands::Crossings { config } => {
                pipeline::run_crossings(&MicroPathConfig::load(config)?, input, output)
            }
            Commands::Aggregate => pipeline::run_aggregate(input, output),
            Commands::Merge => pipeline::run_merge(input, output),
            Commands::Resample { config } => {
                pipeline::run_resample(&load_or_default(config.as_deref())?, input, output)
            }
            Commands::Subpaths { config } => {
                pipeline::run_subpaths(&load_or_default(config.as_deref())?, input, output)
            }
        }
    }
}

#[cfg(test)]
mod cli_test {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["micropath", "-v", "segments", "conf.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Commands::Segments {
                config: "conf.toml".into()
            }
        );

        let cli = Cli::try_parse_from(["micropath", "resample"]).unwrap();
        assert!(!cli.verbose);
        assert_eq!(cli.command, Commands::Resample { config: None });

        let cli = Cli::try_parse_from(["micropath", "merge", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::Merge);
    }

    #[test]
    fn test_config_is_required_for_crossings() {
        assert!(Cli::try_parse_from(["micropath", "crossings"]).is_err());
        assert!(Cli::try_parse_from(["micropath", "teleport"]).is_err());
    }

    #[test]
    fn test_execute_aggregate_on_empty_input() {
        let mut out = Vec::new();
        let summary = Commands::Aggregate.execute("".as_bytes(), &mut out).unwrap();
        assert_eq!(summary.records_written, 0);
        assert!(out.is_empty());
    }
}
