//! Command-line interface for termgrid.
//!
//! Parses flags for the interactive window and handles the headless
//! `snapshot` subcommand.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// termgrid - GPU-accelerated cell-grid renderer demo
#[derive(Parser, Debug)]
#[command(name = "termgrid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: the platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace); overrides RUST_LOG and the config
    #[arg(long, value_name = "LEVEL", value_parser = parse_level, global = true)]
    pub log_level: Option<LevelFilter>,

    /// Exit after the specified number of seconds
    #[arg(long, value_name = "SECONDS")]
    pub exit_after: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render one demo frame without a window and save it as PNG
    Snapshot {
        /// Output PNG path
        #[arg(short, long, value_name = "PATH", default_value = "termgrid.png")]
        output: PathBuf,

        /// Grid columns (default: from config)
        #[arg(long)]
        cols: Option<usize>,

        /// Grid rows (default: from config)
        #[arg(long)]
        rows: Option<usize>,

        /// Elapsed time in seconds used for blink phases
        #[arg(long, default_value_t = 0.0)]
        time: f64,
    },
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(value).map_err(|_| format!("unknown log level '{value}'"))
}

/// Runtime options passed from CLI to the application
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub log_level: Option<LevelFilter>,
    /// Exit after this many seconds
    pub exit_after: Option<f64>,
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal application startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    process_args(Cli::parse())
}

/// Handle already-parsed arguments.
pub fn process_args(cli: Cli) -> CliResult {
    match cli.command {
        Some(Commands::Snapshot {
            output,
            cols,
            rows,
            time,
        }) => {
            crate::logging::init_log_bridge(cli.log_level);
            let request = crate::snapshot::SnapshotRequest {
                config_path: cli.config,
                output,
                cols,
                rows,
                time,
            };
            match crate::snapshot::run(&request) {
                Ok(path) => {
                    println!("Saved {}", path.display());
                    CliResult::Exit(0)
                }
                Err(e) => {
                    eprintln!("termgrid: snapshot failed: {e:#}");
                    CliResult::Exit(1)
                }
            }
        }
        None => CliResult::Continue(RuntimeOptions {
            config_path: cli.config,
            log_level: cli.log_level,
            exit_after: cli.exit_after,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_runtime_flags() {
        let cli = Cli::try_parse_from([
            "termgrid",
            "--log-level",
            "debug",
            "--exit-after",
            "1.5",
            "--config",
            "/tmp/termgrid.yaml",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
        assert_eq!(cli.exit_after, Some(1.5));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/termgrid.yaml")));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert!(Cli::try_parse_from(["termgrid", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_snapshot_defaults() {
        let cli = Cli::try_parse_from(["termgrid", "snapshot"]).unwrap();
        match cli.command {
            Some(Commands::Snapshot {
                output,
                cols,
                rows,
                time,
            }) => {
                assert_eq!(output, PathBuf::from("termgrid.png"));
                assert_eq!((cols, rows), (None, None));
                assert_eq!(time, 0.0);
            }
            None => panic!("expected snapshot subcommand"),
        }
    }
}
