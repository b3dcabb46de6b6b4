//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for popstats using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code: run completed, every package exported
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: run completed, some packages failed
pub const EXIT_PARTIAL_FAILURE: i32 = 1;
/// Exit code: configuration could not be loaded or is invalid
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Exit code: warehouse or storage could not be reached at startup
pub const EXIT_CONNECTION_ERROR: i32 = 4;
/// Exit code: the run was aborted
pub const EXIT_FATAL: i32 = 5;

/// popstats - package popularity report exporter
#[derive(Parser, Debug)]
#[command(name = "popstats")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "popstats.toml", env = "POPSTATS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "POPSTATS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish the aggregate and per-package popularity reports
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show packages pending export
    Status(commands::status::StatusArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["popstats", "export"]);
        assert_eq!(cli.config, "popstats.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["popstats", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["popstats", "--log-level", "debug", "export"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_export_flags() {
        let cli = Cli::parse_from([
            "popstats",
            "export",
            "--dry-run",
            "--skip-aggregates",
            "--package",
            "Foo.Bar,BAZ.Qux",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert!(args.dry_run);
        assert!(args.skip_aggregates);
        assert_eq!(args.package_filter(), vec!["Foo.Bar", "BAZ.Qux"]);
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["popstats", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["popstats", "status", "--top", "5"]);
        let Commands::Status(args) = cli.command else {
            panic!("expected status command");
        };
        assert_eq!(args.top, 5);
    }
}
