//! Command-line interface definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Hybrid LMSR and order book engine with hedge replication
#[derive(Parser, Debug)]
#[command(name = "hedgeline")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine, HTTP API, and scheduled jobs (foreground)
    Serve(ServeArgs),

    /// Run one recovery sweep against the configured database
    Sweep(ConfigPathArg),

    /// Persist one risk snapshot
    Snapshot(ConfigPathArg),

    /// Print the risk dashboard
    Dashboard(ConfigPathArg),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `hedgeline config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a documented configuration file.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file.
    Validate(ConfigPathArg),
    /// Change one hedge setting in the configuration file.
    Set(ConfigSetArgs),
}

/// Path to the configuration file.
#[derive(Args, Debug)]
pub struct ConfigPathArg {
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the API bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Override the SQLite database path
    #[arg(long)]
    pub database: Option<String>,

    /// Override the log level (e.g. debug, info)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Do not start the scheduled snapshot and sweep jobs
    #[arg(long)]
    pub no_schedule: bool,
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    #[arg(default_value = "config.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Hedge setting, e.g. `max_slippage_bps` or `maxSlippageBps`
    pub key: String,

    pub value: String,

    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_config_set() {
        let cli = Cli::try_parse_from([
            "hedgeline",
            "config",
            "set",
            "enabled",
            "false",
            "-c",
            "custom.toml",
        ])
        .unwrap();
        match cli.command {
            Commands::Config(ConfigCommand::Set(args)) => {
                assert_eq!(args.key, "enabled");
                assert_eq!(args.value, "false");
                assert_eq!(args.config, PathBuf::from("custom.toml"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "hedgeline",
            "--json",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--no-schedule",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind.unwrap().port(), 9000);
                assert!(args.no_schedule);
                assert_eq!(args.config, PathBuf::from("config.toml"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
