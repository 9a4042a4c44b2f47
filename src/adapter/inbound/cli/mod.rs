//! Command-line interface.

pub mod command;
pub mod config;
pub mod operator;
pub mod output;
pub mod risk;
pub mod serve;

use crate::error::Result;
use command::{Cli, Commands, ConfigCommand};
use output::OutputConfig;

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Whatever the selected command fails with.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));
    match cli.command {
        Commands::Serve(args) => serve::execute(&args).await,
        Commands::Sweep(args) => risk::execute_sweep(&args.config),
        Commands::Snapshot(args) => risk::execute_snapshot(&args.config),
        Commands::Dashboard(args) => risk::execute_dashboard(&args.config),
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&args.path, args.force),
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(&args.config),
        Commands::Config(ConfigCommand::Validate(args)) => config::execute_validate(&args.config),
        Commands::Config(ConfigCommand::Set(args)) => {
            config::execute_set(&args.config, &args.key, &args.value)
        }
    }
}
