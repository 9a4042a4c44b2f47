//! Handler for the `serve` command.

use crate::adapter::inbound::cli::command::ServeArgs;
use crate::adapter::inbound::cli::{operator, output};
use crate::error::Result;
use crate::port::inbound::operator::runtime::ServeRequest;

/// Execute the serve command: engine, API, and scheduled jobs until shutdown.
pub async fn execute(args: &ServeArgs) -> Result<()> {
    let request = ServeRequest {
        config_toml: operator::read_config_toml(&args.config)?,
        bind: args.bind,
        database: args.database.clone(),
        log_level: args.log_level.clone(),
        schedule: !args.no_schedule,
    };
    let service = operator::operator()?;
    let startup = service.prepare_serve(&request)?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("API", startup.bind);
    output::field(
        "Database",
        startup.database.as_deref().unwrap_or("(in-memory)"),
    );
    output::field("Markets", startup.markets);
    output::field("Hedging", if startup.hedging { "enabled" } else { "disabled" });

    service.execute_serve(request).await
}
