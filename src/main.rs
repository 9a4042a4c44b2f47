use clap::Parser;

use hedgeline::adapter::inbound::cli::{self, command::Cli, operator, output};
use hedgeline::infrastructure::operator::entry::Operator;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    if operator::install(Box::new(Operator)).is_err() {
        output::error("CLI operator already installed");
        std::process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
