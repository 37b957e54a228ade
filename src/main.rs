use std::process::ExitCode;
use upkeep::commands::Cli;
use upkeep::libs::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    Cli::menu().await
}
