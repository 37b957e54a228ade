//! `upkeep-publish <artifact_path> <version> <changelog>`

use clap::Parser;
use std::process::ExitCode;
use upkeep::commands::publish::{self, PublishArgs};
use upkeep::libs::{logging, messages::Message};
use upkeep::msg_error;

#[derive(Debug, Parser)]
#[command(name = "upkeep-publish", version, about = "Publish a new version to the release store")]
struct PublishCli {
    #[command(flatten)]
    args: PublishArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match PublishCli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", Message::PublishUsage);
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    logging::init();
    match publish::cmd(cli.args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            msg_error!(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
