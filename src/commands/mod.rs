pub mod check;
pub mod init;
pub mod publish;
pub mod status;
pub mod update;

use crate::msg_error;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Check whether a newer version is published")]
    Check(check::CheckArgs),
    #[command(about = "Download, verify and install the latest version")]
    Update(update::UpdateArgs),
    #[command(about = "Show the current version and update check schedule")]
    Status,
    #[command(about = "Publish a new version to the release store", arg_required_else_help = true)]
    Publish(publish::PublishArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parses the command line, runs the command and maps the outcome to an
    /// exit code. Usage errors exit with 1 like any other failure.
    pub async fn menu() -> ExitCode {
        let cli = match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) => return exit_for_parse_error(&e),
        };

        match cli.run().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                msg_error!(format!("{:#}", e));
                ExitCode::FAILURE
            }
        }
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Check(args) => check::cmd(args).await,
            Commands::Update(args) => update::cmd(args).await,
            Commands::Status => status::cmd(),
            Commands::Publish(args) => publish::cmd(args).await,
        }
    }
}

/// Prints clap's message; `--help` and `--version` are not failures.
pub(crate) fn exit_for_parse_error(e: &clap::Error) -> ExitCode {
    let _ = e.print();
    if e.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
