//! Interactive update: check, confirm, download, verify, install.
//!
//! A failed check degrades to "no update" like the background check does.
//! Once the user has asked for an install, download and install failures are
//! reported and the command exits with an error. An install failure that
//! could not be rolled back prints the backup location for manual repair.

use crate::{
    libs::{
        check_state::CheckStateStore,
        checker::Checker,
        config::Config,
        error::UpdateError,
        messages::Message,
        version::APP_METADATA_NAME,
    },
    msg_bail_anyhow, msg_error, msg_error_anyhow, msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Install without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Ignore the check interval and query the release store now
    #[arg(short, long)]
    force: bool,
}

pub async fn cmd(args: UpdateArgs) -> Result<()> {
    let config = Config::read()?.checker_or_default();
    let checker = Checker::new(&config)?;
    let store = CheckStateStore::open_default()?;

    let now = Utc::now();
    let state = store.load();
    let result = if args.force {
        checker.check_remote(&state, now).await
    } else {
        checker.check_for_updates(&state, now).await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            msg_warning!(Message::CheckFailed(e.to_string()));
            return Ok(());
        }
    };
    if outcome.state != state {
        if let Err(e) = store.save(&outcome.state) {
            tracing::warn!(error = %e, "could not persist check state");
        }
    }

    let Some(update) = outcome.update else {
        msg_info!(Message::NoUpdateRequired);
        return Ok(());
    };

    msg_info!(Message::UpdateAvailable {
        app_name: APP_METADATA_NAME.to_string(),
        current: checker.current_version().to_string(),
        latest: update.version.clone(),
    });
    if !update.changelog.trim().is_empty() {
        msg_print!(Message::Changelog(update.changelog.clone()));
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmInstall(update.version.clone()).to_string())
            .default(true)
            .interact()?;
        if !confirmed {
            msg_info!(Message::UpdateCancelled);
            return Ok(());
        }
    }

    msg_print!(Message::Downloading(update.download_url.clone()));
    let mut last_percent = None;
    let artifact = checker
        .download_update(&update.download_url, &update.file_hash, |progress| {
            if let Some(percent) = progress.percent() {
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    msg_print!(Message::DownloadProgress(percent));
                }
            }
        })
        .await
        .map_err(|e| msg_error_anyhow!(Message::DownloadFailed(e.to_string())))?;
    msg_success!(Message::DownloadVerified(artifact.display().to_string()));

    match checker.install_update(&artifact) {
        Ok(_) => {
            msg_success!(Message::InstallCompleted {
                app_name: APP_METADATA_NAME.to_string(),
                version: update.version,
            });
            msg_info!(Message::RestartRequired);
            Ok(())
        }
        Err(UpdateError::RepairRequired { backup, reason }) => {
            msg_error!(Message::RepairRequired(backup.display().to_string()));
            Err(anyhow!(reason))
        }
        Err(e) => {
            // Rolled back; the next run downloads again.
            let _ = std::fs::remove_file(&artifact);
            msg_bail_anyhow!(Message::InstallRolledBack(e.to_string()))
        }
    }
}
