//! Update availability check.
//!
//! Honors the throttle interval unless `--force` is given and never fails
//! the process over a network or descriptor problem: those are reported as
//! a warning and the command exits successfully.

use crate::{
    libs::{
        check_state::CheckStateStore,
        checker::Checker,
        config::Config,
        messages::Message,
        version::APP_METADATA_NAME,
    },
    msg_debug, msg_info, msg_print, msg_warning,
};
use anyhow::Result;
use chrono::{Local, Utc};
use clap::Args;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Ignore the check interval and query the release store now
    #[arg(short, long)]
    force: bool,
}

pub async fn cmd(args: CheckArgs) -> Result<()> {
    let config = Config::read()?.checker_or_default();
    let checker = Checker::new(&config)?;
    let store = CheckStateStore::open_default()?;

    let now = Utc::now();
    let state = store.load();

    if !args.force && !state.is_due(now, checker.interval()) {
        let next = state
            .next_due(checker.interval())
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| Message::StatusNever.to_string());
        msg_info!(Message::CheckThrottled(next));
        return Ok(());
    }

    let result = if args.force {
        checker.check_remote(&state, now).await
    } else {
        checker.check_for_updates(&state, now).await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            msg_debug!(format!("update check failed open: {}", e.kind()));
            msg_warning!(Message::CheckFailed(e.to_string()));
            return Ok(());
        }
    };

    if outcome.state != state {
        if let Err(e) = store.save(&outcome.state) {
            tracing::warn!(error = %e, "could not persist check state");
        }
    }

    match outcome.update {
        Some(update) => {
            msg_info!(Message::UpdateAvailable {
                app_name: APP_METADATA_NAME.to_string(),
                current: checker.current_version().to_string(),
                latest: update.version.clone(),
            });
            if !update.changelog.trim().is_empty() {
                msg_print!(Message::Changelog(update.changelog));
            }
            msg_print!(Message::UpgradeHint(APP_METADATA_NAME.to_string()), true);
        }
        None => msg_info!(Message::NoUpdateRequired),
    }

    Ok(())
}
