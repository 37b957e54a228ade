//! Publishes an artifact as a new version.
//!
//! Shared by `upkeep publish` and the standalone `upkeep-publish` binary.

use crate::{
    api::GitHubStore,
    libs::{config::Config, messages::Message, publisher::Publisher},
    msg_error_anyhow, msg_info, msg_success,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Path to the built artifact
    pub artifact: PathBuf,

    /// Version being published, e.g. 1.1.0
    pub version: String,

    /// Release notes shown to users
    pub changelog: String,
}

pub async fn cmd(args: PublishArgs) -> Result<()> {
    let config = Config::read()?.publisher_or_default();
    let token = Config::token().ok_or_else(|| msg_error_anyhow!(Message::TokenMissing))?;

    let store = GitHubStore::new(&config, &token)?;
    let publisher = Publisher::new(store, &config.descriptor_path);

    msg_info!(Message::PublishHashing(args.artifact.display().to_string()));
    let report = publisher
        .upload_file(&args.artifact, &args.version, &args.changelog)
        .await
        .map_err(|e| msg_error_anyhow!(Message::PublishFailed(e.to_string())))?;

    msg_success!(Message::PublishReleaseCreated(report.tag.clone()));
    msg_success!(Message::PublishAssetUploaded(report.descriptor.download_url.clone()));
    msg_success!(Message::PublishDescriptorWritten(config.descriptor_path.clone()));
    msg_success!(Message::PublishCompleted(report.descriptor.version));
    Ok(())
}
