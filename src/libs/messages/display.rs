//! Display implementation for upkeep messages.
//!
//! All user-facing text lives here, one arm per [`Message`] variant, so
//! wording stays consistent between the checker commands and the publisher.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let s = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed".to_string(),
            Message::ConfigNotFound => "No configuration file to remove".to_string(),
            Message::ConfigModuleChecker => "Checker settings".to_string(),
            Message::ConfigModulePublisher => "Publisher settings".to_string(),
            Message::PromptSelectModules => "Select the sections to configure".to_string(),
            Message::PromptDescriptorUrl => "Version descriptor URL".to_string(),
            Message::PromptCheckInterval => "Hours between update checks".to_string(),
            Message::PromptTimeout => "Descriptor request timeout (seconds)".to_string(),
            Message::PromptRepo => "Release repository (owner/name)".to_string(),
            Message::PromptApiUrl => "Release store API URL".to_string(),
            Message::PromptDescriptorPath => "Descriptor path in the repository".to_string(),
            Message::PromptBranch => "Descriptor branch (empty for default)".to_string(),
            Message::TokenMissing => {
                "No release store token found. Set UPKEEP_TOKEN (or GITHUB_TOKEN) in the environment or a .env file".to_string()
            }

            // === CHECK MESSAGES ===
            Message::CheckThrottled(next) => format!("Update check skipped, next check after {}", next),
            Message::UpdateAvailable { app_name, current, latest } => {
                format!("A new version of {} is available: v{} (current v{})", app_name, latest, current)
            }
            Message::Changelog(text) => format!("What's new:\n{}", text),
            Message::NoUpdateRequired => "No update required. You are using the latest version!".to_string(),
            Message::CheckFailed(e) => format!("Could not check for updates: {}", e),
            Message::UpgradeHint(app_name) => format!("Upgrade now by running: {} update", app_name),

            // === INSTALL MESSAGES ===
            Message::ConfirmInstall(version) => format!("Download and install v{} now?", version),
            Message::UpdateCancelled => "Update cancelled".to_string(),
            Message::Downloading(url) => format!("Downloading {}", url),
            Message::DownloadProgress(percent) => format!("Download progress: {}%", percent),
            Message::DownloadVerified(path) => format!("Download verified: {}", path),
            Message::DownloadFailed(e) => format!("Download failed: {}", e),
            Message::InstallCompleted { app_name, version } => {
                format!("The {} application has been successfully updated to version {}!", app_name, version)
            }
            Message::InstallRolledBack(e) => format!("Install failed, the previous version was restored: {}", e),
            Message::RepairRequired(backup) => format!(
                "The executable may be damaged. Restore it manually by copying {} over the application binary",
                backup
            ),
            Message::RestartRequired => "Restart the application to run the new version".to_string(),

            // === PUBLISH MESSAGES ===
            Message::PublishUsage => "Usage: upkeep-publish <artifact_path> <version> <changelog>\nExample: upkeep-publish dist/app.exe 1.1.0 'Added new features'".to_string(),
            Message::PublishHashing(path) => format!("Hashing {}", path),
            Message::PublishReleaseCreated(tag) => format!("Release {} created", tag),
            Message::PublishAssetUploaded(url) => format!("Asset uploaded: {}", url),
            Message::PublishDescriptorWritten(path) => format!("Version info written to {}", path),
            Message::PublishCompleted(version) => format!("Successfully published version {}", version),
            Message::PublishFailed(e) => format!("Publishing failed: {}", e),

            // === STATUS MESSAGES ===
            Message::StatusHeader => "Update status".to_string(),
            Message::StatusNever => "never".to_string(),
        };
        write!(f, "{}", s)
    }
}
