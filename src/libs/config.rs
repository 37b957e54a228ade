//! Configuration management for the upkeep application.
//!
//! Settings live in `config.json` inside the per-user application data
//! directory and are split into two optional sections, one per actor:
//!
//! - **Checker**: where the version descriptor lives, how often to poll it,
//!   how long to wait for it, and where downloads are staged.
//! - **Publisher**: which repository hosts releases and the descriptor.
//!
//! Missing sections fall back to defaults compiled in from
//! `[package.metadata]`, so a fresh install works without any file.
//!
//! ## Credentials
//!
//! The publisher's bearer token is never stored in `config.json`. It is read
//! from `UPKEEP_TOKEN` (or `GITHUB_TOKEN`), optionally loaded from a `.env`
//! file in the working directory.
//!
//! ```rust,no_run
//! use upkeep::libs::config::Config;
//!
//! let config = Config::read()?;
//! let checker = config.checker_or_default();
//! println!("Descriptor: {}", checker.descriptor_url);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use super::version::{APP_METADATA_DESCRIPTOR_PATH, APP_METADATA_DESCRIPTOR_URL, APP_METADATA_REPO};
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const TOKEN_ENV_VARS: [&str; 2] = ["UPKEEP_TOKEN", "GITHUB_TOKEN"];

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// A section offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Application-side update check settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckerConfig {
    /// Absolute URL of the version descriptor JSON.
    pub descriptor_url: String,

    /// Minimum hours between two remote checks.
    pub check_interval_hours: u64,

    /// Timeout for the descriptor request, in seconds.
    pub timeout_secs: u64,

    /// Longest wait for the next bytes of any response, downloads included.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Where downloads are staged. `None` uses the OS temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

/// Release store settings used by the publisher.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublisherConfig {
    /// `owner/name` of the repository hosting releases and the descriptor.
    pub repo: String,

    /// REST API root, overridable for GitHub Enterprise.
    pub api_url: String,

    /// Path of the descriptor inside the repository.
    pub descriptor_path: String,

    /// Branch the descriptor is committed to. `None` uses the default branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker: Option<CheckerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<PublisherConfig>,
}

impl Default for CheckerConfig {
    /// 24 hour interval and a 5 second descriptor timeout.
    fn default() -> Self {
        CheckerConfig {
            descriptor_url: APP_METADATA_DESCRIPTOR_URL.to_string(),
            check_interval_hours: 24,
            timeout_secs: 5,
            read_timeout_secs: default_read_timeout_secs(),
            download_dir: None,
        }
    }
}

impl CheckerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_hours.saturating_mul(60 * 60))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn default_read_timeout_secs() -> u64 {
    30
}

impl Default for PublisherConfig {
    fn default() -> Self {
        PublisherConfig {
            repo: APP_METADATA_REPO.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            descriptor_path: APP_METADATA_DESCRIPTOR_PATH.to_string(),
            branch: None,
        }
    }
}

impl Config {
    /// Loads `config.json`, or the defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes `config.json`. Returns `false` when there was nothing to remove.
    pub fn delete() -> Result<bool> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    pub fn checker_or_default(&self) -> CheckerConfig {
        self.checker.clone().unwrap_or_default()
    }

    pub fn publisher_or_default(&self) -> PublisherConfig {
        self.publisher.clone().unwrap_or_default()
    }

    /// Bearer token for the release store, from the environment.
    pub fn token() -> Option<String> {
        // A missing .env file is the normal case.
        let _ = dotenv::dotenv();
        TOKEN_ENV_VARS
            .iter()
            .filter_map(|name| env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    /// Interactive setup wizard, pre-filled with the current values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "checker".to_string(),
                name: "Checker".to_string(),
            },
            ConfigModule {
                key: "publisher".to_string(),
                name: "Publisher".to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "checker" => {
                    let default = config.checker_or_default();
                    msg_print!(Message::ConfigModuleChecker);
                    config.checker = Some(CheckerConfig {
                        descriptor_url: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptDescriptorUrl.to_string())
                            .default(default.descriptor_url)
                            .interact_text()?,
                        check_interval_hours: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptCheckInterval.to_string())
                            .default(default.check_interval_hours)
                            .interact_text()?,
                        timeout_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptTimeout.to_string())
                            .default(default.timeout_secs)
                            .interact_text()?,
                        read_timeout_secs: default.read_timeout_secs,
                        download_dir: default.download_dir,
                    });
                }
                "publisher" => {
                    let default = config.publisher_or_default();
                    msg_print!(Message::ConfigModulePublisher);
                    let branch: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptBranch.to_string())
                        .default(default.branch.clone().unwrap_or_default())
                        .allow_empty(true)
                        .interact_text()?;
                    config.publisher = Some(PublisherConfig {
                        repo: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptRepo.to_string())
                            .default(default.repo)
                            .interact_text()?,
                        api_url: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptApiUrl.to_string())
                            .default(default.api_url)
                            .interact_text()?,
                        descriptor_path: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptDescriptorPath.to_string())
                            .default(default.descriptor_path)
                            .interact_text()?,
                        branch: Some(branch).filter(|b| !b.trim().is_empty()),
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
