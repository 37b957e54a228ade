//! Application-side update lifecycle: decide, download, verify, install.
//!
//! The checker never touches the check-state file itself. It receives the
//! current [`CheckState`] and returns the state the caller should persist,
//! which keeps the throttle deterministic under test and leaves persistence
//! with [`CheckStateStore`].
//!
//! ## Lifecycle
//!
//! 1. [`Checker::check_for_updates`]: throttle, fetch descriptor, compare versions
//! 2. [`Checker::download_update`]: stream to a temp file, verify SHA-256
//! 3. [`Checker::install_update`]: back up, replace, verify, roll back on failure
//!
//! Every step returns a typed [`UpdateError`]. Hosts that must never be
//! disturbed by an update check wrap the result in [`fail_open`].
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use upkeep::libs::check_state::CheckStateStore;
//! use upkeep::libs::checker::Checker;
//! use upkeep::libs::config::CheckerConfig;
//!
//! # async fn run() -> Result<(), upkeep::libs::error::UpdateError> {
//! let checker = Checker::new(&CheckerConfig::default())?;
//! let store = CheckStateStore::open_default()?;
//! if let Some(update) = checker.check_and_persist(&store, Utc::now()).await {
//!     let artifact = checker.download_update(&update.download_url, &update.file_hash, |_| {}).await?;
//!     checker.install_update(&artifact)?;
//! }
//! # Ok(())
//! # }
//! ```

use super::check_state::{CheckState, CheckStateStore};
use super::config::CheckerConfig;
use super::descriptor::{UpdateInfo, VersionDescriptor};
use super::download::{DownloadProgress, Downloader};
use super::error::{UpdateError, UpdateResult};
use super::installer::{InstallReport, Installer};
use super::integrity::ensure_file_hash;
use super::version::{current_version, is_newer, APP_METADATA_NAME};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one check: what was found and which state to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub update: Option<UpdateInfo>,
    pub state: CheckState,
}

pub struct Checker {
    client: Client,
    descriptor_url: String,
    current_version: String,
    interval: Duration,
    timeout: Duration,
    download_dir: Option<PathBuf>,
    installer: Option<Installer>,
}

impl Checker {
    pub fn new(config: &CheckerConfig) -> UpdateResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(config.read_timeout())
            .build()
            .map_err(|e| UpdateError::Network(e.to_string()))?;

        Ok(Self {
            client,
            descriptor_url: config.descriptor_url.clone(),
            current_version: current_version().to_string(),
            interval: config.interval(),
            timeout: config.timeout(),
            download_dir: config.download_dir.clone(),
            installer: None,
        })
    }

    /// Compares against `version` instead of the embedded one.
    pub fn with_current_version(mut self, version: &str) -> Self {
        self.current_version = version.to_string();
        self
    }

    /// Installs into `installer`'s target instead of the running executable.
    pub fn with_installer(mut self, installer: Installer) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn descriptor_url(&self) -> &str {
        &self.descriptor_url
    }

    /// Throttled check.
    ///
    /// Within the interval this returns "no update" without any network call.
    /// When an update is found the returned state is unchanged, so the next
    /// invocation checks again until the update is installed. Only a completed
    /// check that finds nothing newer advances `last_check`.
    pub async fn check_for_updates(&self, state: &CheckState, now: DateTime<Utc>) -> UpdateResult<CheckOutcome> {
        if !state.is_due(now, self.interval) {
            tracing::debug!(last_check = ?state.last_check, "update check throttled");
            return Ok(CheckOutcome {
                update: None,
                state: *state,
            });
        }
        self.check_remote(state, now).await
    }

    /// Same as [`Checker::check_for_updates`] without the throttle.
    pub async fn check_remote(&self, state: &CheckState, now: DateTime<Utc>) -> UpdateResult<CheckOutcome> {
        let descriptor = self.fetch_descriptor().await?;

        if is_newer(&descriptor.version, &self.current_version)? {
            tracing::info!(current = %self.current_version, latest = %descriptor.version, "update available");
            return Ok(CheckOutcome {
                update: Some(descriptor.update_info()),
                state: *state,
            });
        }

        tracing::debug!(current = %self.current_version, remote = %descriptor.version, "already up to date");
        Ok(CheckOutcome {
            update: None,
            state: state.touched(now),
        })
    }

    /// Loads state from `store`, checks, saves the returned state and fails open.
    pub async fn check_and_persist(&self, store: &CheckStateStore, now: DateTime<Utc>) -> Option<UpdateInfo> {
        let state = store.load();
        let outcome = fail_open(self.check_for_updates(&state, now).await)?;
        if outcome.state != state {
            if let Err(e) = store.save(&outcome.state) {
                tracing::warn!(error = %e, "could not persist check state");
            }
        }
        outcome.update
    }

    pub async fn fetch_descriptor(&self) -> UpdateResult<VersionDescriptor> {
        let response = self
            .client
            .get(&self.descriptor_url)
            .timeout(self.timeout)
            .header(USER_AGENT, user_agent())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Api {
                status: status.as_u16(),
                message: format!("GET {} returned {}", self.descriptor_url, status),
            });
        }

        let body = response.bytes().await?;
        VersionDescriptor::from_slice(&body)
    }

    /// Streams `url` to a new temp file and verifies it against `expected_hash`.
    ///
    /// On success the file is kept and its path returned; the install step owns
    /// it from then on. On mismatch or transfer error no file is left behind.
    pub async fn download_update<F>(&self, url: &str, expected_hash: &str, on_progress: F) -> UpdateResult<PathBuf>
    where
        F: FnMut(DownloadProgress),
    {
        let downloader = Downloader::new(self.client.clone());
        let temp = downloader.download(url, self.download_dir.as_deref(), on_progress).await?;

        if let Err(e) = ensure_file_hash(temp.path(), expected_hash) {
            tracing::warn!(url, error = %e, "update file verification failed");
            return Err(e);
        }

        let (file, path) = temp.keep().map_err(|e| UpdateError::fs(e.file.path().to_path_buf(), e.error))?;
        drop(file);
        tracing::info!(path = %path.display(), "update downloaded and verified");
        Ok(path)
    }

    /// Replaces the target executable with `artifact`.
    pub fn install_update(&self, artifact: &Path) -> UpdateResult<InstallReport> {
        match &self.installer {
            Some(installer) => installer.install_update(artifact),
            None => Installer::for_current_exe()?.install_update(artifact),
        }
    }
}

/// Maps any error to "no update this cycle", logging it.
pub fn fail_open<T>(result: UpdateResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "error checking for updates");
            None
        }
    }
}

pub fn user_agent() -> String {
    format!("{}/{}", APP_METADATA_NAME, current_version())
}
