//! Local throttle state for update checks.
//!
//! [`CheckState`] is a plain value: the checker takes one in and hands a
//! (possibly updated) one back. Reading and writing `check_state.json` is the
//! job of [`CheckStateStore`], which the caller invokes explicitly.

use super::data_storage::DataStorage;
use super::error::{UpdateError, UpdateResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CHECK_STATE_FILE: &str = "check_state.json";

/// `{"last_check": <float unix timestamp>}`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct CheckState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<f64>,
}

impl CheckState {
    pub fn never_checked() -> Self {
        Self { last_check: None }
    }

    /// A state recording a completed check at `now`.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            last_check: Some(unix_seconds(now)),
        }
    }

    /// True when the last check is at least `interval` old, or never happened.
    ///
    /// A clock that went backwards counts as due, so a bad timestamp can not
    /// silence checks forever.
    pub fn is_due(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let Some(last_check) = self.last_check else {
            return true;
        };
        let elapsed = unix_seconds(now) - last_check;
        elapsed < 0.0 || elapsed >= interval.as_secs_f64()
    }

    pub fn last_check_time(&self) -> Option<DateTime<Utc>> {
        let secs = self.last_check?;
        Utc.timestamp_millis_opt((secs * 1000.0) as i64).single()
    }

    /// Earliest moment the next remote check is allowed.
    pub fn next_due(&self, interval: Duration) -> Option<DateTime<Utc>> {
        let last = self.last_check_time()?;
        let interval = chrono::Duration::from_std(interval).ok()?;
        Some(last + interval)
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// File-backed persistence for [`CheckState`].
#[derive(Debug, Clone)]
pub struct CheckStateStore {
    path: PathBuf,
}

impl CheckStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location in the application data directory.
    pub fn open_default() -> UpdateResult<Self> {
        Ok(Self::new(DataStorage::new().get_path(CHECK_STATE_FILE)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable state means "never checked".
    pub fn load(&self) -> CheckState {
        let Ok(content) = fs::read(&self.path) else {
            return CheckState::never_checked();
        };
        match serde_json::from_slice(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt check state");
                CheckState::never_checked()
            }
        }
    }

    /// Writes to a sibling temp file and renames it into place.
    pub fn save(&self, state: &CheckState) -> UpdateResult<()> {
        let content = serde_json::to_vec(state)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::fs(parent, e))?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(|e| UpdateError::fs(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| UpdateError::fs(&self.path, e))?;
        Ok(())
    }
}
