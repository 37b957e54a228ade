//! Error taxonomy shared by the checker, installer and publisher.
//!
//! Every library operation returns [`UpdateError`]. The checker's
//! "never break the host over an update check" policy is not baked in here:
//! callers decide explicitly what to do with each kind, usually through
//! [`crate::libs::checker::fail_open`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    /// Timeout, DNS failure, refused connection or a stream cut mid-transfer.
    #[error("Network error: {0}")]
    Network(String),

    /// Downloaded or installed bytes do not match the advertised digest.
    #[error("Integrity check failed for {path}: expected {expected}, got {actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Permission denied, disk full, path not found.
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-2xx response from the release store or descriptor host.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Malformed descriptor, version string or response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The store refused a write because the revision token was stale.
    #[error("Conflict writing {path}: the stored revision changed, re-run to retry")]
    Conflict { path: String },

    /// Replacing the executable failed and the original could not be restored.
    #[error("Install failed and rollback did not complete: {reason}. Restore manually from {backup}")]
    RepairRequired { backup: PathBuf, reason: String },
}

impl UpdateError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }

    /// True when the live executable may be damaged and an operator has to act.
    pub fn is_repair_required(&self) -> bool {
        matches!(self, Self::RepairRequired { .. })
    }

    /// Short machine-friendly name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Integrity { .. } => "integrity",
            Self::Filesystem { .. } => "filesystem",
            Self::Api { .. } => "api",
            Self::Parse(_) => "parse",
            Self::Conflict { .. } => "conflict",
            Self::RepairRequired { .. } => "repair_required",
        }
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Parse(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::Api {
                status: status.as_u16(),
                message: e.to_string(),
            };
        }
        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for UpdateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<semver::Error> for UpdateError {
    fn from(e: semver::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

pub type UpdateResult<T> = Result<T, UpdateError>;
