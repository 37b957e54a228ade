//! The version descriptor: the data contract between publisher and checker.
//!
//! The publisher writes it to a well-known path in the release store; the
//! checker fetches it and holds only a transient copy per check. It is the
//! sole source of truth for which artifact digest is current.
//!
//! ```json
//! {
//!     "version": "1.1.0",
//!     "download_url": "https://github.com/owner/app/releases/download/v1.1.0/app.exe",
//!     "changelog": "Faster startup",
//!     "file_hash": "4f0b…",
//!     "release_date": "2026-10-19"
//! }
//! ```

use super::error::{UpdateError, UpdateResult};
use super::version::parse_version;
use serde::{Deserialize, Serialize};

/// Length of a hex-encoded SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub version: String,
    pub download_url: String,
    #[serde(default)]
    pub changelog: String,
    pub file_hash: String,
    /// Informational only, `YYYY-MM-DD`.
    #[serde(default)]
    pub release_date: String,
}

/// What the checker hands back when a newer version is published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateInfo {
    pub version: String,
    pub download_url: String,
    pub changelog: String,
    pub file_hash: String,
}

impl VersionDescriptor {
    pub fn new(version: &str, download_url: &str, changelog: &str, file_hash: &str, release_date: &str) -> Self {
        Self {
            version: version.to_owned(),
            download_url: download_url.to_owned(),
            changelog: changelog.to_owned(),
            file_hash: file_hash.to_owned(),
            release_date: release_date.to_owned(),
        }
    }

    /// Parses and validates a descriptor body.
    pub fn from_slice(bytes: &[u8]) -> UpdateResult<Self> {
        let descriptor: Self = serde_json::from_slice(bytes)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Serializes with four-space indentation, the layout kept in the store.
    pub fn to_json_pretty(&self) -> UpdateResult<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn validate(&self) -> UpdateResult<()> {
        parse_version(&self.version)?;

        if !(self.download_url.starts_with("https://") || self.download_url.starts_with("http://")) {
            return Err(UpdateError::Parse(format!(
                "download_url must be an absolute http(s) URL, got '{}'",
                self.download_url
            )));
        }

        if self.file_hash.len() != HASH_HEX_LEN || !self.file_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(UpdateError::Parse(format!(
                "file_hash must be {} hex characters, got '{}'",
                HASH_HEX_LEN, self.file_hash
            )));
        }

        Ok(())
    }

    pub fn update_info(&self) -> UpdateInfo {
        UpdateInfo {
            version: self.version.clone(),
            download_url: self.download_url.clone(),
            changelog: self.changelog.clone(),
            file_hash: self.file_hash.clone(),
        }
    }
}
