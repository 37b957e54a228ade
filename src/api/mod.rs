//! Release store clients.
//!
//! The publisher talks to the remote side only through [`ReleaseStore`]:
//! create a release, attach an artifact to it, read and write a file at a
//! well-known path. [`github::GitHubStore`] backs it with GitHub Releases and
//! the repository contents API.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use upkeep::api::{github::GitHubStore, ReleaseStore};
//! use upkeep::libs::config::PublisherConfig;
//!
//! # async fn run() -> Result<(), upkeep::libs::error::UpdateError> {
//! let store = GitHubStore::new(&PublisherConfig::default(), "ghp_token")?;
//! let current = store.get_file_contents("version.json").await?;
//! # Ok(())
//! # }
//! ```

use crate::libs::error::UpdateResult;
use std::path::Path;

pub mod github;

pub use github::GitHubStore;

/// A release created in the store, enough to attach assets to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHandle {
    pub id: u64,
    pub tag: String,
    /// Endpoint accepting asset uploads for this release.
    pub upload_url: String,
}

/// A file read from the store together with its revision token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    /// Opaque token to pass back on the next write (optimistic concurrency).
    pub revision: String,
}

/// Remote service hosting versioned artifacts and the version descriptor.
#[allow(async_fn_in_trait)]
pub trait ReleaseStore {
    /// Creates a published release.
    async fn create_release(&self, tag: &str, title: &str, body: &str) -> UpdateResult<ReleaseHandle>;

    /// Attaches `bytes` to `release` and returns its public download URL.
    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> UpdateResult<String>;

    /// Reads `path`, `None` when it does not exist.
    async fn get_file_contents(&self, path: &str) -> UpdateResult<Option<StoredFile>>;

    /// Writes `path`. With `revision` the write only succeeds if the stored
    /// file is still at that revision, otherwise it fails with `Conflict`.
    async fn put_file_contents(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        revision: Option<&str>,
    ) -> UpdateResult<()>;
}

/// Content type for an uploaded artifact, by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "exe" | "msi" | "dll" => "application/x-msdownload",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "dmg" => "application/x-apple-diskimage",
        "deb" => "application/vnd.debian.binary-package",
        "rpm" => "application/x-rpm",
        "appimage" => "application/vnd.appimage",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
