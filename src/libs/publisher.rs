//! Publishing a new version to the release store.
//!
//! One call does the whole sequence: hash the artifact, create the release,
//! attach the artifact, and write the version descriptor using the stored
//! file's revision token. A failure stops the sequence where it happened and
//! nothing is retried; re-running the command is the recovery path. A
//! failed asset upload leaves an incomplete release behind, and the error
//! says so.

use super::descriptor::VersionDescriptor;
use super::error::{UpdateError, UpdateResult};
use super::integrity::bytes_sha256;
use super::version::parse_version;
use crate::api::{content_type_for, ReleaseStore};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::Path;

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub tag: String,
    pub descriptor: VersionDescriptor,
    /// `false` when an existing descriptor was replaced.
    pub descriptor_created: bool,
}

pub struct Publisher<S: ReleaseStore> {
    store: S,
    descriptor_path: String,
}

impl<S: ReleaseStore> Publisher<S> {
    pub fn new(store: S, descriptor_path: &str) -> Self {
        Self {
            store,
            descriptor_path: descriptor_path.to_string(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Publishes `artifact` as `version`, dated today.
    pub async fn upload_file(&self, artifact: &Path, version: &str, changelog: &str) -> UpdateResult<PublishReport> {
        self.upload_file_on(artifact, version, changelog, Local::now().date_naive())
            .await
    }

    pub async fn upload_file_on(
        &self,
        artifact: &Path,
        version: &str,
        changelog: &str,
        release_date: NaiveDate,
    ) -> UpdateResult<PublishReport> {
        let version = version.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        parse_version(version)?;

        let filename = artifact
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UpdateError::Parse(format!("artifact path has no file name: {}", artifact.display())))?
            .to_string();

        // One read: the digest always describes the uploaded bytes.
        let bytes = fs::read(artifact).map_err(|e| UpdateError::fs(artifact, e))?;
        let file_hash = bytes_sha256(&bytes);
        tracing::info!(artifact = %artifact.display(), hash = %file_hash, "artifact hashed");

        let tag = format!("v{}", version);
        let release = self
            .store
            .create_release(&tag, &format!("Version {}", version), changelog)
            .await?;
        tracing::info!(tag = %release.tag, "release created");

        let download_url = self
            .store
            .upload_asset(&release, bytes, &filename, content_type_for(artifact))
            .await
            .map_err(|e| incomplete_release(&release.tag, e))?;
        tracing::info!(url = %download_url, "asset uploaded");

        let descriptor = VersionDescriptor::new(
            version,
            &download_url,
            changelog,
            &file_hash,
            &release_date.format("%Y-%m-%d").to_string(),
        );
        let body = descriptor.to_json_pretty()?;

        let existing = self.store.get_file_contents(&self.descriptor_path).await?;
        let revision = existing.as_ref().map(|file| file.revision.as_str());
        self.store
            .put_file_contents(
                &self.descriptor_path,
                &body,
                &format!("Update version info to {}", version),
                revision,
            )
            .await?;
        tracing::info!(path = %self.descriptor_path, replaced = existing.is_some(), "version descriptor written");

        Ok(PublishReport {
            tag: release.tag,
            descriptor,
            descriptor_created: existing.is_none(),
        })
    }
}

fn incomplete_release(tag: &str, cause: UpdateError) -> UpdateError {
    tracing::warn!(tag, "release left without its asset");
    match cause {
        UpdateError::Api { status, message } => UpdateError::Api {
            status,
            message: format!("{} (release {} exists without its asset)", message, tag),
        },
        other => other,
    }
}
