//! In-place executable replacement with verified rollback.
//!
//! ```text
//! <exe>          live executable
//! <exe>.backup   copy of the live executable taken before anything changes
//! <exe>.new      staging copy, renamed over <exe>
//! ```
//!
//! The new bytes are staged next to the target and renamed over it, so on
//! the same filesystem the swap is atomic. The live file is then hashed and
//! compared with the artifact. When anything fails after the backup exists,
//! a target that still matches the backup is left alone; otherwise the
//! backup is restored the same way and verified. Only when that restore also
//! fails does the caller get [`UpdateError::RepairRequired`], with the backup
//! left on disk.

use super::error::{UpdateError, UpdateResult};
use super::integrity::{ensure_file_hash, file_sha256};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File, Permissions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const BACKUP_SUFFIX: &str = ".backup";
pub const STAGING_SUFFIX: &str = ".new";

/// Post-write check of a file against an expected digest.
pub type Verifier = fn(&Path, &str) -> UpdateResult<()>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub target: PathBuf,
    /// SHA-256 of the executable now in place.
    pub hash: String,
}

#[derive(Clone)]
pub struct Installer {
    target: PathBuf,
    verify: Verifier,
}

impl fmt::Debug for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installer").field("target", &self.target).finish_non_exhaustive()
    }
}

impl Installer {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            verify: ensure_file_hash,
        }
    }

    /// Replaces the hash check run after each write to the target.
    pub fn with_verifier(mut self, verify: Verifier) -> Self {
        self.verify = verify;
        self
    }

    /// Installer for the executable of the running process.
    pub fn for_current_exe() -> UpdateResult<Self> {
        let exe = std::env::current_exe().map_err(|e| UpdateError::fs("<current executable>", e))?;
        Ok(Self::new(exe))
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn backup_path(&self) -> PathBuf {
        with_suffix(&self.target, BACKUP_SUFFIX)
    }

    pub fn staging_path(&self) -> PathBuf {
        with_suffix(&self.target, STAGING_SUFFIX)
    }

    /// Installs `artifact` over the target and removes the artifact on success.
    pub fn install_update(&self, artifact: &Path) -> UpdateResult<InstallReport> {
        let artifact_hash = file_sha256(artifact)?;
        let original = fs::metadata(&self.target).map_err(|e| UpdateError::fs(&self.target, e))?;
        let permissions = original.permissions();
        let modified = original.modified().ok();

        let backup = self.backup_path();
        if let Err(e) = copy_preserving(&self.target, &backup, permissions.clone(), modified) {
            let _ = fs::remove_file(&backup);
            return Err(e);
        }
        let backup_hash = match file_sha256(&backup) {
            Ok(hash) => hash,
            Err(e) => {
                let _ = fs::remove_file(&backup);
                return Err(e);
            }
        };
        tracing::debug!(backup = %backup.display(), "executable backed up");

        // From here on the live file may change; failures go through rollback.
        if let Err(cause) = self.replace_with(artifact, &artifact_hash, permissions.clone(), None) {
            return Err(self.roll_back(&backup, &backup_hash, permissions, modified, cause));
        }

        remove_leftover(artifact);
        remove_leftover(&backup);

        tracing::info!(target = %self.target.display(), hash = %artifact_hash, "update installed");
        Ok(InstallReport {
            target: self.target.clone(),
            hash: artifact_hash,
        })
    }

    fn replace_with(
        &self,
        source: &Path,
        expected_hash: &str,
        permissions: Permissions,
        modified: Option<SystemTime>,
    ) -> UpdateResult<()> {
        let staged = self.staging_path();
        if let Err(e) = copy_preserving(source, &staged, permissions, modified) {
            let _ = fs::remove_file(&staged);
            return Err(e);
        }

        if let Err(rename_err) = fs::rename(&staged, &self.target) {
            tracing::warn!(error = %rename_err, "rename over executable refused, copying in place");
            let copied = fs::copy(&staged, &self.target);
            let _ = fs::remove_file(&staged);
            copied.map_err(|e| UpdateError::fs(&self.target, e))?;
        }

        (self.verify)(&self.target, expected_hash)
    }

    fn roll_back(
        &self,
        backup: &Path,
        backup_hash: &str,
        permissions: Permissions,
        modified: Option<SystemTime>,
        cause: UpdateError,
    ) -> UpdateError {
        // The failure may have happened before the target was touched.
        if matches!(file_sha256(&self.target), Ok(live) if live == backup_hash) {
            remove_leftover(backup);
            tracing::warn!(error = %cause, "replacing executable failed, target unchanged");
            return cause;
        }

        tracing::warn!(error = %cause, "replacing executable failed, restoring backup");
        match self.replace_with(backup, backup_hash, permissions, modified) {
            Ok(()) => {
                remove_leftover(backup);
                tracing::info!(target = %self.target.display(), "previous executable restored");
                cause
            }
            Err(restore_err) => {
                tracing::error!(error = %restore_err, backup = %backup.display(), "restore from backup failed");
                UpdateError::RepairRequired {
                    backup: backup.to_path_buf(),
                    reason: format!("{}; restore failed: {}", cause, restore_err),
                }
            }
        }
    }
}

/// Copies `from` to `to`, applying `permissions` and, when known, the mtime.
fn copy_preserving(
    from: &Path,
    to: &Path,
    permissions: Permissions,
    modified: Option<SystemTime>,
) -> UpdateResult<()> {
    fs::copy(from, to).map_err(|e| UpdateError::fs(to, e))?;
    fs::set_permissions(to, permissions).map_err(|e| UpdateError::fs(to, e))?;

    let modified = modified.or_else(|| fs::metadata(from).and_then(|m| m.modified()).ok());
    if let Some(modified) = modified {
        // mtime is cosmetic, a filesystem that refuses it is not an error
        if let Err(e) = File::options().write(true).open(to).and_then(|f| f.set_modified(modified)) {
            tracing::debug!(path = %to.display(), error = %e, "could not preserve modification time");
        }
    }
    Ok(())
}

fn remove_leftover(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove leftover file");
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
