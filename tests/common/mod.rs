//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use serde_json::json;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;
use test_context::TestContext;
use upkeep::libs::data_storage::HOME_OVERRIDE_VAR;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Points the application data directory at a fresh temp dir.
///
/// Tests in one binary share the process environment, so the context holds
/// a lock for its whole lifetime.
pub struct HomeTestContext {
    pub temp_dir: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl TestContext for HomeTestContext {
    fn setup() -> Self {
        let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempfile::tempdir().unwrap();
        std::env::set_var("HOME", temp_dir.path());
        std::env::set_var("LOCALAPPDATA", temp_dir.path());
        std::env::set_var(HOME_OVERRIDE_VAR, temp_dir.path());
        HomeTestContext {
            temp_dir,
            _guard: guard,
        }
    }

    fn teardown(self) {
        std::env::remove_var(HOME_OVERRIDE_VAR);
    }
}

/// Descriptor body as served by the release store.
pub fn descriptor_json(version: &str, download_url: &str, file_hash: &str) -> serde_json::Value {
    json!({
        "version": version,
        "download_url": download_url,
        "changelog": format!("Changes in {}", version),
        "file_hash": file_hash,
        "release_date": "2024-05-01"
    })
}

pub const SOME_HASH: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
