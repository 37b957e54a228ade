use super::error::{UpdateError, UpdateResult};
use std::env::consts::OS;
use std::env::var;
use std::fs;
use std::path::{Path, PathBuf};

pub const VENDOR_NAME: &str = "upkeep-dev";
pub const APP_NAME: &str = "upkeep";

/// Overrides the platform data directory, mostly for tests and portable installs.
pub const HOME_OVERRIDE_VAR: &str = "UPKEEP_HOME";

#[derive(Debug, Clone)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl DataStorage {
    pub fn new() -> Self {
        if let Ok(custom) = var(HOME_OVERRIDE_VAR) {
            return Self::with_base(custom);
        }

        let base_path = match OS {
            "windows" => var("LOCALAPPDATA").unwrap_or_else(|_| ".".into()),
            "macos" => var("HOME").unwrap_or_else(|_| ".".into()) + "/Library/Application Support",
            _ => var("HOME").unwrap_or_else(|_| ".".into()) + "/.local/share",
        };
        let base_path = Path::new(&base_path).join(VENDOR_NAME).join(APP_NAME);

        Self { base_path }
    }

    pub fn with_base(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn get_path(&self, file_name: &str) -> UpdateResult<PathBuf> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).map_err(|e| UpdateError::fs(&self.base_path, e))?;
        }
        Ok(self.base_path.join(file_name))
    }
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}
