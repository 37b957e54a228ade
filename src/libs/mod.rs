//! Core library modules for upkeep.
//!
//! ## Features
//!
//! - **Checker**: throttled version checks, verified downloads, executable replacement
//! - **Publisher**: release creation and version descriptor sync
//! - **Core Infrastructure**: configuration, data storage, messaging, logging
//!
//! ## Usage
//!
//! ```rust,no_run
//! use upkeep::libs::integrity::verify_file_hash;
//! use std::path::Path;
//!
//! let ok = verify_file_hash(Path::new("app.bin"), "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
//! ```

pub mod check_state;
pub mod checker;
pub mod config;
pub mod data_storage;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod installer;
pub mod integrity;
pub mod logging;
pub mod messages;
pub mod publisher;
pub mod version;
