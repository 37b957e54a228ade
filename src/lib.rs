//! # Upkeep - self-update for desktop applications
//!
//! Checks a release store for newer versions of an application, downloads
//! and verifies them, and replaces the running executable in place. A
//! companion publisher pushes new versions to the same store.
//!
//! ## Features
//!
//! - **Throttled Checks**: at most one remote check per interval, fail-open
//! - **Verified Downloads**: streamed to a temp file, SHA-256 checked
//! - **Safe Replacement**: backup, staged rename, post-install hash, rollback
//! - **Publishing**: GitHub release + asset + `version.json` with optimistic concurrency
//!
//! ## Usage
//!
//! ```rust,no_run
//! use upkeep::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
