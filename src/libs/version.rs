//! Application version and semantic version ordering.
//!
//! The running version is embedded at compile time by `build.rs`. Remote
//! versions come from the descriptor and may carry a leading `v` (release
//! tags use `v1.2.3`). Only major.minor.patch take part in ordering.

use super::error::UpdateResult;
use semver::{BuildMetadata, Prerelease, Version};

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

/// Version of the running executable.
pub fn current_version() -> &'static str {
    APP_METADATA_VERSION
}

/// Parses `1.2.3` or `v1.2.3`, ignoring surrounding whitespace.
pub fn parse_version(raw: &str) -> UpdateResult<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Ok(strip_pre_and_build(Version::parse(trimmed)?))
}

/// True when `remote` is strictly greater than `current`.
pub fn is_newer(remote: &str, current: &str) -> UpdateResult<bool> {
    Ok(parse_version(remote)? > parse_version(current)?)
}

fn strip_pre_and_build(mut version: Version) -> Version {
    version.pre = Prerelease::EMPTY;
    version.build = BuildMetadata::EMPTY;
    version
}
