//! Version parsing, normalization and ordering

use semver::{BuildMetadata, Version};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors related to version strings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("Version cannot be empty")]
    Empty,

    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    #[error("Failed to parse version: {0}")]
    ParseError(String),
}

/// Normalize a version string into a full semantic version.
///
/// Accepts an optional leading `v`, and pads a one- or two-component core so
/// that `"1.0"` and `"1.0.0"` compare equal. Pre-release and build suffixes
/// are carried over unchanged.
pub fn normalize_version(version: &str) -> Result<Version, VersionError> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty);
    }

    let unprefixed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    // Split the numeric core from any pre-release/build suffix
    let suffix_start = unprefixed
        .find(|c| c == '-' || c == '+')
        .unwrap_or(unprefixed.len());
    let (core, suffix) = unprefixed.split_at(suffix_start);

    let components: Vec<&str> = core.split('.').collect();
    if components.is_empty()
        || components.len() > 3
        || components
            .iter()
            .any(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_digit()))
    {
        return Err(VersionError::InvalidVersion(version.to_string()));
    }

    let mut padded = components.join(".");
    for _ in components.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);

    Version::parse(&padded).map_err(|e| {
        VersionError::ParseError(format!("Failed to parse version '{}': {}", version, e))
    })
}

/// Compare two version strings by semantic-version precedence.
///
/// Build metadata does not participate in the ordering.
pub fn compare_versions(v1: &str, v2: &str) -> Result<Ordering, VersionError> {
    let ver1 = normalize_version(v1)?;
    let ver2 = normalize_version(v2)?;
    Ok(cmp_precedence(&ver1, &ver2))
}

/// Precedence ordering of two parsed versions (build metadata ignored)
pub fn cmp_precedence(v1: &Version, v2: &Version) -> Ordering {
    let strip = |v: &Version| {
        let mut v = v.clone();
        v.build = BuildMetadata::EMPTY;
        v
    };
    strip(v1).cmp(&strip(v2))
}

/// Check if version1 is newer than version2
pub fn is_newer(v1: &str, v2: &str) -> Result<bool, VersionError> {
    Ok(compare_versions(v1, v2)? == Ordering::Greater)
}
