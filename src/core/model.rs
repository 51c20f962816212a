//! Registry record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a registered server
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Active,
    Deprecated,
}

/// Source repository of a server
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub id: String,
}

/// Version information attached to a record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionDetail {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_latest: bool,
}

/// A server entry as persisted by the registry store.
///
/// `id` is assigned by the registry on first publish and stays stable across
/// updates; `name` is namespace-qualified (e.g. `io.github.acme/tool`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ServerStatus,
    #[serde(default)]
    pub repository: Repository,
    pub version_detail: VersionDetail,
}

impl ServerRecord {
    /// Create a record with just a name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_detail: VersionDetail {
                version: version.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Declared version string
    pub fn version(&self) -> &str {
        &self.version_detail.version
    }
}
