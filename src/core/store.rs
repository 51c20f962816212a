//! Registry storage contract and the in-memory backend

use crate::core::model::ServerRecord;
use crate::core::service::ServiceError;
use crate::core::version::{cmp_precedence, normalize_version};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::warn;

/// Maximum page size accepted by [`RegistryStore::list`]
pub const MAX_PAGE_SIZE: usize = 100;

/// Persistent store for server records.
///
/// The admission core only needs point reads, "latest version for a name"
/// lookups and writes; the storage engine behind it is not its concern.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Fetch a record by identity. Unknown ids yield [`ServiceError::NotFound`].
    async fn get(&self, id: &str) -> Result<ServerRecord, ServiceError>;

    /// Fetch the record with the highest semantic version for `name`
    async fn find_latest_by_name(&self, name: &str) -> Result<Option<ServerRecord>, ServiceError>;

    /// Page through records. Returns the page and the cursor for the next one.
    async fn list(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<(Vec<ServerRecord>, Option<String>), ServiceError>;

    /// Insert or replace a record keyed by its id
    async fn put(&self, record: ServerRecord) -> Result<(), ServiceError>;

    /// Remove a record by identity
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
}

/// Store backed by an ordered in-process map
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, ServerRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RegistryStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<ServerRecord, ServiceError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Server '{}' not found", id)))
    }

    async fn find_latest_by_name(&self, name: &str) -> Result<Option<ServerRecord>, ServiceError> {
        let records = self.records.read().await;

        let mut latest: Option<(semver::Version, &ServerRecord)> = None;
        for record in records.values().filter(|r| r.name == name) {
            let version = match normalize_version(record.version()) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        "Skipping record {} with unparseable version '{}': {}",
                        record.id,
                        record.version(),
                        e
                    );
                    continue;
                }
            };

            let newer = latest
                .as_ref()
                .map_or(true, |(current, _)| cmp_precedence(&version, current).is_gt());
            if newer {
                latest = Some((version, record));
            }
        }

        Ok(latest.map(|(_, record)| record.clone()))
    }

    async fn list(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<(Vec<ServerRecord>, Option<String>), ServiceError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let records = self.records.read().await;

        let start = match cursor {
            Some(c) if !c.is_empty() => {
                if !records.contains_key(c) {
                    return Err(ServiceError::InvalidInput(format!(
                        "Unknown cursor '{}'",
                        c
                    )));
                }
                std::ops::Bound::Excluded(c.to_string())
            }
            _ => std::ops::Bound::Unbounded,
        };

        let mut iter = records.range((start, std::ops::Bound::Unbounded));
        let page: Vec<ServerRecord> = iter.by_ref().take(limit).map(|(_, r)| r.clone()).collect();

        let next_cursor = match iter.next() {
            Some(_) => page.last().map(|r| r.id.clone()),
            None => None,
        };

        Ok((page, next_cursor))
    }

    async fn put(&self, record: ServerRecord) -> Result<(), ServiceError> {
        if record.id.is_empty() {
            return Err(ServiceError::Storage(
                "Cannot store a record without an id".to_string(),
            ));
        }
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("Server '{}' not found", id)))
    }
}
