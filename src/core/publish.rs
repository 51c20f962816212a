//! Version-ordered publish and update of registry records

use crate::core::model::ServerRecord;
use crate::core::service::ServiceError;
use crate::core::store::RegistryStore;
use crate::core::version::{cmp_precedence, normalize_version};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// How a submitted record relates to what is already stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    /// Publish a record under a freshly assigned identity
    Create,
    /// Rewrite the record stored under this identity
    Update(String),
}

/// Gatekeeper for writes to the registry store.
///
/// For a given name, stored versions only ever move forward: a write must
/// carry a version newer than the latest stored one, or be an update of that
/// very record at the same version. The read-then-write sequence runs under
/// a per-name lock so two writers cannot both observe the same latest
/// version.
pub struct PublishController {
    store: Arc<dyn RegistryStore>,
    name_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PublishController {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self {
            store,
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }

    /// Accept or reject a write and persist it when accepted.
    ///
    /// Returns the stored record with its identity: new for
    /// [`SubmitMode::Create`], preserved for [`SubmitMode::Update`].
    pub async fn submit(
        &self,
        mut record: ServerRecord,
        mode: SubmitMode,
    ) -> Result<ServerRecord, ServiceError> {
        if record.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Name is required".to_string()));
        }
        if record.version().trim().is_empty() {
            return Err(ServiceError::InvalidInput("Version is required".to_string()));
        }
        let proposed = normalize_version(record.version())?;

        let lease = self.lease_name(&record.name)?;
        let _guard = lease.lock.lock().await;

        if let SubmitMode::Update(existing_id) = &mode {
            let existing = self.store.get(existing_id).await?;
            if existing.name != record.name {
                return Err(ServiceError::InvalidInput(format!(
                    "Record '{}' is named '{}', not '{}'",
                    existing_id, existing.name, record.name
                )));
            }
        }

        let latest = self.store.find_latest_by_name(&record.name).await?;

        let mut previous_latest = None;
        if let Some(latest) = latest {
            let stored = normalize_version(latest.version()).map_err(|e| {
                ServiceError::Storage(format!(
                    "Stored record {} has an unreadable version: {}",
                    latest.id, e
                ))
            })?;

            match cmp_precedence(&proposed, &stored) {
                Ordering::Greater => previous_latest = Some(latest),
                Ordering::Equal => {
                    let same_record = matches!(&mode, SubmitMode::Update(id) if *id == latest.id);
                    if !same_record {
                        warn!(
                            "Rejected duplicate version {} for '{}'",
                            record.version(),
                            record.name
                        );
                        return Err(ServiceError::DuplicateVersion(format!(
                            "Version {} of '{}' already exists",
                            record.version(),
                            record.name
                        )));
                    }
                    // Idempotent re-publish keeps the original release date
                    record.version_detail.release_date = latest.version_detail.release_date;
                }
                Ordering::Less => {
                    warn!(
                        "Rejected version {} for '{}': latest is {}",
                        record.version(),
                        record.name,
                        latest.version()
                    );
                    return Err(ServiceError::VersionRegression(format!(
                        "Cannot publish version {} of '{}': version {} is already published",
                        record.version(),
                        record.name,
                        latest.version()
                    )));
                }
            }
        }

        record.id = match &mode {
            SubmitMode::Create => Uuid::new_v4().to_string(),
            SubmitMode::Update(existing_id) => existing_id.clone(),
        };
        if record.version_detail.release_date.is_none() {
            record.version_detail.release_date = Some(Utc::now());
        }
        record.version_detail.is_latest = true;

        self.store.put(record.clone()).await?;
        info!(
            "Stored '{}' version {} as {}",
            record.name,
            record.version(),
            record.id
        );

        // Latest lookups order by version, so a stale flag on the old record
        // does not hide the new one
        if let Some(mut previous) = previous_latest.filter(|p| p.id != record.id) {
            previous.version_detail.is_latest = false;
            let previous_id = previous.id.clone();
            if let Err(e) = self.store.put(previous).await {
                warn!(
                    "Stored {} but could not clear the latest flag on {}: {}",
                    record.id, previous_id, e
                );
            }
        }

        Ok(record)
    }

    fn lease_name(&self, name: &str) -> Result<NameLease<'_>, ServiceError> {
        let mut locks = self
            .name_locks
            .lock()
            .map_err(|_| ServiceError::Storage("Publish lock table poisoned".to_string()))?;
        let lock = locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        Ok(NameLease {
            locks: &self.name_locks,
            name: name.to_string(),
            lock,
        })
    }
}

/// Holds a name's lock entry alive; the last holder removes it from the table
struct NameLease<'a> {
    locks: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    name: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for NameLease<'_> {
    fn drop(&mut self) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // One reference in the table, one here: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.name);
        }
    }
}
