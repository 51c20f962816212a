//! Concurrent publishes for one name must never lose or reorder versions

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use futures::future::join_all;
use registry_admission::{
    InMemoryStore, PublishController, RegistryStore, ServerRecord, ServiceError, SubmitMode,
};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishes_keep_highest_version_latest() {
    let store = Arc::new(InMemoryStore::new());
    let controller = Arc::new(PublishController::new(store.clone()));

    let handles = (1..=20u64).map(|minor| {
        let controller = controller.clone();
        tokio::spawn(async move {
            let version = format!("1.{}.0", minor);
            let result = controller
                .submit(ServerRecord::new("io.github.acme/tool", version.clone()), SubmitMode::Create)
                .await;
            (version, result)
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut accepted = Vec::new();
    for (version, result) in &results {
        match result {
            Ok(record) => {
                assert_eq!(record.version(), version);
                accepted.push(record.clone());
            }
            Err(ServiceError::VersionRegression(_)) | Err(ServiceError::DuplicateVersion(_)) => {}
            Err(other) => panic!("unexpected error for {}: {}", version, other),
        }
    }

    // Everything reported as accepted is actually stored
    for record in &accepted {
        let stored = store.get(&record.id).await.unwrap();
        assert_eq!(stored.version(), record.version());
    }
    assert_eq!(store.len().await, accepted.len());

    let latest = store
        .find_latest_by_name("io.github.acme/tool")
        .await
        .unwrap()
        .unwrap();
    let highest = accepted
        .iter()
        .map(|r| semver::Version::parse(r.version()).unwrap())
        .max()
        .unwrap();
    assert_eq!(latest.version(), highest.to_string());
    // Nothing can outrank the highest proposal, so it is always admitted
    assert_eq!(latest.version(), "1.20.0");
    assert!(latest.version_detail.is_latest);

    let (all, _) = store.list(None, 100).await.unwrap();
    assert_eq!(
        all.iter().filter(|r| r.version_detail.is_latest).count(),
        1,
        "exactly one record is flagged latest"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicates_admit_exactly_one() {
    let store = Arc::new(InMemoryStore::new());
    let controller = Arc::new(PublishController::new(store.clone()));

    let handles = (0..10).map(|_| {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .submit(ServerRecord::new("com.example/tool", "1.0.0"), SubmitMode::Create)
                .await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ServiceError::DuplicateVersion(_))));
    assert_eq!(store.len().await, 1);
}
