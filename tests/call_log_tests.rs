// tests/call_log_tests.rs
mod common;

use catalog_proxy::call_log::CallLogger;
use catalog_proxy::store::{MemoryStore, StoreError};
use std::sync::Arc;

#[tokio::test]
async fn log_is_capped_at_the_most_recent_entries() {
    let store = Arc::new(MemoryStore::new());
    let logger = CallLogger::new(Some(store), 1000, common::metrics());

    for i in 0..1005u64 {
        logger
            .append(&common::entry(i, "name", "GET", Some(200)))
            .await
            .unwrap();
    }

    let entries = logger.read_all().await.unwrap();
    assert_eq!(entries.len(), 1000);
    // Most-recent-first: the newest append is at the front, the five oldest
    // entries have been trimmed away.
    assert_eq!(entries[0].service_id, 1004);
    assert_eq!(entries[999].service_id, 5);
}

#[tokio::test]
async fn read_all_preserves_prepend_order() {
    let store = Arc::new(MemoryStore::new());
    let logger = CallLogger::new(Some(store), 1000, common::metrics());

    logger
        .append(&common::entry(1, "name", "GET", Some(200)))
        .await
        .unwrap();
    logger
        .append(&common::entry(2, "health", "GET", Some(503)))
        .await
        .unwrap();

    let entries = logger.read_all().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].service_id, 2);
    assert_eq!(entries[1].service_id, 1);
}

#[tokio::test]
async fn missing_store_is_distinct_from_empty_log() {
    let logger = CallLogger::new(None, 1000, common::metrics());
    assert!(matches!(
        logger.read_all().await,
        Err(StoreError::NotConfigured)
    ));

    let store = Arc::new(MemoryStore::new());
    let logger = CallLogger::new(Some(store), 1000, common::metrics());
    let entries = logger.read_all().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn record_completes_detached_from_the_caller() {
    let store = Arc::new(MemoryStore::new());
    let logger = Arc::new(CallLogger::new(Some(store), 1000, common::metrics()));

    logger
        .clone()
        .record(common::entry(1, "name", "GET", Some(200)));

    let entries = common::wait_for_log(&logger, 1).await;
    assert_eq!(entries[0].service_id, 1);
    assert_eq!(entries[0].status_code, Some(200));
}

#[tokio::test]
async fn record_swallows_store_failures() {
    // No store configured: the entry is dropped, nothing panics, and the
    // drop is counted.
    let metrics = common::metrics();
    let logger = Arc::new(CallLogger::new(None, 1000, metrics.clone()));

    logger.clone().record(common::entry(1, "name", "GET", None));

    for _ in 0..50 {
        if metrics.call_log_drops.get() == 1 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("dropped entry was never counted");
}

#[tokio::test]
async fn entries_round_trip_through_serialization() {
    let store = Arc::new(MemoryStore::new());
    let logger = CallLogger::new(Some(store), 1000, common::metrics());

    let entry = common::entry(7, "name", "POST", None);
    logger.append(&entry).await.unwrap();

    let read = logger.read_all().await.unwrap();
    assert_eq!(read[0].service_id, 7);
    assert_eq!(read[0].endpoint, "name");
    assert_eq!(read[0].method, "POST");
    assert_eq!(read[0].status_code, None);
    assert_eq!(read[0].duration_ms, entry.duration_ms);
}
