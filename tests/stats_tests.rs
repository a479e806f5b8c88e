// tests/stats_tests.rs
mod common;

use catalog_proxy::call_log::{CallLogEntry, CallLogger};
use catalog_proxy::stats::{fold_entries, StatsAggregator};
use catalog_proxy::store::{MemoryStore, StoreError};
use chrono::Utc;
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn empty_log_folds_to_all_zero_counts() {
    let snapshot = fold_entries(&[]);
    assert_eq!(snapshot.total_calls, 0);
    assert!(snapshot.services.is_empty());
    assert!(snapshot.endpoints.is_empty());
    assert!(snapshot.methods.is_empty());
}

#[tokio::test]
async fn compute_stats_counts_by_service_endpoint_and_method() {
    let store = Arc::new(MemoryStore::new());
    let logger = Arc::new(CallLogger::new(Some(store), 1000, common::metrics()));

    logger
        .append(&common::entry(1, "name", "GET", Some(200)))
        .await
        .unwrap();
    logger
        .append(&common::entry(1, "name", "POST", Some(200)))
        .await
        .unwrap();
    logger
        .append(&common::entry(2, "items", "GET", None))
        .await
        .unwrap();

    let stats = StatsAggregator::new(logger).compute_stats().await.unwrap();

    assert_eq!(stats.total_calls, 3);
    assert_eq!(stats.services.get(&1), Some(&2));
    assert_eq!(stats.services.get(&2), Some(&1));
    assert_eq!(stats.endpoints.get("name"), Some(&2));
    assert_eq!(stats.endpoints.get("items"), Some(&1));
    assert_eq!(stats.methods.get("GET"), Some(&2));
    assert_eq!(stats.methods.get("POST"), Some(&1));
}

#[tokio::test]
async fn compute_stats_propagates_store_unavailability() {
    let logger = Arc::new(CallLogger::new(None, 1000, common::metrics()));
    let result = StatsAggregator::new(logger).compute_stats().await;
    assert!(matches!(result, Err(StoreError::NotConfigured)));
}

fn arbitrary_entry() -> impl Strategy<Value = CallLogEntry> {
    (
        0u64..5,
        prop::sample::select(vec!["name", "items", "health"]),
        prop::sample::select(vec!["GET", "POST"]),
        prop::option::of(prop::sample::select(vec![200u16, 404, 500])),
    )
        .prop_map(|(service_id, endpoint, method, status_code)| CallLogEntry {
            timestamp: Utc::now(),
            service_id,
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            status_code,
            duration_ms: 20,
        })
}

proptest! {
    // Each of the three mappings partitions the log, so its counts must sum
    // back to the number of entries.
    #[test]
    fn every_count_mapping_sums_to_the_log_length(
        entries in prop::collection::vec(arbitrary_entry(), 0..200)
    ) {
        let snapshot = fold_entries(&entries);

        prop_assert_eq!(snapshot.total_calls, entries.len());
        prop_assert_eq!(snapshot.services.values().sum::<u64>(), entries.len() as u64);
        prop_assert_eq!(snapshot.endpoints.values().sum::<u64>(), entries.len() as u64);
        prop_assert_eq!(snapshot.methods.values().sum::<u64>(), entries.len() as u64);
    }
}
