// tests/catalog_tests.rs
mod common;

use async_trait::async_trait;
use catalog_proxy::catalog::CatalogStore;
use catalog_proxy::store::{KvStore, MemoryStore, StoreError, CATALOG_KEY};
use std::sync::Arc;
use std::time::Duration;

struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("injected".to_string()))
    }

    async fn set_ex(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("injected".to_string()))
    }

    async fn lpush(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("injected".to_string()))
    }

    async fn ltrim(&self, _key: &str, _start: isize, _stop: isize) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("injected".to_string()))
    }

    async fn lrange(
        &self,
        _key: &str,
        _start: isize,
        _stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("injected".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("injected".to_string()))
    }
}

#[tokio::test]
async fn get_service_resolves_every_configured_id() {
    let metrics = common::metrics();
    let catalog = CatalogStore::new(
        common::default_services(),
        None,
        Duration::from_secs(300),
        metrics,
    );

    for id in [1u64, 2] {
        let service = catalog.get_service(id).expect("configured id must resolve");
        assert_eq!(service.id, id);
    }
}

#[tokio::test]
async fn get_service_signals_not_found_for_unknown_ids() {
    let metrics = common::metrics();
    let catalog = CatalogStore::new(
        common::default_services(),
        None,
        Duration::from_secs(300),
        metrics,
    );

    assert!(catalog.get_service(999).is_none());
    assert!(catalog.get_service(0).is_none());
}

#[tokio::test]
async fn list_services_writes_byte_identical_cache_entry() {
    let store = Arc::new(MemoryStore::new());
    let metrics = common::metrics();
    let catalog = CatalogStore::new(
        common::default_services(),
        Some(store.clone()),
        Duration::from_secs(300),
        metrics,
    );

    let listed = catalog.list_services().await;

    let cached = store
        .get(CATALOG_KEY)
        .await
        .unwrap()
        .expect("cache entry must be written on miss");
    assert_eq!(cached, serde_json::to_string(&listed).unwrap());
}

#[tokio::test]
async fn cached_catalog_round_trips_field_for_field() {
    let store = Arc::new(MemoryStore::new());
    let metrics = common::metrics();
    let catalog = CatalogStore::new(
        common::default_services(),
        Some(store.clone()),
        Duration::from_secs(300),
        metrics.clone(),
    );

    let first = catalog.list_services().await;
    let second = catalog.list_services().await;

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    // First read missed and populated the cache, second was served from it.
    assert_eq!(metrics.catalog_cache_misses.get(), 1);
    assert_eq!(metrics.catalog_cache_hits.get(), 1);
}

#[tokio::test]
async fn cache_entry_expires_after_ttl() {
    let store = Arc::new(MemoryStore::new());
    let metrics = common::metrics();
    let catalog = CatalogStore::new(
        common::default_services(),
        Some(store.clone()),
        Duration::from_millis(50),
        metrics,
    );

    catalog.list_services().await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(store.get(CATALOG_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn store_failures_never_fail_the_read() {
    let metrics = common::metrics();
    let catalog = CatalogStore::new(
        common::default_services(),
        Some(Arc::new(FailingStore)),
        Duration::from_secs(300),
        metrics,
    );

    let services = catalog.list_services().await;
    assert_eq!(services.len(), 2);
}
