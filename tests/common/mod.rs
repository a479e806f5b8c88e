// tests/common/mod.rs
#![allow(dead_code)]

use catalog_proxy::call_log::{CallLogEntry, CallLogger};
use catalog_proxy::catalog::{CatalogStore, Service, ServiceStatus};
use catalog_proxy::context::AppContext;
use catalog_proxy::health::HealthAggregator;
use catalog_proxy::metrics::{MetricsCollector, MetricsRegistry};
use catalog_proxy::proxy::Forwarder;
use catalog_proxy::stats::StatsAggregator;
use catalog_proxy::store::KvStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub fn metrics() -> Arc<MetricsCollector> {
    MetricsRegistry::new().unwrap().collector()
}

pub fn service(id: u64, name: &str, endpoint: &str, status: ServiceStatus) -> Service {
    Service {
        id,
        name: name.to_string(),
        description: format!("{} test service", name),
        version: "1.0.0".to_string(),
        endpoint: endpoint.to_string(),
        status,
        last_updated: Utc::now(),
    }
}

pub fn default_services() -> Vec<Service> {
    vec![
        service(1, "service-api", "/name", ServiceStatus::Active),
        service(2, "service-catalog", "/", ServiceStatus::Inactive),
    ]
}

pub fn entry(service_id: u64, endpoint: &str, method: &str, status: Option<u16>) -> CallLogEntry {
    CallLogEntry {
        timestamp: Utc::now(),
        service_id,
        endpoint: endpoint.to_string(),
        method: method.to_string(),
        status_code: status,
        duration_ms: 20,
    }
}

/// Assemble a full application context against the given upstream and store.
pub fn build_ctx(
    upstream: &str,
    store: Option<Arc<dyn KvStore>>,
    services: Vec<Service>,
) -> Arc<AppContext> {
    let upstream: Url = upstream.parse().unwrap();
    let metrics = metrics();

    let catalog = Arc::new(CatalogStore::new(
        services,
        store.clone(),
        Duration::from_secs(300),
        metrics.clone(),
    ));
    let logger = Arc::new(CallLogger::new(store.clone(), 1000, metrics.clone()));
    let forwarder = Forwarder::new(
        upstream.clone(),
        Duration::from_secs(2),
        catalog.clone(),
        logger.clone(),
        metrics.clone(),
    );
    let health = HealthAggregator::new(
        upstream,
        store,
        "memory".to_string(),
        Duration::from_secs(1),
    );
    let stats = StatsAggregator::new(logger.clone());

    Arc::new(AppContext {
        catalog,
        logger,
        forwarder,
        health,
        stats,
    })
}

/// Poll until the detached log writes land, or panic after a deadline.
pub async fn wait_for_log(logger: &CallLogger, n: usize) -> Vec<CallLogEntry> {
    for _ in 0..100 {
        if let Ok(entries) = logger.read_all().await {
            if entries.len() >= n {
                return entries;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("call log never reached {} entries", n);
}
