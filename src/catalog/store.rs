// src/catalog/store.rs
use super::Service;
use crate::metrics::MetricsCollector;
use crate::store::{KvStore, CATALOG_KEY};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Authoritative, in-process catalog of known services. The external store
/// only ever holds a TTL'd copy used to accelerate `list_services`; it is
/// regenerated from here on every miss and never consulted for lookups.
pub struct CatalogStore {
    services: Vec<Service>,
    by_id: HashMap<u64, usize>,
    store: Option<Arc<dyn KvStore>>,
    cache_ttl: Duration,
    metrics: Arc<MetricsCollector>,
}

impl CatalogStore {
    pub fn new(
        services: Vec<Service>,
        store: Option<Arc<dyn KvStore>>,
        cache_ttl: Duration,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let by_id = services
            .iter()
            .enumerate()
            .map(|(index, service)| (service.id, index))
            .collect();

        Self {
            services,
            by_id,
            store,
            cache_ttl,
            metrics,
        }
    }

    /// Full catalog in configuration order. Read-through: a valid cache
    /// entry is returned as-is; on a miss the in-memory catalog is returned
    /// and written back with the configured TTL. Store failures only cost
    /// the acceleration, never the read.
    pub async fn list_services(&self) -> Vec<Service> {
        let Some(store) = &self.store else {
            return self.services.clone();
        };

        match store.get(CATALOG_KEY).await {
            Ok(Some(cached)) => match serde_json::from_str::<Vec<Service>>(&cached) {
                Ok(services) => {
                    self.metrics.catalog_cache_hits.inc();
                    return services;
                }
                Err(err) => {
                    warn!(%err, "discarding undecodable catalog cache entry");
                }
            },
            Ok(None) => {}
            Err(err) => {
                debug!(%err, "catalog cache read failed");
            }
        }

        self.metrics.catalog_cache_misses.inc();
        match serde_json::to_string(&self.services) {
            Ok(snapshot) => {
                if let Err(err) = store.set_ex(CATALOG_KEY, &snapshot, self.cache_ttl).await {
                    debug!(%err, "catalog cache write failed");
                }
            }
            Err(err) => {
                warn!(%err, "failed to serialize catalog for caching");
            }
        }

        self.services.clone()
    }

    /// Lookup by identity. Always answered from the in-memory catalog.
    pub fn get_service(&self, id: u64) -> Option<&Service> {
        self.by_id.get(&id).map(|&index| &self.services[index])
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
