// src/health/checker.rs
use crate::store::{KvStore, StoreError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Unreachable,
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyHealth {
    pub name: String,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub endpoint: String,
}

/// On-demand snapshot of the proxy and its dependencies. Never persisted;
/// regenerated for every request.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub catalog_service: String,
    pub timestamp: DateTime<Utc>,
    pub services: Vec<DependencyHealth>,
}

/// Probes each dependency exactly once per request, independently and with
/// a short timeout. A failed probe degrades only its own entry; the report
/// itself is always produced.
pub struct HealthAggregator {
    client: Client,
    upstream: Url,
    store: Option<Arc<dyn KvStore>>,
    store_endpoint: String,
    probe_timeout: Duration,
}

impl HealthAggregator {
    pub fn new(
        upstream: Url,
        store: Option<Arc<dyn KvStore>>,
        store_endpoint: String,
        probe_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(probe_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            upstream,
            store,
            store_endpoint,
            probe_timeout,
        }
    }

    pub async fn check_health(&self) -> HealthReport {
        let (upstream, store) = tokio::join!(self.probe_upstream(), self.probe_store());

        // An unconfigured store is a deliberate deployment choice, not a
        // degradation.
        let services = vec![upstream, store];
        let degraded = services.iter().any(|dep| {
            dep.status == ProbeStatus::Unhealthy || dep.status == ProbeStatus::Unreachable
        });
        let catalog_service = if degraded { "degraded" } else { "healthy" }.to_string();

        HealthReport {
            catalog_service,
            timestamp: Utc::now(),
            services,
        }
    }

    /// One GET against the upstream root. A response is `healthy` on a
    /// success status and `unhealthy` otherwise; transport failures and
    /// timeouts are `unreachable`.
    async fn probe_upstream(&self) -> DependencyHealth {
        let start = Instant::now();
        let result = timeout(
            self.probe_timeout,
            self.client.get(self.upstream.as_str()).send(),
        )
        .await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let (status, error) = match result {
            Ok(Ok(response)) => {
                let http_status = response.status();
                if http_status.is_success() {
                    (ProbeStatus::Healthy, None)
                } else {
                    (ProbeStatus::Unhealthy, Some(format!("HTTP {}", http_status)))
                }
            }
            Ok(Err(e)) => (ProbeStatus::Unreachable, Some(e.to_string())),
            Err(_) => (ProbeStatus::Unreachable, Some("Probe timeout".to_string())),
        };

        DependencyHealth {
            name: "service-api".to_string(),
            status,
            response_time_ms: Some(response_time_ms),
            error,
            endpoint: self.upstream.to_string(),
        }
    }

    async fn probe_store(&self) -> DependencyHealth {
        let Some(store) = &self.store else {
            return DependencyHealth {
                name: "cache-store".to_string(),
                status: ProbeStatus::NotConfigured,
                response_time_ms: None,
                error: None,
                endpoint: self.store_endpoint.clone(),
            };
        };

        let start = Instant::now();
        let (status, error) = match store.ping().await {
            Ok(()) => (ProbeStatus::Healthy, None),
            Err(StoreError::Timeout) => {
                (ProbeStatus::Unreachable, Some("Probe timeout".to_string()))
            }
            Err(err) => (ProbeStatus::Unreachable, Some(err.to_string())),
        };

        DependencyHealth {
            name: "cache-store".to_string(),
            status,
            response_time_ms: Some(start.elapsed().as_millis() as u64),
            error,
            endpoint: self.store_endpoint.clone(),
        }
    }
}
