// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(%err, "failed to encode metrics");
        }
        buffer
    }
}

/// Counters are decoration on the request path: recording never alters
/// control flow and never fails a call.
pub struct MetricsCollector {
    // Proxy metrics
    pub proxy_requests_total: IntCounterVec,
    pub proxy_request_duration_seconds: HistogramVec,
    pub upstream_failures_total: IntCounterVec,

    // Catalog cache metrics
    pub catalog_cache_hits: IntCounter,
    pub catalog_cache_misses: IntCounter,

    // Call log metrics
    pub call_log_drops: IntCounter,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let proxy_requests_total = IntCounterVec::new(
            Opts::new(
                "catalog_proxy_requests_total",
                "Total number of proxied requests",
            ),
            &["method", "status_code", "service"],
        )?;
        registry.register(Box::new(proxy_requests_total.clone()))?;

        let proxy_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "catalog_proxy_request_duration_seconds",
                "Upstream round-trip duration in seconds",
            ),
            &["service"],
        )?;
        registry.register(Box::new(proxy_request_duration_seconds.clone()))?;

        let upstream_failures_total = IntCounterVec::new(
            Opts::new(
                "catalog_proxy_upstream_failures_total",
                "Forwarding attempts that failed before an upstream status was received",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(upstream_failures_total.clone()))?;

        let catalog_cache_hits = IntCounter::new(
            "catalog_proxy_cache_hits_total",
            "Catalog list reads served from the external cache",
        )?;
        registry.register(Box::new(catalog_cache_hits.clone()))?;

        let catalog_cache_misses = IntCounter::new(
            "catalog_proxy_cache_misses_total",
            "Catalog list reads served from the in-memory catalog",
        )?;
        registry.register(Box::new(catalog_cache_misses.clone()))?;

        let call_log_drops = IntCounter::new(
            "catalog_proxy_call_log_drops_total",
            "Call log entries lost because the store rejected the append",
        )?;
        registry.register(Box::new(call_log_drops.clone()))?;

        Ok(Self {
            proxy_requests_total,
            proxy_request_duration_seconds,
            upstream_failures_total,
            catalog_cache_hits,
            catalog_cache_misses,
            call_log_drops,
        })
    }
}
