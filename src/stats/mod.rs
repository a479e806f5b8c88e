// src/stats/mod.rs
use crate::call_log::{CallLogEntry, CallLogger};
use crate::store::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Aggregated view of the call log: total calls plus per-service,
/// per-endpoint and per-method counts. Assembled on demand, never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    pub total_calls: usize,
    pub services: BTreeMap<u64, u64>,
    pub endpoints: BTreeMap<String, u64>,
    pub methods: BTreeMap<String, u64>,
}

pub struct StatsAggregator {
    logger: Arc<CallLogger>,
}

impl StatsAggregator {
    pub fn new(logger: Arc<CallLogger>) -> Self {
        Self { logger }
    }

    /// Snapshot-read the log, then fold it once. Concurrent appends during
    /// the fold may or may not be reflected.
    pub async fn compute_stats(&self) -> Result<StatsSnapshot, StoreError> {
        let entries = self.logger.read_all().await?;
        Ok(fold_entries(&entries))
    }
}

/// Single pass over a fixed log snapshot; deterministic for a given input.
pub fn fold_entries(entries: &[CallLogEntry]) -> StatsSnapshot {
    let mut snapshot = StatsSnapshot {
        total_calls: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        *snapshot.services.entry(entry.service_id).or_insert(0) += 1;
        *snapshot.endpoints.entry(entry.endpoint.clone()).or_insert(0) += 1;
        *snapshot.methods.entry(entry.method.clone()).or_insert(0) += 1;
    }

    snapshot
}
