// src/call_log/mod.rs
use crate::metrics::MetricsCollector;
use crate::store::{KvStore, StoreError, CALL_LOG_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one forwarded call. `status_code` is absent when the attempt
/// failed before an upstream status was received (timeout, refused
/// connection, broken response). Entries are immutable once written; only
/// the ring-buffer trim ever removes them, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub timestamp: DateTime<Utc>,
    pub service_id: u64,
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub duration_ms: u64,
}

/// Bounded call log in the external store: entries are prepended, then the
/// list is trimmed to the most recent `cap`, so it never exceeds `cap` and
/// reads back most-recent-first.
pub struct CallLogger {
    store: Option<Arc<dyn KvStore>>,
    cap: usize,
    metrics: Arc<MetricsCollector>,
}

impl CallLogger {
    pub fn new(
        store: Option<Arc<dyn KvStore>>,
        cap: usize,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            cap,
            metrics,
        }
    }

    /// Push `entry` to the front of the log, then trim to the first `cap`
    /// elements.
    pub async fn append(&self, entry: &CallLogEntry) -> Result<(), StoreError> {
        let store = self.store.as_ref().ok_or(StoreError::NotConfigured)?;
        let serialized = serde_json::to_string(entry)?;
        store.lpush(CALL_LOG_KEY, &serialized).await?;
        store.ltrim(CALL_LOG_KEY, 0, self.cap as isize - 1).await?;
        Ok(())
    }

    /// Fire-and-forget append used on the proxy path. The write happens on a
    /// detached task so a canceled request can still complete it, and a
    /// store failure costs only this entry (counted, logged at debug), never
    /// the forwarded call.
    pub fn record(self: Arc<Self>, entry: CallLogEntry) {
        tokio::spawn(async move {
            if let Err(err) = self.append(&entry).await {
                self.metrics.call_log_drops.inc();
                debug!(%err, service_id = entry.service_id, "dropped call log entry");
            }
        });
    }

    /// The full stored log, most-recent-first. A missing or unreachable
    /// store is an explicit error, distinct from an empty log.
    pub async fn read_all(&self) -> Result<Vec<CallLogEntry>, StoreError> {
        let store = self.store.as_ref().ok_or(StoreError::NotConfigured)?;
        let raw = store.lrange(CALL_LOG_KEY, 0, -1).await?;

        let mut entries = Vec::with_capacity(raw.len());
        for line in raw {
            match serde_json::from_str::<CallLogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(%err, "skipping undecodable call log entry"),
            }
        }
        Ok(entries)
    }
}
