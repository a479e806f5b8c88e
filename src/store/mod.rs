// src/store/mod.rs
mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use async_trait::async_trait;

/// Key holding the TTL'd catalog snapshot.
pub const CATALOG_KEY: &str = "service:catalog";

/// Key holding the capped call-log list.
pub const CALL_LOG_KEY: &str = "service:call_log";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store not configured")]
    NotConfigured,

    #[error("store unreachable: {0}")]
    Unavailable(String),

    #[error("store operation timed out")]
    Timeout,

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The subset of key-value operations the proxy relies on: string get/set
/// with a TTL for the catalog snapshot, and list prepend/trim/range for the
/// call log. Implementations must bound every operation with a timeout so a
/// hung store degrades to `StoreError::Timeout` instead of hanging the
/// request.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set `key` to `value` with a time-to-live.
    async fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl: std::time::Duration,
    ) -> Result<(), StoreError>;

    /// Prepend `value` to the list at `key`.
    async fn lpush(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Keep only elements `start..=stop` of the list at `key`.
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StoreError>;

    /// Elements `start..=stop` of the list at `key`, front first.
    async fn lrange(&self, key: &str, start: isize, stop: isize)
        -> Result<Vec<String>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
