// src/catalog/service.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational status of a catalog entry. Only `active` services are
/// forwarded to; anything else is refused before any network I/O. Operators
/// may set arbitrary status strings ("maintenance", "draining", ...), which
/// round-trip through the `Other` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
    #[serde(untagged)]
    Other(String),
}

impl ServiceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ServiceStatus::Active)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Active => f.write_str("active"),
            ServiceStatus::Inactive => f.write_str("inactive"),
            ServiceStatus::Other(s) => f.write_str(s),
        }
    }
}

/// One registered backend service. Built from static configuration at
/// process start and immutable for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub version: String,
    pub endpoint: String,
    pub status: ServiceStatus,
    pub last_updated: DateTime<Utc>,
}
