// src/config/models.rs
use crate::catalog::ServiceStatus;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base address of the proxied backend service.
    pub url: Url,
    #[serde(default = "default_proxy_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Connection URL of the external cache store. Absent means the process
    /// runs store-less: no catalog cache, and the log/stats endpoints report
    /// the store as unavailable.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_call_log_cap")]
    pub call_log_cap: usize,
    #[serde(default = "default_store_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Static catalog entry as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_service_version")]
    pub version: String,
    pub endpoint: String,
    #[serde(default = "default_service_status")]
    pub status: ServiceStatus,
}

impl Config {
    /// Environment wins over the file for the values that differ between
    /// deployments.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("CATALOG_PROXY_UPSTREAM_URL") {
            self.upstream.url = url
                .parse()
                .context("Invalid CATALOG_PROXY_UPSTREAM_URL")?;
        }
        if let Ok(url) = std::env::var("CATALOG_PROXY_REDIS_URL") {
            self.store.redis_url = Some(url);
        }
        if let Ok(port) = std::env::var("CATALOG_PROXY_LISTEN_PORT") {
            self.listen.port = port
                .parse()
                .context("Invalid CATALOG_PROXY_LISTEN_PORT")?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            bail!("config must declare at least one service");
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(service.id) {
                bail!("duplicate service id {} in config", service.id);
            }
        }

        match self.upstream.url.scheme() {
            "http" | "https" => {}
            other => bail!("unsupported upstream scheme '{}'", other),
        }

        Ok(())
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl StoreConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            port: default_listen_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            call_log_cap: default_call_log_cap(),
            op_timeout_secs: default_store_op_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

fn default_listen_port() -> u16 {
    8080
}

fn default_proxy_timeout_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_call_log_cap() -> usize {
    1000
}

fn default_store_op_timeout_secs() -> u64 {
    2
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_service_version() -> String {
    "1.0.0".to_string()
}

fn default_service_status() -> ServiceStatus {
    ServiceStatus::Active
}
