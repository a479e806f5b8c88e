// src/proxy/forwarder.rs
// Resolves a service by id, forwards the inbound call to the upstream
// backend and hands the outcome to the call logger.

use crate::call_log::{CallLogEntry, CallLogger};
use crate::catalog::CatalogStore;
use crate::metrics::MetricsCollector;
use chrono::Utc;
use hyper::{Body, Method, Response, StatusCode};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Service not found")]
    ServiceNotFound,

    #[error("Service '{0}' is not active")]
    ServiceInactive(String),

    #[error("Upstream request timed out")]
    UpstreamTimeout,

    #[error("Service unavailable")]
    UpstreamUnavailable,

    #[error("Proxy error: {0}")]
    Internal(String),

    #[error("Cache store not available")]
    StoreUnavailable,
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::ServiceNotFound => StatusCode::NOT_FOUND,
            ProxyError::ServiceInactive(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn failure_kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamTimeout => "timeout",
            ProxyError::UpstreamUnavailable => "unreachable",
            _ => "error",
        }
    }
}

// Every user-visible failure is a JSON object with an `error` field and the
// taxonomy status, never a bare transport string.
impl From<ProxyError> for Response<Body> {
    fn from(err: ProxyError) -> Self {
        let body = serde_json::json!({ "error": err.to_string() });

        Response::builder()
            .status(err.status_code())
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }
}

/// Status, body and content type captured from the upstream response,
/// relayed verbatim to the original caller.
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub struct Forwarder {
    catalog: Arc<CatalogStore>,
    logger: Arc<CallLogger>,
    client: Client,
    upstream: Url,
    metrics: Arc<MetricsCollector>,
}

impl Forwarder {
    pub fn new(
        upstream: Url,
        proxy_timeout: Duration,
        catalog: Arc<CatalogStore>,
        logger: Arc<CallLogger>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let client = Client::builder()
            .timeout(proxy_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            catalog,
            logger,
            client,
            upstream,
            metrics,
        }
    }

    /// Forward one inbound call to the upstream backend.
    ///
    /// At most one outbound request and at most one log append happen per
    /// invocation. Unknown ids and inactive services are refused before any
    /// network I/O and leave no log entry; everything that reaches the wire
    /// is logged best-effort, with the upstream status when one was
    /// received.
    pub async fn forward(
        &self,
        service_id: u64,
        endpoint: &str,
        method: Method,
        query: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<ProxiedResponse, ProxyError> {
        let service = self
            .catalog
            .get_service(service_id)
            .ok_or(ProxyError::ServiceNotFound)?;

        if !service.status.is_active() {
            tracing::debug!(
                service = %service.name,
                status = %service.status,
                "refusing to forward to non-active service"
            );
            return Err(ProxyError::ServiceInactive(service.name.clone()));
        }

        let target = self.target_url(endpoint, query)?;
        tracing::debug!(service = %service.name, %target, %method, "forwarding request");

        let mut request = self.client.request(method.clone(), target);
        if method != Method::GET {
            if let Some(payload) = &body {
                request = request.json(payload);
            }
        }

        let start = Instant::now();
        let outcome = request.send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                let status = response.status();
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);

                match response.bytes().await {
                    Ok(bytes) => {
                        self.log_call(service_id, endpoint, &method, Some(status), duration_ms);
                        self.metrics
                            .proxy_requests_total
                            .with_label_values(&[
                                method.as_str(),
                                status.as_str(),
                                &service_id.to_string(),
                            ])
                            .inc();
                        self.metrics
                            .proxy_request_duration_seconds
                            .with_label_values(&[&service_id.to_string()])
                            .observe(duration_ms as f64 / 1000.0);

                        Ok(ProxiedResponse {
                            status,
                            content_type,
                            body: bytes.to_vec(),
                        })
                    }
                    Err(err) => {
                        self.log_call(service_id, endpoint, &method, None, duration_ms);
                        let err =
                            ProxyError::Internal(format!("failed to read upstream body: {}", err));
                        self.record_failure(&err);
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.log_call(service_id, endpoint, &method, None, duration_ms);
                let err = classify_transport_error(err);
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Upstream base joined with the requested endpoint path, query string
    /// preserved verbatim.
    fn target_url(&self, endpoint: &str, query: Option<&str>) -> Result<Url, ProxyError> {
        let mut target = self.upstream.clone();
        {
            let mut segments = target
                .path_segments_mut()
                .map_err(|_| ProxyError::Internal("upstream URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            for segment in endpoint.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        target.set_query(query);
        Ok(target)
    }

    fn log_call(
        &self,
        service_id: u64,
        endpoint: &str,
        method: &Method,
        status: Option<StatusCode>,
        duration_ms: u64,
    ) {
        self.logger.clone().record(CallLogEntry {
            timestamp: Utc::now(),
            service_id,
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            status_code: status.map(|s| s.as_u16()),
            duration_ms,
        });
    }

    fn record_failure(&self, err: &ProxyError) {
        tracing::warn!(%err, "upstream call failed");
        self.metrics
            .upstream_failures_total
            .with_label_values(&[err.failure_kind()])
            .inc();
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::UpstreamTimeout
    } else if err.is_connect() {
        ProxyError::UpstreamUnavailable
    } else {
        ProxyError::Internal(err.to_string())
    }
}
