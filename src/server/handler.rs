// src/server/handler.rs
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use crate::context::AppContext;
use crate::proxy::{ProxiedResponse, ProxyError};

#[derive(Clone)]
pub struct RequestHandler {
    ctx: Arc<AppContext>,
}

impl RequestHandler {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let ctx = self.ctx.clone();
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "request",
            %request_id,
            method = %req.method(),
            path = req.uri().path(),
        );

        Box::pin(async move { Ok(route(ctx, req).await) }.instrument(span))
    }
}

async fn route(ctx: Arc<AppContext>, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["services"]) => list_services(&ctx).await,
        ("GET", ["services", "health"]) => health(&ctx).await,
        ("GET", ["services", "logs"]) => logs(&ctx).await,
        ("GET", ["services", "stats"]) => stats(&ctx).await,
        ("GET" | "POST", ["services", "call", id, endpoint @ ..]) if !endpoint.is_empty() => {
            let id = id.to_string();
            let endpoint = endpoint.join("/");
            call(&ctx, &id, &endpoint, method.clone(), query.as_deref(), req).await
        }
        ("GET", ["services", id]) => get_service(&ctx, id),
        _ => json_error(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn list_services(ctx: &AppContext) -> Response<Body> {
    let services = ctx.catalog.list_services().await;
    json_response(StatusCode::OK, &services)
}

fn get_service(ctx: &AppContext, raw_id: &str) -> Response<Body> {
    let service = raw_id
        .parse::<u64>()
        .ok()
        .and_then(|id| ctx.catalog.get_service(id));

    match service {
        Some(service) => json_response(StatusCode::OK, service),
        None => ProxyError::ServiceNotFound.into(),
    }
}

async fn health(ctx: &AppContext) -> Response<Body> {
    let report = ctx.health.check_health().await;
    json_response(StatusCode::OK, &report)
}

async fn logs(ctx: &AppContext) -> Response<Body> {
    match ctx.logger.read_all().await {
        Ok(entries) => json_response(
            StatusCode::OK,
            &serde_json::json!({
                "total_calls": entries.len(),
                "logs": entries,
            }),
        ),
        Err(err) => {
            tracing::warn!(%err, "call log read failed");
            ProxyError::StoreUnavailable.into()
        }
    }
}

async fn stats(ctx: &AppContext) -> Response<Body> {
    match ctx.stats.compute_stats().await {
        Ok(snapshot) => json_response(StatusCode::OK, &snapshot),
        Err(err) => {
            tracing::warn!(%err, "stats aggregation failed");
            ProxyError::StoreUnavailable.into()
        }
    }
}

async fn call(
    ctx: &AppContext,
    raw_id: &str,
    endpoint: &str,
    method: Method,
    query: Option<&str>,
    req: Request<Body>,
) -> Response<Body> {
    let Ok(id) = raw_id.parse::<u64>() else {
        return ProxyError::ServiceNotFound.into();
    };

    // The inbound body is forwarded as a structured payload, so it must be
    // JSON when present.
    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => Some(value),
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "Request body must be valid JSON"),
        },
        Err(err) => {
            tracing::warn!(%err, "failed to read request body");
            return json_error(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    match ctx.forwarder.forward(id, endpoint, method, query, body).await {
        Ok(proxied) => relay_response(proxied),
        Err(err) => err.into(),
    }
}

fn relay_response(proxied: ProxiedResponse) -> Response<Body> {
    let mut builder = Response::builder().status(proxied.status);
    if let Some(content_type) = &proxied.content_type {
        builder = builder.header("Content-Type", content_type);
    }
    builder
        .body(Body::from(proxied.body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| Response::new(Body::empty())),
        Err(err) => {
            tracing::error!(%err, "failed to serialize response");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response<Body> {
    let body = serde_json::json!({ "error": message });
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
