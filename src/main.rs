// src/main.rs
use anyhow::Result;
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod call_log;
mod catalog;
mod config;
mod context;
mod health;
mod metrics;
mod proxy;
mod server;
mod stats;
mod store;

use crate::{
    call_log::CallLogger,
    catalog::{CatalogStore, Service},
    config::Config,
    context::AppContext,
    health::HealthAggregator,
    metrics::MetricsRegistry,
    proxy::Forwarder,
    server::{handler::RequestHandler, ServerBuilder},
    stats::StatsAggregator,
    store::{KvStore, RedisStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalog_proxy=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    // Initialize metrics
    let metrics_registry = MetricsRegistry::new()?;
    let metrics = metrics_registry.collector();

    // Connect the external store; the proxy runs degraded without it.
    let store = connect_store(&config).await;

    // Build the catalog from static configuration
    let now = chrono::Utc::now();
    let services: Vec<Service> = config
        .services
        .iter()
        .map(|svc| Service {
            id: svc.id,
            name: svc.name.clone(),
            description: svc.description.clone(),
            version: svc.version.clone(),
            endpoint: svc.endpoint.clone(),
            status: svc.status.clone(),
            last_updated: now,
        })
        .collect();

    let catalog = Arc::new(CatalogStore::new(
        services,
        store.clone(),
        config.store.cache_ttl(),
        metrics.clone(),
    ));
    info!("Catalog loaded with {} services", catalog.len());

    let logger = Arc::new(CallLogger::new(
        store.clone(),
        config.store.call_log_cap,
        metrics.clone(),
    ));

    let forwarder = Forwarder::new(
        config.upstream.url.clone(),
        config.upstream.timeout(),
        catalog.clone(),
        logger.clone(),
        metrics.clone(),
    );

    let health = HealthAggregator::new(
        config.upstream.url.clone(),
        store.clone(),
        config
            .store
            .redis_url
            .clone()
            .unwrap_or_else(|| "not configured".to_string()),
        config.upstream.probe_timeout(),
    );

    let stats = StatsAggregator::new(logger.clone());

    let ctx = Arc::new(AppContext {
        catalog,
        logger,
        forwarder,
        health,
        stats,
    });

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone()).await?;
    }

    // Create request handler
    let handler = RequestHandler::new(ctx);

    // Start main server
    let addr: SocketAddr = ([0, 0, 0, 0], config.listen.port).into();
    info!("Starting catalog proxy on {}", addr);

    tokio::select! {
        result = ServerBuilder::new(addr).with_handler(handler).serve() => result?,
        _ = shutdown_signal() => {}
    }

    Ok(())
}

async fn connect_store(config: &Config) -> Option<Arc<dyn KvStore>> {
    let url = match &config.store.redis_url {
        Some(url) => url,
        None => {
            info!("No cache store configured; logs and stats will be unavailable");
            return None;
        }
    };

    match RedisStore::connect(url, config.store.op_timeout()).await {
        Ok(store) => {
            info!("Connected to cache store");
            Some(Arc::new(store))
        }
        Err(err) => {
            warn!(%err, "cache store unreachable; continuing without it");
            None
        }
    }
}

async fn start_metrics_server(
    addr: SocketAddr,
    registry: MetricsRegistry,
    path: String,
) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    if req.uri().path() == path.as_str() {
                        let metrics = registry.gather();
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(StatusCode::OK)
                                .header("Content-Type", "text/plain; version=0.0.4")
                                .body(Body::from(metrics))
                                .unwrap(),
                        )
                    } else {
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(StatusCode::NOT_FOUND)
                                .body(Body::from("Not Found"))
                                .unwrap(),
                        )
                    }
                }
            }))
        }
    });

    let server = Server::bind(&addr).serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
