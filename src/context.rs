// src/context.rs
use crate::call_log::CallLogger;
use crate::catalog::CatalogStore;
use crate::health::HealthAggregator;
use crate::proxy::Forwarder;
use crate::stats::StatsAggregator;

/// Everything a request handler needs, constructed once in `main` and
/// passed down explicitly. No component reads ambient globals.
pub struct AppContext {
    pub catalog: std::sync::Arc<CatalogStore>,
    pub logger: std::sync::Arc<CallLogger>,
    pub forwarder: Forwarder,
    pub health: HealthAggregator,
    pub stats: StatsAggregator,
}
