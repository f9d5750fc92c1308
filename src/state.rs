//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and updated by the background poller.

use herakles_nsd_exporter::MetricSet;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::health_stats::CollectStats;
use crate::metrics::NsdMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Latest published collection result.
#[derive(Clone, Default)]
pub struct MetricsSnapshot {
    pub metrics: MetricSet,
    pub last_updated: Option<Instant>,
    pub update_duration_seconds: f64,
    pub update_success: bool,
    pub is_updating: bool,
}

/// Global application state shared across requests and background tasks.
pub struct AppState {
    pub registry: Registry,
    pub metrics: NsdMetrics,
    pub snapshot: RwLock<MetricsSnapshot>,
    pub config: Arc<Config>,
    pub collect_stats: Arc<CollectStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        registry: Registry,
        metrics: NsdMetrics,
        config: Config,
        collect_stats: Arc<CollectStats>,
    ) -> Self {
        Self {
            registry,
            metrics,
            snapshot: RwLock::new(MetricsSnapshot::default()),
            config: Arc::new(config),
            collect_stats,
            start_time: Instant::now(),
        }
    }
}
