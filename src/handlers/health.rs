//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! collection statistics and the state of the last nsd-control cycle.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-nsd-exporter — More info: https://www.herakles.now — Support: exporter@herakles.now";

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    state.collect_stats.record_http_request();

    let snapshot = state.snapshot.read().await;

    let status = if snapshot.update_success && snapshot.last_updated.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let message = if snapshot.is_updating {
        "OK - Collecting"
    } else if snapshot.update_success {
        "OK"
    } else if snapshot.last_updated.is_some() {
        "Last collection failed - NSD stats withheld until the next successful cycle"
    } else {
        "No successful collection yet"
    };
    let metric_count = snapshot.metrics.len();
    drop(snapshot);

    let uptime_hours = state.collect_stats.get_uptime_seconds() as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let table = state.collect_stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "{message}\n\nUptime: {uptime_str}\nExported stats: {metric_count}\n\n{table}\n{FOOTER_TEXT}"
        ),
    )
}
