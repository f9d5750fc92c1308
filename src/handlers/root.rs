//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

const STYLE: &str = "body{font-family:sans-serif;margin:2em auto;max-width:760px;color:#333}\
h1{border-bottom:2px solid #2a6f97;padding-bottom:.3em}\
table{border-collapse:collapse}td{padding:4px 16px 4px 0}\
td.k{color:#666}a{color:#2a6f97}.ok{color:#2b8a3e}.bad{color:#c92a2a}\
footer{margin-top:3em;font-size:.85em;color:#777}";

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.collect_stats.record_http_request();

    let uptime_secs = state.start_time.elapsed().as_secs();
    let uptime = format!(
        "{}h {}m {}s",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let nsd = &state.config.nsd;
    let (metric_count, last_ok) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.metrics.len(), snapshot.update_success)
    };
    let status = if last_ok {
        r#"<span class="ok">ok</span>"#
    } else {
        r#"<span class="bad">failing</span>"#
    };

    let health_link = if state.config.enable_health.unwrap_or(true) {
        r#"<li><a href="/health">/health</a> collection statistics (text)</li>"#
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Herakles NSD Exporter</title><style>{STYLE}</style></head>
<body>
<h1>Herakles NSD Exporter</h1>
<p>NSD statistics from <code>{binary} stats_noreset</code></p>
<table>
<tr><td class="k">Version</td><td>{version}</td></tr>
<tr><td class="k">Uptime</td><td>{uptime}</td></tr>
<tr><td class="k">Interval</td><td>{interval}s (timeout {timeout:?})</td></tr>
<tr><td class="k">Last cycle</td><td>{status}</td></tr>
<tr><td class="k">Exported stats</td><td>{metric_count}</td></tr>
</table>
<h2>Endpoints</h2>
<ul>
<li><a href="/metrics">/metrics</a> Prometheus text format</li>
{health_link}
</ul>
<footer>{FOOTER_TEXT}</footer>
</body>
</html>"#,
        binary = nsd.binary.display(),
        version = env!("CARGO_PKG_VERSION"),
        interval = nsd.update_every,
        timeout = nsd.timeout,
    );

    Html(html)
}
