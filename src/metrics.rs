//! Prometheus metrics definitions for herakles-nsd-exporter.
//!
//! Every key of the collected MetricSet becomes one `nsd_stat{name="<key>"}`
//! sample. Exporter telemetry lives under `nsd_exporter_*`.

use herakles_nsd_exporter::MetricSet;
use prometheus::{Gauge, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

/// Collection of Prometheus metrics exported by the server.
#[derive(Clone)]
pub struct NsdMetrics {
    /// labels: name
    pub stat: IntGaugeVec,

    pub collect_duration_seconds: Gauge,
    pub collect_success: IntGauge,
    pub metrics_total: IntGauge,
    /// labels: reason
    pub collect_failures_total: IntCounterVec,
}

impl NsdMetrics {
    /// Creates and registers all metrics.
    pub fn new(registry: &Registry, telemetry: bool) -> Result<Self, prometheus::Error> {
        let stat = IntGaugeVec::new(
            Opts::new(
                "nsd_stat",
                "Raw value reported by nsd-control stats_noreset, keyed by stat name",
            ),
            &["name"],
        )?;
        let collect_duration_seconds = Gauge::new(
            "nsd_exporter_collect_duration_seconds",
            "Time spent in the last nsd-control collection cycle",
        )?;
        let collect_success = IntGauge::new(
            "nsd_exporter_collect_success",
            "Whether the last collection cycle succeeded (1) or failed (0)",
        )?;
        let metrics_total = IntGauge::new(
            "nsd_exporter_metrics_total",
            "Number of NSD stats currently exported",
        )?;
        let collect_failures_total = IntCounterVec::new(
            Opts::new(
                "nsd_exporter_collect_failures_total",
                "Failed collection cycles by reason",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(stat.clone()))?;
        if telemetry {
            registry.register(Box::new(collect_duration_seconds.clone()))?;
            registry.register(Box::new(collect_success.clone()))?;
            registry.register(Box::new(metrics_total.clone()))?;
            registry.register(Box::new(collect_failures_total.clone()))?;
        }

        Ok(Self {
            stat,
            collect_duration_seconds,
            collect_success,
            metrics_total,
            collect_failures_total,
        })
    }

    /// Publishes a full MetricSet. Keys only ever get added, so nothing is
    /// reset here.
    pub fn publish(&self, mx: &MetricSet) {
        for (key, value) in mx {
            self.stat.with_label_values(&[key.as_str()]).set(*value);
        }
        self.metrics_total.set(mx.len() as i64);
    }

    /// Drops every `nsd_stat` series so a failed cycle shows up as a gap.
    pub fn clear(&self) {
        self.stat.reset();
        self.metrics_total.set(0);
    }

    pub fn record_success(&self, duration_seconds: f64) {
        self.collect_duration_seconds.set(duration_seconds);
        self.collect_success.set(1);
    }

    pub fn record_failure(&self, reason: &str, duration_seconds: f64) {
        self.collect_duration_seconds.set(duration_seconds);
        self.collect_success.set(0);
        self.collect_failures_total
            .with_label_values(&[reason])
            .inc();
    }
}
