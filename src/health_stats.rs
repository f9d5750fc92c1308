//! Collection statistics for the exporter.
//!
//! This module tracks how the nsd-control polling loop is doing: cycle
//! durations, metric counts, failures by reason and HTTP request counts.
//! The `/health` endpoint renders them as a plain-text table.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            let cutoff = now.checked_sub(Duration::from_secs(600)).unwrap_or(now);
            while guard.front().is_some_and(|&t| t < cutoff) {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            let now = Instant::now();
            let cutoff = now.checked_sub(Duration::from_secs(60)).unwrap_or(now);
            guard.iter().filter(|&&t| t >= cutoff).count() as u64
        } else {
            0
        }
    }
}

/// Statistics about the collection loop.
pub struct CollectStats {
    pub collected_metrics: Stat,
    pub collect_duration_seconds: Stat,
    pub total_cycles: AtomicU64,
    pub success_count: AtomicU64,
    pub failures: Mutex<BTreeMap<&'static str, u64>>,

    pub http_request_timestamps: RequestTimestamps,
    pub metrics_endpoint_calls: AtomicU64,

    pub start_time: Instant,
    pub last_success: StdRwLock<Option<DateTime<Utc>>>,
    pub last_error: StdRwLock<Option<String>>,
}

impl Default for CollectStats {
    fn default() -> Self {
        Self {
            collected_metrics: Stat::default(),
            collect_duration_seconds: Stat::default(),
            total_cycles: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failures: Mutex::new(BTreeMap::new()),
            http_request_timestamps: RequestTimestamps::default(),
            metrics_endpoint_calls: AtomicU64::new(0),
            start_time: Instant::now(),
            last_success: StdRwLock::new(None),
            last_error: StdRwLock::new(None),
        }
    }
}

impl CollectStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_success(&self, metrics: usize, duration_seconds: f64) {
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.collected_metrics.add_sample(metrics as f64);
        self.collect_duration_seconds.add_sample(duration_seconds);
        if let Ok(mut guard) = self.last_success.write() {
            *guard = Some(Utc::now());
        }
    }

    pub fn record_failure(&self, reason: &'static str, message: String, duration_seconds: f64) {
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        self.collect_duration_seconds.add_sample(duration_seconds);
        if let Ok(mut failures) = self.failures.lock() {
            *failures.entry(reason).or_insert(0) += 1;
        }
        if let Ok(mut guard) = self.last_error.write() {
            *guard = Some(message);
        }
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_metrics_endpoint_call(&self) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failures
            .lock()
            .map(|f| f.values().sum())
            .unwrap_or(0)
    }

    pub fn get_success_rate(&self) -> f64 {
        let total = self.total_cycles.load(Ordering::Relaxed);
        if total == 0 {
            100.0
        } else {
            (self.success_count.load(Ordering::Relaxed) as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_success_str(&self) -> String {
        self.last_success
            .read()
            .ok()
            .and_then(|guard| *guard)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn render_table(&self) -> String {
        let (cm_cur, cm_avg, cm_max, cm_min, _) = self.collected_metrics.snapshot();
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.collect_duration_seconds.snapshot();
        let total = self.total_cycles.load(Ordering::Relaxed);

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - NSD COLLECTION STATS").ok();
        writeln!(out, "======================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "COLLECTION").ok();
        writeln!(out, "----------").ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "collected_metrics",
            format!("{:.0}", cm_cur),
            format!("{:.1}", cm_avg),
            format!("{:.0}", cm_max),
            format!("{:.0}", cm_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "collect_duration (s)",
            format!("{:.3}", cd_cur),
            format!("{:.3}", cd_avg),
            format!("{:.3}", cd_max),
            format!("{:.3}", cd_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "{:left$} : {}", "total_cycles", total, left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {:.1}",
            "success_rate (%)",
            self.get_success_rate(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "last_success",
            self.get_last_success_str(),
            left = left_col
        )
        .ok();

        if let Ok(failures) = self.failures.lock() {
            if !failures.is_empty() {
                writeln!(out).ok();
                writeln!(out, "FAILURES").ok();
                writeln!(out, "--------").ok();
                for (reason, count) in failures.iter() {
                    writeln!(out, "{:left$} : {}", reason, count, left = left_col).ok();
                }
            }
        }
        if let Ok(guard) = self.last_error.read() {
            if let Some(err) = guard.as_deref() {
                writeln!(out, "{:left$} : {}", "last_error", err, left = left_col).ok();
            }
        }

        writeln!(out).ok();
        writeln!(out, "HTTP").ok();
        writeln!(out, "----").ok();
        writeln!(
            out,
            "{:left$} : {}",
            "requests_last_minute",
            self.http_request_timestamps.count_last_minute(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "metrics_endpoint_calls",
            self.metrics_endpoint_calls.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut s = RunningStat::default();
        s.add(2.0);
        s.add(4.0);
        s.add(0.0);
        assert_eq!(s.avg(), 2.0);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.last, 0.0);
    }

    #[test]
    fn test_success_rate() {
        let stats = CollectStats::new();
        assert_eq!(stats.get_success_rate(), 100.0);

        stats.record_success(120, 0.01);
        stats.record_failure("timeout", "nsd-control timed out".into(), 2.0);
        assert_eq!(stats.get_success_rate(), 50.0);
        assert_eq!(stats.failure_count(), 1);
        assert_ne!(stats.get_last_success_str(), "N/A");
    }

    #[test]
    fn test_render_table_lists_failures() {
        let stats = CollectStats::new();
        stats.record_failure("command_failed", "exit 1".into(), 0.1);
        stats.record_failure("command_failed", "exit 1".into(), 0.1);

        let table = stats.render_table();
        assert!(table.contains("command_failed"));
        assert!(table.contains("last_error"));
        assert!(table.contains("total_cycles"));
    }
}
