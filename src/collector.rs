//! NSD collector lifecycle.
//!
//! `Uninitialized -> Ready -> Stopped`. A cycle runs
//! nsd-control -> parser -> known dimensions -> cache, sequentially.

use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::cache::MetricCache;
use crate::collector_config::CollectorConfig;
use crate::dimensions::fill_known_dimensions;
use crate::error::{CollectError, FatalFailure, PartialFailure};
use crate::exec::{NsdControl, StatsSource};
use crate::module::Module;
use crate::parser::parse_stats;
use crate::MetricSet;

/// Lifecycle state of a [`Collector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Ready => "ready",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects NSD statistics through a [`StatsSource`], nsd-control by default.
pub struct Collector<S = NsdControl> {
    config: CollectorConfig,
    state: LifecycleState,
    source: Option<S>,
    cache: MetricCache,
}

impl Collector<NsdControl> {
    /// Creates a collector that resolves nsd-control during `init`.
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            state: LifecycleState::Uninitialized,
            source: None,
            cache: MetricCache::new(),
        }
    }
}

impl<S: StatsSource> Collector<S> {
    /// Creates a collector around an already built source. `init` still
    /// validates the configuration but skips resolution.
    pub fn with_source(config: CollectorConfig, source: S) -> Self {
        Self {
            config,
            state: LifecycleState::Uninitialized,
            source: Some(source),
            cache: MetricCache::new(),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &MetricCache {
        &self.cache
    }

    #[instrument(skip(self))]
    pub async fn init(&mut self) -> Result<(), FatalFailure> {
        match self.state {
            LifecycleState::Ready => return Ok(()),
            LifecycleState::Stopped => {
                return Err(CollectError::Initialization("collector is stopped".into()).into())
            }
            LifecycleState::Uninitialized => {}
        }

        self.config.validate()?;

        if self.source.is_none() {
            let source = S::resolve(&self.config).map_err(|e| match e {
                CollectError::Initialization(_) => e,
                other => CollectError::Initialization(other.to_string()),
            })?;
            self.source = Some(source);
        }

        self.state = LifecycleState::Ready;
        info!("NSD collector initialized");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn check(&mut self) -> Result<(), FatalFailure> {
        let mx = self.collect().await?;
        if mx.is_empty() {
            return Err(CollectError::EmptyResult.into());
        }
        info!(metrics = mx.len(), "NSD collector check passed");
        Ok(())
    }

    /// Runs one cycle. The cache only changes when the cycle succeeds.
    pub async fn collect(&mut self) -> Result<MetricSet, PartialFailure> {
        let start = Instant::now();

        if self.state != LifecycleState::Ready {
            return Err(CollectError::NotReady(self.state.as_str()).into());
        }
        let source = self
            .source
            .as_ref()
            .ok_or(CollectError::NotReady(self.state.as_str()))?;

        let raw = source.stats().await?;
        let mut fresh = parse_stats(&raw)?;
        drop(raw);
        fill_known_dimensions(&mut fresh);

        let mx = self.cache.stabilize(fresh);
        debug!(
            metrics = mx.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "NSD collection finished"
        );
        Ok(mx)
    }

    /// Runs one cycle, logging a failure and returning an empty set instead.
    pub async fn collect_or_empty(&mut self) -> MetricSet {
        match self.collect().await {
            Ok(mx) => mx,
            Err(e) => {
                warn!("NSD collection failed: {}", e);
                MetricSet::new()
            }
        }
    }

    pub async fn cleanup(&mut self) {
        if self.state == LifecycleState::Stopped {
            return;
        }
        self.source = None;
        self.cache.clear();
        self.state = LifecycleState::Stopped;
        info!("NSD collector stopped");
    }
}

impl<S: StatsSource + Sync> Module for Collector<S> {
    async fn init(&mut self) -> Result<(), FatalFailure> {
        Collector::init(self).await
    }

    async fn check(&mut self) -> Result<(), FatalFailure> {
        Collector::check(self).await
    }

    async fn collect(&mut self) -> Result<MetricSet, PartialFailure> {
        Collector::collect(self).await
    }

    async fn cleanup(&mut self) {
        Collector::cleanup(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays canned responses, one per cycle.
    struct Replay {
        responses: Mutex<Vec<Result<Vec<u8>, CollectError>>>,
        calls: Arc<AtomicUsize>,
    }

    impl Replay {
        fn new(mut responses: Vec<Result<Vec<u8>, CollectError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl StatsSource for Replay {
        fn resolve(_config: &CollectorConfig) -> Result<Self, CollectError> {
            Err(CollectError::Initialization("replay has no binary".into()))
        }

        async fn stats(&self) -> Result<Vec<u8>, CollectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(CollectError::EmptyOutput))
        }
    }

    fn ok(text: &str) -> Result<Vec<u8>, CollectError> {
        Ok(text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_collect_before_init_is_partial_failure() {
        let mut c = Collector::with_source(CollectorConfig::default(), Replay::new(vec![]));
        let err = c.collect().await.unwrap_err();
        assert_eq!(err.reason(), "not_ready");
    }

    #[tokio::test]
    async fn test_init_without_source_fails_through_resolve() {
        let mut c: Collector<Replay> = Collector {
            config: CollectorConfig::default(),
            state: LifecycleState::Uninitialized,
            source: None,
            cache: MetricCache::new(),
        };
        let err = c.init().await.unwrap_err();
        assert_eq!(err.reason(), "initialization");
        assert_eq!(c.state(), LifecycleState::Uninitialized);
    }

    #[tokio::test]
    async fn test_init_rejects_invalid_config() {
        let cfg = CollectorConfig {
            update_every: 0,
            ..Default::default()
        };
        let mut c = Collector::with_source(cfg, Replay::new(vec![]));
        let err = c.init().await.unwrap_err();
        assert_eq!(err.reason(), "config");
    }

    #[tokio::test]
    async fn test_check_counts_one_cycle() {
        let replay = Replay::new(vec![ok("num.queries=1\n")]);
        let calls = replay.calls.clone();
        let mut c = Collector::with_source(CollectorConfig::default(), replay);
        c.init().await.unwrap();
        c.check().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_cycle_leaves_cache_untouched() {
        let replay = Replay::new(vec![
            ok("num.queries=10\nnum.tcp=2\n"),
            Err(CollectError::Timeout(std::time::Duration::from_secs(2))),
            ok("num.queries=12\n"),
        ]);
        let mut c = Collector::with_source(CollectorConfig::default(), replay);
        c.init().await.unwrap();

        let first = c.collect().await.unwrap();
        assert_eq!(first["num.tcp"], 2);
        let cached = c.cache().len();

        let err = c.collect().await.unwrap_err();
        assert_eq!(err.reason(), "timeout");
        assert_eq!(c.cache().len(), cached);
        assert_eq!(c.cache().get("num.queries"), Some(10));

        let third = c.collect().await.unwrap();
        assert_eq!(third["num.queries"], 12);
        assert_eq!(third["num.tcp"], 2);
    }

    #[tokio::test]
    async fn test_collect_or_empty_swallows_errors() {
        let replay = Replay::new(vec![ok("garbage\n")]);
        let mut c = Collector::with_source(CollectorConfig::default(), replay);
        c.init().await.unwrap();
        assert!(c.collect_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent_and_final() {
        let mut c = Collector::with_source(CollectorConfig::default(), Replay::new(vec![]));
        c.init().await.unwrap();
        c.cleanup().await;
        c.cleanup().await;
        assert_eq!(c.state(), LifecycleState::Stopped);
        assert!(c.source().is_none());
        assert!(c.init().await.is_err());
        assert_eq!(c.collect().await.unwrap_err().reason(), "not_ready");
    }
}
