//! Background polling loop.
//!
//! Drives one collector on its configured interval, publishes each
//! successful MetricSet into the shared snapshot and Prometheus registry,
//! and records failures without ever stopping the loop.

use herakles_nsd_exporter::{Module, PartialFailure};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::state::SharedState;

/// Runs one collection cycle and publishes its outcome.
#[instrument(skip(state, module))]
pub async fn collect_once<M: Module>(
    state: &SharedState,
    module: &mut M,
) -> Result<usize, PartialFailure> {
    let start = Instant::now();

    {
        let mut snapshot = state.snapshot.write().await;
        snapshot.is_updating = true;
    }

    let result = module.collect().await;
    let elapsed = start.elapsed().as_secs_f64();

    let mut snapshot = state.snapshot.write().await;
    snapshot.is_updating = false;
    snapshot.update_duration_seconds = elapsed;

    match result {
        Ok(mx) => {
            let count = mx.len();
            state.metrics.publish(&mx);
            state.metrics.record_success(elapsed);
            state.collect_stats.record_success(count, elapsed);

            snapshot.metrics = mx;
            snapshot.last_updated = Some(Instant::now());
            snapshot.update_success = true;

            debug!("Published {} NSD metrics in {:.3}s", count, elapsed);
            Ok(count)
        }
        Err(e) => {
            // The core cache survives; only the published view goes empty.
            snapshot.metrics.clear();
            snapshot.update_success = false;
            state.metrics.clear();
            state.metrics.record_failure(e.reason(), elapsed);
            state
                .collect_stats
                .record_failure(e.reason(), e.to_string(), elapsed);

            warn!("NSD collection failed ({}): {}", e.reason(), e);
            Err(e)
        }
    }
}

/// Polls until `shutdown` flips to true, then cleans the module up.
pub async fn run_poller<M: Module>(
    state: SharedState,
    mut module: M,
    update_every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(update_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Poller started, interval {:?}", update_every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let _ = collect_once(&state, &mut module).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    module.cleanup().await;
    info!("Poller stopped");
}
