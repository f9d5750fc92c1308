//! Herakles NSD Exporter Library
//!
//! This library turns the output of `nsd-control stats_noreset` into a stable
//! set of integer metrics. It is designed to be host-agnostic: a monitoring
//! agent creates a [`Collector`] through [`creator()`] and drives its lifecycle
//! (`init`, `check`, `collect`, `cleanup`) on its own schedule.
//!
//! # Features
//!
//! - **Bounded Invocation**: nsd-control runs under a timeout and is killed when it hangs
//! - **Tolerant Parsing**: Malformed lines are skipped, only unusable output is an error
//! - **Stable Key Space**: Keys seen once keep being reported with their last value
//! - **Explicit Failures**: `FatalFailure` at startup, `PartialFailure` per cycle
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_nsd_exporter::{Collector, CollectorConfig};
//!
//! # async fn run() -> Result<(), herakles_nsd_exporter::FatalFailure> {
//! let mut collector = Collector::new(CollectorConfig::default());
//! collector.init().await?;
//! collector.check().await?;
//!
//! match collector.collect().await {
//!     Ok(mx) => println!("queries: {:?}", mx.get("num.queries")),
//!     Err(e) => eprintln!("no metrics this cycle: {}", e),
//! }
//!
//! collector.cleanup().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod collector;
pub mod collector_config;
pub mod dimensions;
pub mod error;
pub mod exec;
pub mod module;
pub mod parser;

/// Metric name to value for one cycle.
pub type MetricSet = ahash::AHashMap<String, i64>;

// Re-export main types for convenience
pub use cache::MetricCache;
pub use collector::{Collector, LifecycleState};
pub use collector_config::CollectorConfig;
pub use error::{CollectError, FatalFailure, PartialFailure};
pub use exec::{NsdControl, StatsSource};
pub use module::{Creator, Defaults, Module};
pub use parser::parse_stats;

/// Collector kind name used by hosts.
pub const MODULE_NAME: &str = "nsd";

/// Creator for NSD collectors.
pub fn creator() -> Creator<Collector, CollectorConfig> {
    Creator {
        name: MODULE_NAME,
        defaults: Defaults {
            update_every: collector_config::DEFAULT_UPDATE_EVERY,
        },
        config_schema,
        create: Collector::new,
    }
}

/// JSON schema of [`CollectorConfig`] as seen by users.
pub fn config_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "NSD collector configuration",
        "type": "object",
        "properties": {
            "update_every": {
                "title": "Update every",
                "description": "Data collection interval, measured in seconds.",
                "type": "integer",
                "minimum": 1,
                "default": collector_config::DEFAULT_UPDATE_EVERY
            },
            "timeout": {
                "title": "Timeout",
                "description": "Timeout for executing nsd-control, in seconds or with a ms/s/m suffix.",
                "type": ["number", "string"],
                "default": collector_config::DEFAULT_TIMEOUT.as_secs_f64()
            },
            "binary": {
                "title": "nsd-control binary",
                "description": "Name or path of nsd-control.",
                "type": "string",
                "default": collector_config::DEFAULT_BINARY
            },
            "config_file": {
                "title": "NSD config file",
                "description": "nsd.conf passed to nsd-control with -c.",
                "type": "string"
            },
            "server": {
                "title": "Server",
                "description": "Remote NSD passed to nsd-control with -s (host[@port]).",
                "type": "string"
            }
        },
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_defaults() {
        let c = creator();
        assert_eq!(c.name, "nsd");
        assert_eq!(c.defaults.update_every, 10);
        let collector = c.create(CollectorConfig::default());
        assert_eq!(collector.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_config_schema_lists_fields() {
        let schema = config_schema();
        let props = schema["properties"].as_object().unwrap();
        for field in ["update_every", "timeout", "binary", "config_file", "server"] {
            assert!(props.contains_key(field), "missing {}", field);
        }
    }
}
