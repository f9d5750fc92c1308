//! Host agent boundary.
//!
//! A host owns one [`Creator`] per collector kind and calls the [`Module`]
//! lifecycle directly on the instances it creates. There is no global
//! registry: passing the creator around is the registration.

use std::future::Future;

use crate::error::{FatalFailure, PartialFailure};
use crate::MetricSet;

/// Lifecycle every collector exposes to the host.
///
/// The host serialises calls on one instance; none of these run
/// concurrently with each other.
pub trait Module: Send {
    /// Validates configuration and resolves external resources.
    fn init(&mut self) -> impl Future<Output = Result<(), FatalFailure>> + Send;

    /// Runs one collection and fails if it yields nothing.
    fn check(&mut self) -> impl Future<Output = Result<(), FatalFailure>> + Send;

    /// Runs one collection. A failure only means a gap in metrics.
    fn collect(&mut self) -> impl Future<Output = Result<MetricSet, PartialFailure>> + Send;

    /// Releases held resources. Safe to call more than once.
    fn cleanup(&mut self) -> impl Future<Output = ()> + Send;
}

/// Defaults the host applies when user configuration is silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    /// Polling interval in seconds.
    pub update_every: u64,
}

/// Factory plus metadata for one collector kind.
pub struct Creator<M, C> {
    pub name: &'static str,
    pub defaults: Defaults,
    /// JSON schema of the user-facing configuration.
    pub config_schema: fn() -> serde_json::Value,
    pub create: fn(C) -> M,
}

impl<M: Module, C> Creator<M, C> {
    /// Builds a new, uninitialized instance.
    pub fn create(&self, config: C) -> M {
        (self.create)(config)
    }
}
