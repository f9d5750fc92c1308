//! Error types for the NSD collector.
//!
//! Every failure inside a collection cycle is a [`CollectError`]. The
//! lifecycle wraps it in one of two types so the propagation policy is
//! visible in signatures:
//!
//! - [`FatalFailure`] comes out of `init` and `check` and blocks startup.
//! - [`PartialFailure`] comes out of `collect` and only means a gap in
//!   metrics for this cycle.

use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// A single failure while resolving, running or parsing nsd-control.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("nsd-control initialization failed: {0}")]
    Initialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("nsd-control did not finish within {0:?}")]
    Timeout(Duration),

    #[error("nsd-control exited with {status}: {stderr}")]
    CommandFailed { status: ExitStatus, stderr: String },

    #[error("nsd-control I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unparsable stats output: {0}")]
    Parse(String),

    #[error("empty stats response")]
    EmptyOutput,

    #[error("unexpected stats response: no metrics found")]
    EmptyResult,

    #[error("collector is not ready (state: {0})")]
    NotReady(&'static str),
}

impl CollectError {
    /// Short, stable label for telemetry.
    pub fn reason(&self) -> &'static str {
        match self {
            CollectError::Initialization(_) => "initialization",
            CollectError::Config(_) => "config",
            CollectError::Timeout(_) => "timeout",
            CollectError::CommandFailed { .. } => "command_failed",
            CollectError::Io(_) => "io",
            CollectError::Parse(_) => "parse",
            CollectError::EmptyOutput => "empty_output",
            CollectError::EmptyResult => "empty_result",
            CollectError::NotReady(_) => "not_ready",
        }
    }
}

/// Startup failure from `init` or `check`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct FatalFailure(#[from] pub CollectError);

/// Recoverable failure of a single `collect` cycle.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PartialFailure(#[from] pub CollectError);

impl PartialFailure {
    pub fn reason(&self) -> &'static str {
        self.0.reason()
    }
}

impl FatalFailure {
    pub fn reason(&self) -> &'static str {
        self.0.reason()
    }
}

impl From<PartialFailure> for FatalFailure {
    fn from(failure: PartialFailure) -> Self {
        FatalFailure(failure.0)
    }
}
