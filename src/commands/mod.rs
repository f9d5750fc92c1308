//! CLI command implementations for herakles-nsd-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Requirements, configuration and one nsd-control run
//! - `config`: Configuration file generation
//! - `test`: Collection testing

pub mod check;
pub mod config;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
