//! CLI command implementations for ipt-netflow-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration and stat file validation
//! - `config`: Configuration file generation
//! - `test`: Stat file ingestion testing

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
