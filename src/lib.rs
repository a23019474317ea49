//! ipt_NETFLOW Prometheus exporter.
//!
//! Reads the statistics the ipt_NETFLOW kernel module publishes under
//! `/proc/net/stat/ipt_netflow_snmp` and exposes them as Prometheus metrics.
//! Every scrape re-reads the file, so the output always reflects the module's
//! current counters; nothing is cached between scrapes.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ipt_netflow_exporter::{ExporterOptions, HealthStats, NetflowExporter, StatCollector};
//!
//! let exporter = NetflowExporter::new(
//!     StatCollector::new("/proc/net/stat/ipt_netflow_snmp"),
//!     ExporterOptions::default(),
//!     Arc::new(HealthStats::new()),
//! )
//! .unwrap();
//!
//! let body = exporter.scrape().unwrap();
//! println!("{body}");
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod exporter;
pub mod handlers;
pub mod health_stats;
pub mod logging;
pub mod metrics;
pub mod startup_checks;
pub mod stat;
pub mod state;

// Re-export main types for convenience
pub use config::Config;
pub use exporter::{ExporterOptions, NetflowExporter};
pub use health_stats::HealthStats;
pub use metrics::NetflowMetrics;
pub use stat::{parse_snapshot, Snapshot, SnapshotSource, StatCollector, StatError};
