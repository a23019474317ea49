//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::exporter::NetflowExporter;
use crate::health_stats::HealthStats;
use crate::stat::StatCollector;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub exporter: Arc<NetflowExporter<StatCollector>>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Upper bound for serving one scrape.
    pub request_timeout: Duration,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
