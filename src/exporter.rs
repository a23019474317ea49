//! One scrape, end to end.
//!
//! [`NetflowExporter::scrape`] reads the stat file, rebuilds every metric from
//! the fresh snapshot and encodes the registry. The whole sequence runs under
//! one lock so concurrent scrapes never observe a half-reset registry.

use prometheus::{Encoder, Gauge, Registry, TextEncoder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error};

use crate::health_stats::HealthStats;
use crate::metrics::NetflowMetrics;
use crate::stat::{Snapshot, SnapshotSource};

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Exporter self-metrics, optional.
struct Telemetry {
    scrape_duration: Gauge,
    last_scrape_success: Gauge,
}

impl Telemetry {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let scrape_duration = Gauge::new(
            "ipt_netflow_exporter_scrape_duration_seconds",
            "Time spent reading the stat file and rebuilding metrics",
        )?;
        let last_scrape_success = Gauge::new(
            "ipt_netflow_exporter_last_scrape_success",
            "Whether the last read of the stat file succeeded (1) or failed (0)",
        )?;
        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(last_scrape_success.clone()))?;
        Ok(Self {
            scrape_duration,
            last_scrape_success,
        })
    }
}

/// Options fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExporterOptions {
    /// Register `ipt_netflow_exporter_*` self-metrics.
    pub enable_telemetry: bool,
    /// Register process metrics (CPU, memory, fds) of the exporter itself.
    pub enable_runtime_metrics: bool,
}

/// Owns the registry and drives collection cycles.
pub struct NetflowExporter<S> {
    source: S,
    registry: Registry,
    metrics: NetflowMetrics,
    telemetry: Option<Telemetry>,
    health_stats: Arc<HealthStats>,
    cycle: Mutex<()>,
    /// Cycles running or waiting on `cycle`.
    in_flight: AtomicUsize,
    /// Set when a caller gave up on a cycle; cleared once no cycle is left.
    overdue: AtomicBool,
}

/// Counts a cycle as in flight until dropped.
struct InFlight<'a> {
    count: &'a AtomicUsize,
    overdue: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize, overdue: &'a AtomicBool) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self { count, overdue }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.overdue.store(false, Ordering::SeqCst);
        }
    }
}

impl<S: SnapshotSource> NetflowExporter<S> {
    /// Builds the registry and registers every instrument. Fails if an
    /// instrument cannot be registered.
    pub fn new(
        source: S,
        options: ExporterOptions,
        health_stats: Arc<HealthStats>,
    ) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let metrics = NetflowMetrics::new(&registry)?;
        debug!("ipt_NETFLOW metric families registered");

        let telemetry = if options.enable_telemetry {
            Some(Telemetry::new(&registry)?)
        } else {
            None
        };

        if options.enable_runtime_metrics {
            register_process_collector(&registry)?;
        }

        Ok(Self {
            source,
            registry,
            metrics,
            telemetry,
            health_stats,
            cycle: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
            overdue: AtomicBool::new(false),
        })
    }

    /// Number of cycles currently running or queued behind the running one.
    pub fn cycles_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Records that a caller stopped waiting for a cycle that is still running.
    pub fn mark_overdue(&self) {
        if self.cycles_in_flight() > 0 {
            self.overdue.store(true, Ordering::SeqCst);
        }
    }

    /// True while a cycle that outlived its caller's deadline has not finished.
    /// Starting another cycle then would only queue behind it.
    pub fn is_stalled(&self) -> bool {
        self.overdue.load(Ordering::SeqCst) && self.cycles_in_flight() > 0
    }

    /// Reads a fresh snapshot, falling back to an empty one on failure.
    /// Returns whether the read succeeded.
    fn acquire_snapshot(&self) -> (Snapshot, bool) {
        let parse_start = Instant::now();
        let result = self.source.collect_snapshot();
        self.health_stats
            .record_parse_duration_ms(parse_start.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(snapshot) => {
                self.health_stats.record_ingestion_success();
                (snapshot, true)
            }
            Err(e) => {
                error!("Error collecting ipt_NETFLOW metrics: {}", e);
                self.health_stats.record_ingestion_failure(&e.to_string());
                (Snapshot::empty(), false)
            }
        }
    }

    /// Runs one collection cycle and returns the encoded registry.
    ///
    /// Ingestion failures never fail the scrape; they produce zeroed metrics.
    /// The only error is a failure to encode.
    pub fn scrape(&self) -> Result<String, prometheus::Error> {
        let _in_flight = InFlight::enter(&self.in_flight, &self.overdue);
        // A panic mid-cycle leaves nothing to roll back: the next cycle
        // resets every instrument anyway.
        let _guard = self.cycle.lock().unwrap_or_else(|e| e.into_inner());
        let start = Instant::now();

        let (snapshot, success) = self.acquire_snapshot();
        self.metrics.update_values(&snapshot);

        if let Some(telemetry) = &self.telemetry {
            telemetry
                .last_scrape_success
                .set(if success { 1.0 } else { 0.0 });
            telemetry.scrape_duration.set(start.elapsed().as_secs_f64());
        }

        let serialize_start = Instant::now();
        let families = self.registry.gather();
        let mut buffer = Vec::with_capacity(BUFFER_CAP);
        TextEncoder::new().encode(&families, &mut buffer)?;

        self.health_stats
            .record_serialization_duration_ms(serialize_start.elapsed().as_secs_f64() * 1000.0);
        self.health_stats
            .record_metrics_response_size_kb(buffer.len() as f64 / 1024.0);
        let series = families.iter().map(|f| f.get_metric().len()).sum::<usize>();
        self.health_stats.record_total_time_series(series as u64);
        self.health_stats
            .record_scrape(start.elapsed().as_secs_f64() * 1000.0);

        debug!(
            "Scrape completed: {} cpus, {} sockets, {} bytes",
            snapshot.cpus.len(),
            snapshot.sockets.len(),
            buffer.len()
        );

        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry) -> Result<(), prometheus::Error> {
    let collector = prometheus::process_collector::ProcessCollector::for_self();
    registry.register(Box::new(collector))?;
    debug!("Process metrics collector registered");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry) -> Result<(), prometheus::Error> {
    tracing::warn!("Process metrics are only available on Linux");
    Ok(())
}
