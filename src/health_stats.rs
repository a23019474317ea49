//! Health statistics for the exporter.
//!
//! This module tracks scrape timing, ingestion outcomes and HTTP request
//! rates, and renders them for the `/health` endpoint.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(last, avg, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only last 10 minutes of timestamps
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > Duration::from_secs(600))
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            let now = Instant::now();
            guard
                .iter()
                .filter(|&&t| now.duration_since(t) <= Duration::from_secs(60))
                .count() as u64
        } else {
            0
        }
    }
}

/// Outcome of the most recent ingestion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastIngestion {
    None,
    Succeeded,
    Failed(String),
}

/// Health statistics for the exporter.
pub struct HealthStats {
    // Scrapes
    pub scrapes_total: AtomicU64,
    pub scrape_duration_ms: Stat,

    // Ingestion
    pub ingestion_success_count: AtomicU64,
    pub ingestion_failure_count: AtomicU64,
    pub last_ingestion: StdRwLock<LastIngestion>,
    pub last_scrape_time: StdRwLock<Option<Instant>>,

    // Timing breakdown
    pub parsing_duration_ms: Stat,
    pub serialization_duration_ms: Stat,

    // Output size
    pub metrics_response_size_kb: Stat,
    pub total_time_series: Stat,

    // HTTP server stats
    pub http_request_timestamps: RequestTimestamps,
    pub scrape_timeouts: AtomicU64,

    pub start_time: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            scrapes_total: AtomicU64::new(0),
            scrape_duration_ms: Stat::default(),
            ingestion_success_count: AtomicU64::new(0),
            ingestion_failure_count: AtomicU64::new(0),
            last_ingestion: StdRwLock::new(LastIngestion::None),
            last_scrape_time: StdRwLock::new(None),
            parsing_duration_ms: Stat::default(),
            serialization_duration_ms: Stat::default(),
            metrics_response_size_kb: Stat::default(),
            total_time_series: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            scrape_timeouts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_scrape(&self, duration_ms: f64) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_ms.add_sample(duration_ms);
        if let Ok(mut guard) = self.last_scrape_time.write() {
            *guard = Some(Instant::now());
        }
    }

    pub fn record_ingestion_success(&self) {
        self.ingestion_success_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_ingestion.write() {
            *guard = LastIngestion::Succeeded;
        }
    }

    pub fn record_ingestion_failure(&self, reason: &str) {
        self.ingestion_failure_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_ingestion.write() {
            *guard = LastIngestion::Failed(reason.to_string());
        }
    }

    pub fn record_parse_duration_ms(&self, duration_ms: f64) {
        self.parsing_duration_ms.add_sample(duration_ms);
    }

    pub fn record_serialization_duration_ms(&self, duration_ms: f64) {
        self.serialization_duration_ms.add_sample(duration_ms);
    }

    pub fn record_metrics_response_size_kb(&self, size_kb: f64) {
        self.metrics_response_size_kb.add_sample(size_kb);
    }

    pub fn record_total_time_series(&self, count: u64) {
        self.total_time_series.add_sample(count as f64);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_scrape_timeout(&self) {
        self.scrape_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scrapes_total(&self) -> u64 {
        self.scrapes_total.load(Ordering::Relaxed)
    }

    pub fn ingestion_failures(&self) -> u64 {
        self.ingestion_failure_count.load(Ordering::Relaxed)
    }

    pub fn last_ingestion(&self) -> LastIngestion {
        self.last_ingestion
            .read()
            .map(|guard| guard.clone())
            .unwrap_or(LastIngestion::None)
    }

    /// Healthy until an ingestion pass fails; a later success clears it.
    pub fn is_healthy(&self) -> bool {
        !matches!(self.last_ingestion(), LastIngestion::Failed(_))
    }

    pub fn get_ingestion_success_rate(&self) -> f64 {
        let success = self.ingestion_success_count.load(Ordering::Relaxed);
        let failure = self.ingestion_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_scrape_age_str(&self) -> String {
        match self.last_scrape_time.read() {
            Ok(guard) => match *guard {
                Some(t) => format!("{:.1}s ago", t.elapsed().as_secs_f64()),
                None => "N/A".to_string(),
            },
            Err(_) => "N/A".to_string(),
        }
    }

    pub fn render_table(&self) -> String {
        let left_col = 26usize;
        let col_w = 12usize;

        let rows = [
            ("scrape duration (ms)", self.scrape_duration_ms.snapshot()),
            ("parse duration (ms)", self.parsing_duration_ms.snapshot()),
            ("serialize duration (ms)", self.serialization_duration_ms.snapshot()),
            ("response size (KB)", self.metrics_response_size_kb.snapshot()),
            ("time series", self.total_time_series.snapshot()),
        ];

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out, "{}", "-".repeat(left_col + 4 * (col_w + 3))).ok();

        for (label, (cur, avg, max, min, _count)) in rows {
            writeln!(
                out,
                "{:left$} | {:>col$.3} | {:>col$.3} | {:>col$.3} | {:>col$.3}",
                label,
                cur,
                avg,
                max,
                min,
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "SUMMARY").ok();
        writeln!(out, "-------").ok();
        writeln!(out, "{:left$} : {}", "scrapes total", self.scrapes_total(), left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {}",
            "ingestion failures",
            self.ingestion_failures(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {:.1}%",
            "ingestion success rate",
            self.get_ingestion_success_rate(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "scrape timeouts",
            self.scrape_timeouts.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "http requests last minute",
            self.http_request_timestamps.count_last_minute(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "last scrape",
            self.get_last_scrape_age_str(),
            left = left_col
        )
        .ok();

        let last = match self.last_ingestion() {
            LastIngestion::None => "no scrape yet".to_string(),
            LastIngestion::Succeeded => "ok".to_string(),
            LastIngestion::Failed(reason) => format!("failed: {reason}"),
        };
        writeln!(out, "{:left$} : {}", "last ingestion", last, left = left_col).ok();

        out
    }
}
