//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs one full collection cycle on the blocking pool and
//! returns the encoded registry.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, error, instrument, warn};

use crate::state::SharedState;

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
    Timeout,
    TaskFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MetricsError::EncodingFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
            }
            MetricsError::Timeout => {
                (StatusCode::SERVICE_UNAVAILABLE, "Timed out collecting metrics").into_response()
            }
            MetricsError::TaskFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Metrics collection failed").into_response()
            }
        }
    }
}

/// Handler for the metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, MetricsError> {
    debug!("Processing metrics request");
    state.health_stats.record_http_request();

    if state.exporter.is_stalled() {
        warn!(
            "Skipping scrape: an earlier cycle is still running past its deadline ({} in flight)",
            state.exporter.cycles_in_flight()
        );
        state.health_stats.record_scrape_timeout();
        return Err(MetricsError::Timeout);
    }

    let exporter = state.exporter.clone();
    let task = tokio::task::spawn_blocking(move || exporter.scrape());

    let body = match tokio::time::timeout(state.request_timeout, task).await {
        Err(_) => {
            // The cycle keeps running on the blocking pool; its result is dropped.
            state.exporter.mark_overdue();
            warn!(
                "Scrape exceeded request timeout of {:?}, {} cycles in flight",
                state.request_timeout,
                state.exporter.cycles_in_flight()
            );
            state.health_stats.record_scrape_timeout();
            return Err(MetricsError::Timeout);
        }
        Ok(Err(e)) => {
            error!("Scrape task failed: {}", e);
            return Err(MetricsError::TaskFailed);
        }
        Ok(Ok(Err(e))) => {
            error!("Failed to encode metrics: {}", e);
            return Err(MetricsError::EncodingFailed);
        }
        Ok(Ok(Ok(body))) => body,
    };

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}
