//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();
    Html(render_index(&state))
}

fn render_index(state: &SharedState) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let metrics_path = state.config.telemetry_path();

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let health_link = if state.config.enable_health.unwrap_or(true) {
        r#"
        <li>
            <a href="/health">/health</a>
            <div class="endpoint-desc">Exporter internal health &amp; scrape statistics (text)</div>
        </li>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>ipt_NETFLOW Exporter</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .container {{ max-width: 900px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; }}
        h1 {{ color: #333; border-bottom: 3px solid #007bff; padding-bottom: 15px; }}
        .endpoint-list {{ list-style: none; padding: 0; }}
        .endpoint-list li {{ margin: 20px 0; padding: 15px; background: #f8f9fa; border-left: 4px solid #007bff; }}
        .endpoint-desc {{ color: #666; margin-top: 5px; }}
        code {{ background: #e9ecef; padding: 2px 6px; border-radius: 3px; }}
    </style>
</head>
<body>
<div class="container">
    <h1>ipt_NETFLOW Exporter</h1>
    <p>Version {version}, up {uptime}. Reading <code>{stat_file}</code>.</p>
    <ul class="endpoint-list">
        <li>
            <a href="{metrics_path}">Metrics</a>
            <div class="endpoint-desc">Prometheus-compatible metrics endpoint</div>
        </li>{health_link}
    </ul>
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        stat_file = state.config.stat_file().display(),
        metrics_path = metrics_path,
        health_link = health_link,
    )
}
