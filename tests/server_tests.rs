//! HTTP tests against a router bound to an ephemeral port.

use ipt_netflow_exporter::config::Config;
use ipt_netflow_exporter::handlers::router;
use ipt_netflow_exporter::state::AppState;
use ipt_netflow_exporter::{ExporterOptions, HealthStats, NetflowExporter, StatCollector};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn spawn_server(stat_file: &Path, config: Config) -> SocketAddr {
    let (addr, _) = spawn_server_with_timeout(stat_file, config, Duration::from_secs(5)).await;
    addr
}

async fn spawn_server_with_timeout(
    stat_file: &Path,
    config: Config,
    request_timeout: Duration,
) -> (SocketAddr, Arc<NetflowExporter<StatCollector>>) {
    let health_stats = Arc::new(HealthStats::new());
    let exporter = Arc::new(
        NetflowExporter::new(
            StatCollector::new(stat_file),
            ExporterOptions {
                enable_telemetry: true,
                enable_runtime_metrics: false,
            },
            health_stats.clone(),
        )
        .unwrap(),
    );

    let state = Arc::new(AppState {
        exporter: exporter.clone(),
        config: Arc::new(config),
        health_stats,
        request_timeout,
        start_time: Instant::now(),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    (addr, exporter)
}

/// Issues a GET and returns (status line, full response).
async fn get(addr: SocketAddr, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let status = response.lines().next().unwrap_or_default().to_string();
    (status, response)
}

#[tokio::test]
async fn test_metrics_endpoint_serves_stat_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "inBitRate 7\nsock0 10.1.1.1:2055 1 0 0 0 0 263 0 4\n").unwrap();
    let addr = spawn_server(file.path(), Config::default()).await;

    let (status, response) = get(addr, "/metrics").await;
    assert!(status.contains("200"), "{status}");
    assert!(response.contains("text/plain; version=0.0.4"));
    assert!(response.contains("ipt_netflow_in_bit_rate 7"));
    assert!(response.contains("destination=\"10.1.1.1:2055\""));
}

#[tokio::test]
async fn test_custom_telemetry_path() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "inBitRate 7\n").unwrap();
    let config = Config {
        telemetry_path: Some("/netflow".into()),
        ..Config::default()
    };
    let addr = spawn_server(file.path(), config).await;

    let (status, _) = get(addr, "/netflow").await;
    assert!(status.contains("200"), "{status}");
    let (status, _) = get(addr, "/metrics").await;
    assert!(status.contains("404"), "{status}");

    let (status, index) = get(addr, "/").await;
    assert!(status.contains("200"), "{status}");
    assert!(index.contains("href=\"/netflow\""));
}

#[tokio::test]
async fn test_health_reflects_last_ingestion() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "inBitRate 7\n").unwrap();
    let addr = spawn_server(file.path(), Config::default()).await;

    let (status, body) = get(addr, "/health").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains("No scrape yet"));

    fs::write(file.path(), "hashMetric fast\n").unwrap();
    let (status, _) = get(addr, "/metrics").await;
    assert!(status.contains("200"), "{status}");

    let (status, body) = get(addr, "/health").await;
    assert!(status.contains("503"), "{status}");
    assert!(body.contains("Stat file ingestion failed"));

    fs::write(file.path(), "hashMetric 1.5\n").unwrap();
    get(addr, "/metrics").await;
    let (status, _) = get(addr, "/health").await;
    assert!(status.contains("200"), "{status}");
}

#[tokio::test]
async fn test_health_can_be_disabled() {
    let file = NamedTempFile::new().unwrap();
    let config = Config {
        enable_health: Some(false),
        ..Config::default()
    };
    let addr = spawn_server(file.path(), config).await;

    let (status, _) = get(addr, "/health").await;
    assert!(status.contains("404"), "{status}");
}

#[cfg(unix)]
#[tokio::test]
async fn test_hung_read_does_not_queue_more_cycles() {
    // Opening a FIFO with no writer blocks, like a stalled /proc read.
    let dir = tempfile::TempDir::new().unwrap();
    let fifo = dir.path().join("ipt_netflow_snmp");
    let made = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(made.success());

    let (addr, exporter) =
        spawn_server_with_timeout(&fifo, Config::default(), Duration::from_millis(200)).await;

    let (status, _) = get(addr, "/metrics").await;
    assert!(status.contains("503"), "{status}");
    assert!(exporter.is_stalled());

    let started = Instant::now();
    let (status, _) = get(addr, "/metrics").await;
    assert!(status.contains("503"), "{status}");
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(exporter.cycles_in_flight(), 1);

    // Unblock the read; the stalled cycle finishes and clears the state.
    let writer = fifo.clone();
    tokio::task::spawn_blocking(move || fs::write(writer, "inBitRate 3\n"))
        .await
        .unwrap()
        .unwrap();
    for _ in 0..250 {
        if exporter.cycles_in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(exporter.cycles_in_flight(), 0);
    assert!(!exporter.is_stalled());
}
