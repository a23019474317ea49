//! ipt-netflow-exporter
//!
//! Prometheus exporter for ipt_NETFLOW kernel module statistics.
//! This is the main entry point that initializes the server and handles subcommands.

use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn};

use ipt_netflow_exporter::cli::{Args, Commands};
use ipt_netflow_exporter::commands::{command_check, command_config, command_test};
use ipt_netflow_exporter::config::{resolve_config, show_config, validate_effective_config, Config};
use ipt_netflow_exporter::exporter::{ExporterOptions, NetflowExporter};
use ipt_netflow_exporter::handlers::router;
use ipt_netflow_exporter::health_stats::HealthStats;
use ipt_netflow_exporter::logging::setup_logging;
use ipt_netflow_exporter::startup_checks;
use ipt_netflow_exporter::stat::StatCollector;
use ipt_netflow_exporter::state::AppState;

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves the listen address. `localhost` goes through the system resolver.
async fn resolve_listen_addr(bind: &str, port: u16) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    if let Ok(ip) = bind.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    tokio::net::lookup_host((bind, port))
        .await?
        .next()
        .ok_or_else(|| format!("Could not resolve bind address '{}'", bind).into())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), *format, *commented);
        }

        let config = load_validated_config(&args)?;

        return match command {
            Commands::Check => command_check(&config),
            Commands::Test { iterations, format } => command_test(*iterations, *format, &config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config)?;

    info!("Starting ipt-netflow-exporter {}", env!("CARGO_PKG_VERSION"));

    let stat_file = config.stat_file().to_path_buf();
    if let Err(e) = startup_checks::validate_requirements(&stat_file) {
        warn!("Startup validation failed: {}", e);
        warn!("   The exporter will start and serve zeroed metrics until the file is readable");
    }

    let health_stats = Arc::new(HealthStats::new());
    let options = ExporterOptions {
        enable_telemetry: config.enable_telemetry.unwrap_or(true),
        enable_runtime_metrics: config.enable_runtime_metrics.unwrap_or(false),
    };
    let exporter = NetflowExporter::new(
        StatCollector::new(&stat_file),
        options,
        health_stats.clone(),
    )?;
    debug!("All metrics registered successfully");

    let state = Arc::new(AppState {
        exporter: Arc::new(exporter),
        config: Arc::new(config.clone()),
        health_stats,
        request_timeout: Duration::from_secs(config.request_timeout()),
        start_time: Instant::now(),
    });

    let app = router(state);

    let bind = config.bind();
    let port = config.port();
    let addr = resolve_listen_addr(bind, port).await?;
    let telemetry_path = config.telemetry_path();

    if config.enable_tls.unwrap_or(false) {
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            return Err("TLS is enabled but certificate or key path is missing".into());
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        info!(
            "ipt-netflow-exporter listening on https://{}{}",
            addr, telemetry_path
        );

        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .map_err(|e| {
                error!("Server error: {}", e);
                e
            })?;
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "ipt-netflow-exporter listening on http://{}{}",
            addr, telemetry_path
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("Server error: {}", e);
                e
            })?;
    }

    info!("ipt-netflow-exporter stopped gracefully");
    Ok(())
}
