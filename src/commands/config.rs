//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(default_file_name(format)),
    };

    let mut content = render_config(&config, format)?;
    if commented {
        content = add_config_comments(content, format);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "ipt-netflow-exporter.yaml",
        ConfigFormat::Json => "ipt-netflow-exporter.json",
        ConfigFormat::Toml => "ipt-netflow-exporter.toml",
    }
}

/// Prepends a comment header. JSON has no comment syntax and is left as is.
fn add_config_comments(content: String, format: ConfigFormat) -> String {
    if matches!(format, ConfigFormat::Json) {
        return content;
    }

    let comments = r#"# ipt_NETFLOW Exporter Configuration
# ==================================
#
# Server Configuration
# --------------------
# bind: "localhost"            # IP address or "localhost"
# port: 9100                   # HTTP port
# request_timeout: 10          # Seconds allowed to serve one scrape
# telemetry_path: "/metrics"   # Path under which metrics are exposed
#
# Source
# ------
# stat_file: "/proc/net/stat/ipt_netflow_snmp"
#
# Feature Flags
# -------------
# enable_runtime_metrics: false  # Export process metrics of the exporter
# enable_telemetry: true         # Export ipt_netflow_exporter_* metrics
# enable_health: true            # Enable /health endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
# log_format: "json"           # text or json
# log_file: null               # Append to this file (null = stdout)
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
#
# Sectioned layout
# ----------------
# The same settings are also read from an `exporter:` block (server_address,
# server_port, request_timeout, telemetry_path, ipt_netflow_stat,
# enable_runtime_metrics) and a `logger:` block (level, format, file).
# Flat keys take precedence over section keys.
"#;

    format!("{comments}\n{content}")
}
