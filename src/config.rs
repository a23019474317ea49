//! Configuration management for ipt-netflow-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use crate::stat::DEFAULT_STAT_FILE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9100;
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 10;
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "json";

/// Config files tried when no path is given, first match wins.
pub const DEFAULT_CONFIG_LOCATIONS: &[&str] = &[
    "/etc/ipt-netflow-exporter/config.yaml",
    "/etc/ipt-netflow-exporter/config.yml",
    "/etc/ipt-netflow-exporter/config.json",
    "./ipt-netflow-exporter.yaml",
    "./ipt-netflow-exporter.yml",
    "./ipt-netflow-exporter.json",
];

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "warning", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Exporter configuration
///
/// Besides the flat keys, a file may use the sectioned layout with an
/// `exporter:` and a `logger:` block. Sections only fill keys the flat layout
/// left unset. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Server configuration
    pub bind: Option<String>,
    pub port: Option<u16>,
    #[serde(alias = "request-timeout")]
    pub request_timeout: Option<u64>,
    #[serde(alias = "telemetry-path")]
    pub telemetry_path: Option<String>,

    // Source
    #[serde(alias = "stat-file")]
    pub stat_file: Option<PathBuf>,

    // Feature flags
    #[serde(alias = "enable-runtime-metrics")]
    pub enable_runtime_metrics: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
    #[serde(alias = "log-format")]
    pub log_format: Option<String>,
    #[serde(alias = "log-file")]
    pub log_file: Option<PathBuf>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    // Sectioned layout, folded into the fields above on load
    #[serde(default, skip_serializing)]
    pub exporter: Option<ExporterSection>,
    #[serde(default, skip_serializing)]
    pub logger: Option<LoggerSection>,
}

/// `exporter:` block of the sectioned config layout.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    pub server_address: Option<String>,
    pub server_port: Option<u16>,
    pub request_timeout: Option<u64>,
    pub telemetry_path: Option<String>,
    pub ipt_netflow_stat: Option<PathBuf>,
    pub enable_runtime_metrics: Option<bool>,
}

/// `logger:` block of the sectioned config layout. An empty `file` means stdout.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggerSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            telemetry_path: Some(DEFAULT_TELEMETRY_PATH.to_string()),
            stat_file: Some(PathBuf::from(DEFAULT_STAT_FILE)),
            enable_runtime_metrics: Some(false),
            enable_telemetry: Some(true),
            enable_health: Some(true),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            log_format: Some(DEFAULT_LOG_FORMAT.into()),
            log_file: None,
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            exporter: None,
            logger: None,
        }
    }
}

impl Config {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn request_timeout(&self) -> u64 {
        self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn telemetry_path(&self) -> &str {
        self.telemetry_path
            .as_deref()
            .unwrap_or(DEFAULT_TELEMETRY_PATH)
    }

    pub fn stat_file(&self) -> &Path {
        self.stat_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_STAT_FILE))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_format(&self) -> &str {
        self.log_format.as_deref().unwrap_or(DEFAULT_LOG_FORMAT)
    }

    /// Moves `exporter:`/`logger:` section values into the flat fields they
    /// correspond to, without overriding flat keys.
    fn fold_sections(mut self) -> Self {
        if let Some(exporter) = self.exporter.take() {
            self.bind = self.bind.or(exporter.server_address);
            self.port = self.port.or(exporter.server_port);
            self.request_timeout = self.request_timeout.or(exporter.request_timeout);
            self.telemetry_path = self.telemetry_path.or(exporter.telemetry_path);
            self.stat_file = self.stat_file.or(exporter.ipt_netflow_stat);
            self.enable_runtime_metrics = self
                .enable_runtime_metrics
                .or(exporter.enable_runtime_metrics);
        }
        if let Some(logger) = self.logger.take() {
            self.log_level = self.log_level.or(logger.level);
            self.log_format = self.log_format.or(logger.format);
            let file = logger.file.filter(|f| !f.as_os_str().is_empty());
            self.log_file = self.log_file.or(file);
        }
        self
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind = cfg.bind();
    if bind != "localhost" && bind.parse::<IpAddr>().is_err() {
        return Err(format!(
            "Invalid bind address '{}', expected an IP address or 'localhost'",
            bind
        )
        .into());
    }

    if cfg.port() == 0 {
        return Err("port must be between 1 and 65535".into());
    }

    if cfg.request_timeout() == 0 {
        return Err("request_timeout must be greater than 0".into());
    }

    let path = cfg.telemetry_path();
    if !path.starts_with('/') || path == "/" || path == "/health" {
        return Err(format!(
            "Invalid telemetry_path '{}', must start with '/' and must not be '/' or '/health'",
            path
        )
        .into());
    }
    // axum reads these as captures or wildcards and panics on some of them
    if path.contains(['{', '}', '*']) || path.split('/').any(|seg| seg.starts_with(':')) {
        return Err(format!(
            "Invalid telemetry_path '{}', must not contain '{{', '}}', '*' or a segment starting with ':'",
            path
        )
        .into());
    }

    if cfg.stat_file().as_os_str().is_empty() {
        return Err("stat_file must not be empty".into());
    }

    let level = cfg.log_level().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(format!(
            "Invalid log_level '{}', expected one of off, error, warn, info, debug, trace",
            cfg.log_level()
        )
        .into());
    }

    let format = cfg.log_format().to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(format!(
            "Invalid log_format '{}', expected 'text' or 'json'",
            cfg.log_format()
        )
        .into());
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(format!("TLS {} file not found: {}", what, path).into());
    }
    match fs::metadata(p) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
        Ok(_) => Ok(()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI or environment (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Server settings
    if let Some(bind) = &args.bind {
        config.bind = Some(bind.clone());
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Some(timeout);
    }
    if let Some(path) = &args.telemetry_path {
        config.telemetry_path = Some(path.clone());
    }
    if let Some(stat_file) = &args.stat_file {
        config.stat_file = Some(stat_file.clone());
    }

    // Feature flags
    if args.enable_runtime_metrics {
        config.enable_runtime_metrics = Some(true);
    }
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // Logging
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(format) = args.log_format {
        config.log_format = Some(format.as_str().to_string());
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = Some(log_file.clone());
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads a config file, or the first default location that exists.
///
/// An explicitly given path must exist. Fields missing from the file fall
/// back to their defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            config
        }
        Some("toml") => {
            let config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            config
        }
        _ => {
            // Default to YAML
            let config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            config
        }
    };

    Ok(merge_defaults(config.fold_sections()))
}

/// Fills unset fields with their defaults.
fn merge_defaults(file: Config) -> Config {
    let d = Config::default();
    Config {
        bind: file.bind.or(d.bind),
        port: file.port.or(d.port),
        request_timeout: file.request_timeout.or(d.request_timeout),
        telemetry_path: file.telemetry_path.or(d.telemetry_path),
        stat_file: file.stat_file.or(d.stat_file),
        enable_runtime_metrics: file.enable_runtime_metrics.or(d.enable_runtime_metrics),
        enable_telemetry: file.enable_telemetry.or(d.enable_telemetry),
        enable_health: file.enable_health.or(d.enable_health),
        log_level: file.log_level.or(d.log_level),
        log_format: file.log_format.or(d.log_format),
        log_file: file.log_file.or(d.log_file),
        enable_tls: file.enable_tls.or(d.enable_tls),
        tls_cert_path: file.tls_cert_path.or(d.tls_cert_path),
        tls_key_path: file.tls_key_path.or(d.tls_key_path),
        exporter: None,
        logger: None,
    }
}

/// Renders a config in the requested format.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}
