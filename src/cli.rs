//! CLI arguments and subcommands for ipt-netflow-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, environment variables and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "ipt-netflow-exporter",
    about = "Prometheus exporter for ipt_NETFLOW kernel module statistics",
    long_about = "Prometheus exporter for ipt_NETFLOW kernel module statistics.\n\n\
                  Reads /proc/net/stat/ipt_netflow_snmp on every scrape and exposes global, \
                  per-CPU and per-export-socket counters in the Prometheus text format.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long, env = "EXPORTER_PORT")]
    pub port: Option<u16>,

    /// Address to bind to (IP address or "localhost")
    #[arg(long, env = "EXPORTER_HOST")]
    pub bind: Option<String>,

    /// Path under which to expose metrics
    #[arg(long, env = "EXPORTER_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    /// Path to the ipt_NETFLOW stat file
    #[arg(long, env = "EXPORTER_IPT_NETFLOW_STAT")]
    pub stat_file: Option<PathBuf>,

    /// Maximum time in seconds to serve one scrape
    #[arg(long, env = "EXPORTER_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Export process metrics of the exporter itself
    #[arg(long, env = "EXPORTER_ENABLE_RUNTIME_METRICS")]
    pub enable_runtime_metrics: bool,

    /// Log level
    #[arg(long, value_enum, env = "EXPORTER_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, value_enum, env = "EXPORTER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Append logs to this file instead of stdout
    #[arg(long, env = "EXPORTER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long, env = "EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable internal ipt_netflow_exporter_* metrics
    #[arg(long)]
    pub disable_telemetry: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and read the stat file once
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Test stat file ingestion and print the parsed snapshot
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
