//! End-to-end tests from stat file to Prometheus text output.

use ipt_netflow_exporter::{ExporterOptions, HealthStats, NetflowExporter, StatCollector};
use std::fs;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn exporter_for(file: &NamedTempFile, options: ExporterOptions) -> NetflowExporter<StatCollector> {
    NetflowExporter::new(
        StatCollector::new(file.path()),
        options,
        Arc::new(HealthStats::new()),
    )
    .unwrap()
}

/// Sample lines, ignoring `# HELP` and `# TYPE`.
fn samples(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.starts_with('#')).collect()
}

#[test]
fn test_single_entry_file_yields_one_series_per_family() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        "inBitRate 1\nhashMetric 1.03\ncpu0 1 2 3 4 1.35 5 6 7 8 9 10\nsock0 127.0.0.1:2055 1 2 3 4 5 263 6 7\n",
    )
    .unwrap();

    let exporter = exporter_for(&file, ExporterOptions::default());
    let text = exporter.scrape().unwrap();

    let families = text.lines().filter(|l| l.starts_with("# TYPE ")).count();
    assert_eq!(families, 21 + 11 + 8);
    assert_eq!(samples(&text).len(), families);

    assert!(text.contains("ipt_netflow_in_bit_rate 1\n"));
    assert!(text.contains("ipt_netflow_hash_metrics 1.03\n"));
    // Scalars absent from the file are exported as zero.
    assert!(text.contains("ipt_netflow_out_bytes 0\n"));
    assert!(text.contains("ipt_netflow_cpu_hash_metric{cpu=\"cpu0\"} 1.35\n"));
    assert!(text.contains("ipt_netflow_cpu_err_max_flows{cpu=\"cpu0\"} 10\n"));
    assert!(text.contains("socket=\"sock0\""));
    assert!(text.contains("destination=\"127.0.0.1:2055\""));
    assert!(text.contains("# TYPE ipt_netflow_in_flows counter"));
    assert!(text.contains("# TYPE ipt_netflow_socket_snd_buf gauge"));
}

#[test]
fn test_vanished_cpu_is_absent_from_next_cycle() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        "inFlows 10\ncpu0 1 2 3 4 1.35 5 6 7 8 9 10\ncpu3 1 2 3 4 1.35 5 6 7 8 9 10\n",
    )
    .unwrap();

    let exporter = exporter_for(&file, ExporterOptions::default());
    let first = exporter.scrape().unwrap();
    assert!(first.contains("cpu=\"cpu3\""));
    assert!(first.contains("ipt_netflow_in_flows 10\n"));

    fs::write(file.path(), "inFlows 12\ncpu0 1 2 3 4 1.35 5 6 7 8 9 10\n").unwrap();
    let second = exporter.scrape().unwrap();
    assert!(!second.contains("cpu=\"cpu3\""));
    assert!(second.contains("cpu=\"cpu0\""));
    // Counters carry the absolute value, not an accumulated one.
    assert!(second.contains("ipt_netflow_in_flows 12\n"));
}

#[test]
fn test_missing_file_scrape_succeeds_with_zeroes() {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();
    let exporter = NetflowExporter::new(
        StatCollector::new(&path),
        ExporterOptions {
            enable_telemetry: true,
            enable_runtime_metrics: false,
        },
        Arc::new(HealthStats::new()),
    )
    .unwrap();
    drop(file);

    let text = exporter.scrape().unwrap();
    assert!(text.contains("ipt_netflow_in_bit_rate 0\n"));
    assert!(text.contains("ipt_netflow_exporter_last_scrape_success 0\n"));
    assert!(!text.contains("cpu=\""));
}

#[test]
fn test_malformed_cpu_line_keeps_rest_of_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        "cpu0 1 2 3\ncpu1 1 2 3 4 1.35 5 6 7 8 9 10\nunknownCounter 5\ninBytes 99\n",
    )
    .unwrap();

    let exporter = exporter_for(&file, ExporterOptions::default());
    let text = exporter.scrape().unwrap();
    assert!(!text.contains("cpu=\"cpu0\""));
    assert!(text.contains("cpu=\"cpu1\""));
    assert!(text.contains("ipt_netflow_in_bytes 99\n"));
}
