//! Line classification and snapshot assembly.
//!
//! Scalar lines look like `inBitRate 1`, CPU lines like
//! `cpu0 1 2 3 4 1.35 5 6 7 8 9 10` and socket lines like
//! `sock0 127.0.0.1:2055 1 2 3 4 5 263 6 7`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use super::error::StatError;
use super::schema::{scalar_field, CPU_SCHEMA, SOCKET_SCHEMA};
use super::snapshot::{GlobalStats, Snapshot};

/// Where the kernel module publishes its counters.
pub const DEFAULT_STAT_FILE: &str = "/proc/net/stat/ipt_netflow_snmp";

static CPU_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^cpu\d+$").expect("valid cpu regex"));
static SOCKET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sock\d+$").expect("valid socket regex"));

/// Kind of a stat line, decided by its first token only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Scalar,
    Cpu,
    Socket,
}

/// Classifies a line from its first whitespace-separated token.
pub fn classify(first_token: Option<&str>) -> LineKind {
    match first_token {
        None => LineKind::Blank,
        Some(token) if CPU_LINE.is_match(token) => LineKind::Cpu,
        Some(token) if SOCKET_LINE.is_match(token) => LineKind::Socket,
        Some(_) => LineKind::Scalar,
    }
}

/// Anything that can produce a fresh [`Snapshot`] on demand.
pub trait SnapshotSource: Send + Sync {
    fn collect_snapshot(&self) -> Result<Snapshot, StatError>;
}

/// Reads and parses the stat file on every call.
#[derive(Debug, Clone)]
pub struct StatCollector {
    path: PathBuf,
}

impl StatCollector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for StatCollector {
    fn collect_snapshot(&self) -> Result<Snapshot, StatError> {
        let content = read_stat_file(&self.path)?;
        parse_snapshot(&content)
    }
}

/// Reads the whole stat file. Blocks; callers on an async runtime should use
/// the blocking pool.
pub fn read_stat_file(path: &Path) -> Result<String, StatError> {
    fs::read_to_string(path).map_err(|source| StatError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses the text of one stat file read.
///
/// A bad value for a known scalar field aborts the pass. Unknown scalar names
/// and malformed `cpu`/`sock` entries are logged and skipped.
pub fn parse_snapshot(content: &str) -> Result<Snapshot, StatError> {
    let mut snapshot = Snapshot::default();

    for line in content.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match classify(tokens.first().copied()) {
            LineKind::Blank => {}
            LineKind::Cpu => match CPU_SCHEMA.parse(&tokens) {
                Ok(cpu) => snapshot.cpus.push(cpu),
                Err(e) => error!("Dropping cpu stat entry {:?}: {}", tokens[0], e),
            },
            LineKind::Socket => match SOCKET_SCHEMA.parse(&tokens) {
                Ok(socket) => snapshot.sockets.push(socket),
                Err(e) => error!("Dropping socket stat entry {:?}: {}", tokens[0], e),
            },
            LineKind::Scalar => apply_scalar(&mut snapshot.global, &tokens)?,
        }
    }

    Ok(snapshot)
}

fn apply_scalar(global: &mut GlobalStats, tokens: &[&str]) -> Result<(), StatError> {
    let name = tokens[0];
    let Some(spec) = scalar_field(name) else {
        debug!(
            "Found unsupported metric in ipt_NETFLOW stat file: {}",
            StatError::UnknownField(name.to_string())
        );
        return Ok(());
    };

    let raw = tokens
        .get(1)
        .ok_or_else(|| StatError::MissingValue(spec.name.to_string()))?;
    spec.assign(global, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FILE_CONTENT: &str = "
inBitRate    1
inPacketRate 2
inFlows      3
inPackets    4
inBytes      562004
hashMetric   1.03
hashMemory   2560
hashFlows    3
hashPackets  973
hashBytes    5620
dropPackets  4
dropBytes    5
outByteRate  6
outFlows     15894
outPackets   105
outBytes     1551
lostFlows    7
lostPackets  1
lostBytes    9
errTotal     10
cpu0 1 2 3 4 1.35 5 6 7 8 9 10
cpu1 1 2 3 4 1.35 5 6 7 8 9 10
cpu2 1 2 3 4 1.35 5 6 7 8 9 10
sock0 127.0.0.1:1234 1 2 3 4 5 263 6 7
sock1 127.0.0.1:5555 1 2 3 4 5 263 6 7
sndbufPeak   0
";

    fn assert_cpu(index: usize, cpu: &crate::stat::CpuStat) {
        assert_eq!(cpu.cpu, format!("cpu{index}"));
        assert_eq!(cpu.in_packet_rate, 1);
        assert_eq!(cpu.in_flows, 2);
        assert_eq!(cpu.in_packets, 3);
        assert_eq!(cpu.in_bytes, 4);
        assert!((cpu.hash_metric - 1.35).abs() < 1e-4);
        assert_eq!(cpu.drop_packets, 5);
        assert_eq!(cpu.drop_bytes, 6);
        assert_eq!(cpu.err_trunc, 7);
        assert_eq!(cpu.err_frag, 8);
        assert_eq!(cpu.err_alloc, 9);
        assert_eq!(cpu.err_maxflows, 10);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(None), LineKind::Blank);
        assert_eq!(classify(Some("cpu0")), LineKind::Cpu);
        assert_eq!(classify(Some("cpu128")), LineKind::Cpu);
        assert_eq!(classify(Some("sock3")), LineKind::Socket);
        assert_eq!(classify(Some("cpu")), LineKind::Scalar);
        assert_eq!(classify(Some("cpuX")), LineKind::Scalar);
        assert_eq!(classify(Some("socket0")), LineKind::Scalar);
        assert_eq!(classify(Some("inBitRate")), LineKind::Scalar);
    }

    #[test]
    fn test_parse_full_file() {
        let snapshot = parse_snapshot(FILE_CONTENT).unwrap();
        let g = &snapshot.global;
        assert_eq!(g.in_bit_rate, 1);
        assert_eq!(g.in_packet_rate, 2);
        assert_eq!(g.in_flows, 3);
        assert_eq!(g.in_packets, 4);
        assert_eq!(g.in_bytes, 562004);
        assert!((g.hash_metric - 1.03).abs() < 1e-4);
        assert_eq!(g.hash_memory, 2560);
        assert_eq!(g.hash_flows, 3);
        assert_eq!(g.hash_packets, 973);
        assert_eq!(g.hash_bytes, 5620);
        assert_eq!(g.drop_packets, 4);
        assert_eq!(g.drop_bytes, 5);
        assert_eq!(g.out_byte_rate, 6);
        assert_eq!(g.out_flows, 15894);
        assert_eq!(g.out_packets, 105);
        assert_eq!(g.out_bytes, 1551);
        assert_eq!(g.lost_flows, 7);
        assert_eq!(g.lost_packets, 1);
        assert_eq!(g.lost_bytes, 9);
        assert_eq!(g.err_total, 10);
        assert_eq!(g.sndbuf_peak, 0);

        assert_eq!(snapshot.cpus.len(), 3);
        for (index, cpu) in snapshot.cpus.iter().enumerate() {
            assert_cpu(index, cpu);
        }

        assert_eq!(snapshot.sockets.len(), 2);
        assert_eq!(snapshot.sockets[0].name, "sock0");
        assert_eq!(snapshot.sockets[0].destination, "127.0.0.1:1234");
        assert_eq!(snapshot.sockets[1].name, "sock1");
        assert_eq!(snapshot.sockets[1].destination, "127.0.0.1:5555");
        assert_eq!(snapshot.sockets[1].sndbuf, 263);
    }

    #[test]
    fn test_scalars_do_not_depend_on_line_order() {
        let expected = parse_snapshot(FILE_CONTENT).unwrap().global;

        let mut reversed: Vec<&str> = FILE_CONTENT.lines().collect();
        reversed.reverse();
        let mut by_length: Vec<&str> = FILE_CONTENT.lines().collect();
        by_length.sort_by_key(|line| (line.len(), line.chars().last()));

        for lines in [reversed, by_length] {
            let shuffled = lines.join("\n");
            assert_ne!(shuffled, FILE_CONTENT);
            let snapshot = parse_snapshot(&shuffled).unwrap();
            assert_eq!(snapshot.global, expected);
            assert_eq!(snapshot.cpus.len(), 3);
            assert_eq!(snapshot.sockets.len(), 2);
        }
    }

    #[test]
    fn test_plus_sign_on_counter_is_fatal() {
        let err = parse_snapshot("inFlows 3\ninBitRate +5").unwrap_err();
        assert!(
            matches!(err, StatError::MalformedValue { ref value, .. } if value == "+5"),
            "{err}"
        );
        assert!(err.to_string().contains("must not carry a sign"), "{err}");
    }

    #[test]
    fn test_parse_int_error_is_fatal() {
        let err = parse_snapshot("inBitRate    1.2").unwrap_err();
        assert!(matches!(err, StatError::MalformedValue { .. }));
        assert!(err.to_string().contains("invalid digit"), "{err}");
    }

    #[test]
    fn test_parse_float_error_is_fatal() {
        let err = parse_snapshot("inFlows 3\nhashMetric   test").unwrap_err();
        assert!(err.to_string().contains("invalid float"), "{err}");
    }

    #[test]
    fn test_missing_scalar_value_is_fatal() {
        let err = parse_snapshot("inBitRate\n").unwrap_err();
        assert!(matches!(err, StatError::MissingValue(ref f) if f == "InBitRate"));
    }

    #[test]
    fn test_unknown_metric_is_skipped() {
        let snapshot = parse_snapshot("not_exist 123\nfutureCounter\ninFlows 3").unwrap();
        assert_eq!(snapshot.global.in_flows, 3);
    }

    #[test]
    fn test_cpu_field_count_error_drops_entry() {
        let content = "cpu0 1 2 3 4 1.35 5 6 7\ncpu1 1 2 3 4 1.35 5 6 7 8 9 10";
        let snapshot = parse_snapshot(content).unwrap();
        assert_eq!(snapshot.cpus.len(), 1);
        assert_cpu(1, &snapshot.cpus[0]);
    }

    #[test]
    fn test_bad_socket_value_drops_entry() {
        let content = "\
sock0 10.0.0.1:2055 1 2 3 4 5 5000000000 6 7
sock1 10.0.0.2:2055 1 2 3 4 5 263 6 7
sock2 10.0.0.3:2055 1 -2 3 4 5 263 6 7
";
        let snapshot = parse_snapshot(content).unwrap();
        assert_eq!(snapshot.sockets.len(), 1);
        assert_eq!(snapshot.sockets[0].name, "sock1");
    }

    #[test]
    fn test_blank_and_indented_lines() {
        let snapshot = parse_snapshot("\n\n   \n\t inBytes 42  \n\n").unwrap();
        assert_eq!(snapshot.global.in_bytes, 42);
        assert!(snapshot.cpus.is_empty());
        assert!(snapshot.sockets.is_empty());
    }

    #[test]
    fn test_collector_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FILE_CONTENT.as_bytes()).unwrap();

        let collector = StatCollector::new(file.path());
        let snapshot = collector.collect_snapshot().unwrap();
        assert_eq!(snapshot.global.in_bytes, 562004);
        assert_eq!(snapshot.cpus.len(), 3);
    }

    #[test]
    fn test_collector_missing_file() {
        let collector = StatCollector::new("/nonexistent/ipt_netflow_snmp");
        let err = collector.collect_snapshot().unwrap_err();
        assert!(matches!(err, StatError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("/nonexistent/ipt_netflow_snmp"));
    }
}
