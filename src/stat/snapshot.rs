//! Typed view of one `ipt_netflow_snmp` read.
//!
//! Field order of [`CpuStat`] and [`SocketStat`] mirrors the column order the
//! kernel module prints; the positional schemas in `schema.rs` depend on it.

use serde::Serialize;

/// Module-wide counters and gauges (the `name value` lines).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub in_bit_rate: u64,
    pub in_packet_rate: u64,
    pub in_flows: u64,
    pub in_packets: u64,
    pub in_bytes: u64,
    /// Hash table efficiency; close to 1.0 when optimal.
    pub hash_metric: f64,
    pub hash_memory: u64,
    pub hash_flows: u64,
    pub hash_packets: u64,
    pub hash_bytes: u64,
    pub drop_packets: u64,
    pub drop_bytes: u64,
    pub out_byte_rate: u64,
    pub out_flows: u64,
    pub out_packets: u64,
    pub out_bytes: u64,
    pub lost_flows: u64,
    pub lost_packets: u64,
    pub lost_bytes: u64,
    pub err_total: u64,
    pub sndbuf_peak: u64,
}

/// One `cpu<N>` line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuStat {
    pub cpu: String,
    pub in_packet_rate: u64,
    pub in_flows: u64,
    pub in_packets: u64,
    pub in_bytes: u64,
    pub hash_metric: f64,
    pub drop_packets: u64,
    pub drop_bytes: u64,
    pub err_trunc: u64,
    pub err_frag: u64,
    pub err_alloc: u64,
    pub err_maxflows: u64,
}

/// One `sock<N>` line describing an export socket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocketStat {
    pub name: String,
    pub destination: String,
    pub active: u32,
    pub err_connect: u32,
    pub err_full: u32,
    pub err_cberr: u32,
    pub err_other: u32,
    pub sndbuf: u32,
    pub sndbuf_fill: u32,
    pub sndbuf_peak: u32,
}

/// Result of one ingestion pass. Built once, read once, then dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub global: GlobalStats,
    /// CPU entries in file order.
    pub cpus: Vec<CpuStat>,
    /// Socket entries in file order.
    pub sockets: Vec<SocketStat>,
}

impl Snapshot {
    /// The all-zero snapshot served when ingestion fails.
    pub fn empty() -> Self {
        Self::default()
    }
}
