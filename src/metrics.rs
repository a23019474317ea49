//! Prometheus metric definitions for ipt-netflow-exporter.
//!
//! Three groups of instruments mirror the three sections of the stat file:
//! unlabeled module-wide metrics, per-CPU metrics labeled `cpu`, and
//! per-socket metrics labeled `socket` and `destination`.
//!
//! Every instrument is a vec so that [`NetflowMetrics::reset`] drops all label
//! combinations; a CPU or socket that disappears from the stat file does not
//! linger as a stale series.

use prometheus::{CounterVec, GaugeVec, Opts, Registry};

use crate::stat::{CpuStat, GlobalStats, SocketStat, Snapshot};

pub const METRICS_NAMESPACE: &str = "ipt_netflow";
pub const CPU_LABEL: &str = "cpu";
pub const SOCKET_NAME_LABEL: &str = "socket";
pub const SOCKET_DST_LABEL: &str = "destination";

/// Prometheus type of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Static description of one metric family and where its value comes from.
pub struct MetricDef<T> {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub value: fn(&T) -> f64,
}

macro_rules! counter {
    ($name:literal, $help:expr, $slot:ident) => {
        MetricDef {
            name: $name,
            help: $help,
            kind: MetricKind::Counter,
            value: |s| s.$slot as f64,
        }
    };
}

macro_rules! gauge {
    ($name:literal, $help:expr, $slot:ident) => {
        MetricDef {
            name: $name,
            help: $help,
            kind: MetricKind::Gauge,
            value: |s| s.$slot as f64,
        }
    };
}

pub static GLOBAL_METRICS: &[MetricDef<GlobalStats>] = &[
    gauge!("in_bit_rate", "Total incoming bits per second.", in_bit_rate),
    gauge!("in_packet_rate", "Total incoming packets per second.", in_packet_rate),
    counter!("in_flows", "Total observed (metered) flows.", in_flows),
    counter!("in_packets", "Total metered packets. Not counting dropped packets.", in_packets),
    counter!("in_bytes", "Total metered bytes in inPackets.", in_bytes),
    gauge!(
        "hash_metrics",
        "Measure of performance of hash table. When optimal should attract to 1.0, when non-optimal will be highly above of 1.",
        hash_metric
    ),
    gauge!("hash_memory", "How much system memory is used by the hash table.", hash_memory),
    gauge!("hash_flows", "Flows currently residing in the hash table and not exported yet.", hash_flows),
    gauge!("hash_packets", "Packets in flows currently residing in the hash table.", hash_packets),
    gauge!("hash_bytes", "Bytes in flows currently residing in the hash table.", hash_bytes),
    counter!("drop_packets", "Total packets dropped by metering process.", drop_packets),
    counter!("drop_bytes", "Total bytes in packets dropped by metering process.", drop_bytes),
    gauge!("out_byte_rate", "Total exporter output bytes per second.", out_byte_rate),
    counter!("out_flows", "Total exported flow data records.", out_flows),
    counter!("out_packets", "Total exported packets of netflow stream itself.", out_packets),
    counter!("out_bytes", "Total exported bytes of netflow stream itself.", out_bytes),
    counter!(
        "lost_flows",
        "Total of accounted flows that are lost by exporting process due to socket errors. This value will not include asynchronous errors (cberr), these will be counted in lost_total.",
        lost_flows
    ),
    counter!("lost_packets", "Total metered packets lost by exporting process. See lost_flows for details.", lost_packets),
    counter!("lost_bytes", "Total bytes in packets lost by exporting process. See lost_flows for details.", lost_bytes),
    counter!("lost_total", "Total exporting sockets errors (including cberr).", err_total),
    counter!("sndbuf_peak", "Global maximum value of socket sndbuf. Sort of output queue length.", sndbuf_peak),
];

pub static CPU_METRICS: &[MetricDef<CpuStat>] = &[
    gauge!("cpu_in_packet_rate", "Incoming packets per second for this cpu.", in_packet_rate),
    counter!("cpu_in_flows", "Flows metered on this cpu.", in_flows),
    counter!("cpu_in_packets", "Packets metered for cpu.", in_packets),
    counter!("cpu_in_bytes", "Bytes metered on this cpu.", in_bytes),
    gauge!("cpu_hash_metric", "Measure of performance of hash table on this cpu.", hash_metric),
    counter!("cpu_drop_packets", "Packets dropped by metering process on this cpu.", drop_packets),
    counter!("cpu_drop_bytes", "Bytes in cpu_drop_packets for this cpu.", drop_bytes),
    counter!("cpu_err_trunc", "Truncated packets dropped for this cpu.", err_trunc),
    counter!("cpu_err_flag", "Fragmented packets dropped for this cpu.", err_frag),
    counter!("cpu_err_alloc", "Packets dropped due to memory allocation errors.", err_alloc),
    counter!("cpu_err_max_flows", "Packets dropped due to maxflows limit being reached.", err_maxflows),
];

pub static SOCKET_METRICS: &[MetricDef<SocketStat>] = &[
    counter!("socket_active", "Connection state of this socket.", active),
    counter!(
        "socket_error_connect",
        "Connections attempt count. High value usually mean that network is not set up properly, or module is loaded before network is up, in this case it is not dangerous and should be ignored.",
        err_connect
    ),
    counter!("socket_error_full", "Socket full errors on this socket. Usually mean sndbuf value is too small.", err_full),
    counter!(
        "socket_error_cberr",
        "Asynchronous callback errors on this socket. Usually mean that there is 'connection refused' errors on UDP socket reported via ICMP messages.",
        err_cberr
    ),
    counter!("socket_error_other", "All other possible errors on this socket.", err_other),
    gauge!("socket_snd_buf", "Sndbuf value for this socket. Higher value allows accommodate (exporting) traffic bursts.", sndbuf),
    gauge!(
        "socket_snd_buf_fill",
        "Amount of data currently in socket buffers. When this value will reach size sndbuf, packet loss will occur.",
        sndbuf_fill
    ),
    gauge!(
        "socket_snd_buf_peak",
        "Historical peak amount of data in socket buffers. Useful to evaluate sndbuf size, because socket_snd_buf_fill is transient.",
        sndbuf_peak
    ),
];

/// A registered counter or gauge family.
#[derive(Clone)]
enum Instrument {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

impl Instrument {
    fn new(
        name: &str,
        help: &str,
        kind: MetricKind,
        labels: &[&str],
    ) -> Result<Self, prometheus::Error> {
        let opts = Opts::new(name, help).namespace(METRICS_NAMESPACE);
        Ok(match kind {
            MetricKind::Counter => Instrument::Counter(CounterVec::new(opts, labels)?),
            MetricKind::Gauge => Instrument::Gauge(GaugeVec::new(opts, labels)?),
        })
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        match self {
            Instrument::Counter(c) => registry.register(Box::new(c.clone())),
            Instrument::Gauge(g) => registry.register(Box::new(g.clone())),
        }
    }

    fn reset(&self) {
        match self {
            Instrument::Counter(c) => c.reset(),
            Instrument::Gauge(g) => g.reset(),
        }
    }

    fn set(&self, labels: &[&str], value: f64) {
        match self {
            Instrument::Gauge(g) => g.with_label_values(labels).set(value),
            Instrument::Counter(c) => {
                // Counters carry the absolute value the kernel reports, so a
                // module reload shows up as a decrease.
                let counter = c.with_label_values(labels);
                counter.reset();
                counter.inc_by(value);
            }
        }
    }
}

/// Instruments for one section of the stat file, in definition order.
struct MetricGroup<T: 'static> {
    defs: &'static [MetricDef<T>],
    instruments: Vec<Instrument>,
}

impl<T> MetricGroup<T> {
    fn new(
        defs: &'static [MetricDef<T>],
        labels: &[&str],
        registry: &Registry,
    ) -> Result<Self, prometheus::Error> {
        let mut instruments = Vec::with_capacity(defs.len());
        for def in defs {
            let instrument = Instrument::new(def.name, def.help, def.kind, labels)?;
            instrument.register(registry)?;
            instruments.push(instrument);
        }
        Ok(Self { defs, instruments })
    }

    fn reset(&self) {
        for instrument in &self.instruments {
            instrument.reset();
        }
    }

    fn observe(&self, labels: &[&str], entry: &T) {
        for (def, instrument) in self.defs.iter().zip(&self.instruments) {
            instrument.set(labels, (def.value)(entry));
        }
    }
}

/// All ipt_NETFLOW metric families, registered once at startup.
pub struct NetflowMetrics {
    global: MetricGroup<GlobalStats>,
    cpu: MetricGroup<CpuStat>,
    socket: MetricGroup<SocketStat>,
}

impl NetflowMetrics {
    /// Creates and registers all metric families with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            global: MetricGroup::new(GLOBAL_METRICS, &[], registry)?,
            cpu: MetricGroup::new(CPU_METRICS, &[CPU_LABEL], registry)?,
            socket: MetricGroup::new(
                SOCKET_METRICS,
                &[SOCKET_NAME_LABEL, SOCKET_DST_LABEL],
                registry,
            )?,
        })
    }

    /// Drops every series of every family.
    pub fn reset(&self) {
        self.global.reset();
        self.cpu.reset();
        self.socket.reset();
    }

    /// Replaces all displayed values with the contents of `snapshot`.
    pub fn update_values(&self, snapshot: &Snapshot) {
        self.reset();

        self.global.observe(&[], &snapshot.global);

        for cpu in &snapshot.cpus {
            self.cpu.observe(&[cpu.cpu.as_str()], cpu);
        }

        for socket in &snapshot.sockets {
            self.socket
                .observe(&[socket.name.as_str(), socket.destination.as_str()], socket);
        }
    }
}
