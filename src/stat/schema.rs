//! Static field tables for the stat file.
//!
//! Scalar lines are dispatched by name through [`SCALAR_FIELDS`]; `cpu<N>` and
//! `sock<N>` lines are mapped positionally through [`CPU_SCHEMA`] and
//! [`SOCKET_SCHEMA`]. Every entry pairs a declared [`FieldKind`] with a setter
//! generated by the `field!` macro, so adding a field is one table line.

use super::error::{StatError, ValueError};
use super::snapshot::{CpuStat, GlobalStats, SocketStat};
use std::num::ParseIntError;
use std::str::FromStr;

/// Number of tokens on a `cpu<N>` line, identifier included.
pub const CPU_STAT_FIELDS: usize = 12;

/// Number of tokens on a `sock<N>` line, name and destination included.
pub const SOCKET_STAT_FIELDS: usize = 10;

/// Declared type of a stat field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    U64,
    U32,
    F64,
}

/// A token after coercion to its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    U64(u64),
    U32(u32),
    F64(f64),
}

impl FieldKind {
    /// Parses a raw token. Unsigned kinds take plain digits only, without a
    /// sign, and reject anything out of range for their width.
    pub fn coerce(self, raw: &str) -> Result<FieldValue, ValueError> {
        Ok(match self {
            FieldKind::Str => FieldValue::Str(raw.to_string()),
            FieldKind::U64 => FieldValue::U64(parse_unsigned(raw)?),
            FieldKind::U32 => FieldValue::U32(parse_unsigned(raw)?),
            FieldKind::F64 => FieldValue::F64(raw.parse()?),
        })
    }
}

fn parse_unsigned<T: FromStr<Err = ParseIntError>>(raw: &str) -> Result<T, ValueError> {
    if raw.starts_with('+') {
        return Err(ValueError::Sign);
    }
    Ok(raw.parse()?)
}

/// One named slot of a stat record.
pub struct FieldSpec<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    apply: fn(&mut T, FieldValue) -> bool,
}

impl<T> FieldSpec<T> {
    /// Coerces `raw` and stores it in the slot this spec describes.
    pub fn assign(&self, target: &mut T, raw: &str) -> Result<(), StatError> {
        let value = self
            .kind
            .coerce(raw)
            .map_err(|source| StatError::MalformedValue {
                field: self.name.to_string(),
                value: raw.to_string(),
                source,
            })?;

        if (self.apply)(target, value) {
            Ok(())
        } else {
            Err(StatError::Schema {
                field: self.name,
                kind: self.kind,
            })
        }
    }
}

macro_rules! field {
    ($name:literal, $kind:ident => $slot:ident) => {
        FieldSpec {
            name: $name,
            kind: FieldKind::$kind,
            apply: |target, value| match value {
                FieldValue::$kind(v) => {
                    target.$slot = v;
                    true
                }
                _ => false,
            },
        }
    };
}

/// Scalar fields keyed by the capitalized name the kernel module prints.
pub static SCALAR_FIELDS: &[FieldSpec<GlobalStats>] = &[
    field!("InBitRate", U64 => in_bit_rate),
    field!("InPacketRate", U64 => in_packet_rate),
    field!("InFlows", U64 => in_flows),
    field!("InPackets", U64 => in_packets),
    field!("InBytes", U64 => in_bytes),
    field!("HashMetric", F64 => hash_metric),
    field!("HashMemory", U64 => hash_memory),
    field!("HashFlows", U64 => hash_flows),
    field!("HashPackets", U64 => hash_packets),
    field!("HashBytes", U64 => hash_bytes),
    field!("DropPackets", U64 => drop_packets),
    field!("DropBytes", U64 => drop_bytes),
    field!("OutByteRate", U64 => out_byte_rate),
    field!("OutFlows", U64 => out_flows),
    field!("OutPackets", U64 => out_packets),
    field!("OutBytes", U64 => out_bytes),
    field!("LostFlows", U64 => lost_flows),
    field!("LostPackets", U64 => lost_packets),
    field!("LostBytes", U64 => lost_bytes),
    field!("ErrTotal", U64 => err_total),
    field!("SndbufPeak", U64 => sndbuf_peak),
];

/// Looks up a scalar field. The stat file uses lower camel case
/// (`inBitRate`), so only the first character is case-normalized.
pub fn scalar_field(name: &str) -> Option<&'static FieldSpec<GlobalStats>> {
    let normalized = capitalize(name);
    SCALAR_FIELDS.iter().find(|spec| spec.name == normalized)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fixed positional layout of a group line.
pub struct GroupSchema<T: 'static> {
    pub kind: &'static str,
    pub fields: &'static [FieldSpec<T>],
}

impl<T: Default> GroupSchema<T> {
    /// Expected token count, identifier columns included.
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Maps the tokens of one line onto a fresh entry. Fails on the first
    /// bad token; the caller drops the entry as a whole.
    pub fn parse(&self, tokens: &[&str]) -> Result<T, StatError> {
        if tokens.len() != self.width() {
            return Err(StatError::FieldCount {
                kind: self.kind,
                expected: self.width(),
                actual: tokens.len(),
            });
        }

        let mut entry = T::default();
        for (spec, raw) in self.fields.iter().zip(tokens) {
            spec.assign(&mut entry, raw)?;
        }
        Ok(entry)
    }
}

pub static CPU_SCHEMA: GroupSchema<CpuStat> = GroupSchema {
    kind: "cpu",
    fields: &[
        field!("Cpu", Str => cpu),
        field!("CpuInPacketRate", U64 => in_packet_rate),
        field!("CpuInFlows", U64 => in_flows),
        field!("CpuInPackets", U64 => in_packets),
        field!("CpuInBytes", U64 => in_bytes),
        field!("CpuHashMetric", F64 => hash_metric),
        field!("CpuDropPackets", U64 => drop_packets),
        field!("CpuDropBytes", U64 => drop_bytes),
        field!("CpuErrTrunc", U64 => err_trunc),
        field!("CpuErrFrag", U64 => err_frag),
        field!("CpuErrAlloc", U64 => err_alloc),
        field!("CpuErrMaxflows", U64 => err_maxflows),
    ],
};

pub static SOCKET_SCHEMA: GroupSchema<SocketStat> = GroupSchema {
    kind: "socket",
    fields: &[
        field!("SockName", Str => name),
        field!("SockDestination", Str => destination),
        field!("SockActive", U32 => active),
        field!("SockErrConnect", U32 => err_connect),
        field!("SockErrFull", U32 => err_full),
        field!("SockErrCberr", U32 => err_cberr),
        field!("SockErrOther", U32 => err_other),
        field!("SockSndbuf", U32 => sndbuf),
        field!("SockSndbufFill", U32 => sndbuf_fill),
        field!("SockSndbufPeak", U32 => sndbuf_peak),
    ],
};
