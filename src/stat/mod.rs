//! Ingestion of the ipt_NETFLOW statistics file.
//!
//! This module provides:
//! - `snapshot`: typed records for one read of the file
//! - `schema`: static name and positional field tables
//! - `parser`: line classification, snapshot assembly and the file source
//! - `error`: ingestion error types

pub mod error;
pub mod parser;
pub mod schema;
pub mod snapshot;

// Re-export commonly used types
pub use error::{StatError, ValueError};
pub use parser::{
    classify, parse_snapshot, read_stat_file, LineKind, SnapshotSource, StatCollector,
    DEFAULT_STAT_FILE,
};
pub use schema::{FieldKind, FieldValue, CPU_STAT_FIELDS, SOCKET_STAT_FIELDS};
pub use snapshot::{CpuStat, GlobalStats, SocketStat, Snapshot};
