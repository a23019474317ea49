//! Errors produced while ingesting the ipt_NETFLOW stat file.

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use super::schema::FieldKind;

/// A raw token that could not be coerced into its declared field kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),

    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),

    #[error("unsigned value must not carry a sign")]
    Sign,
}

/// Errors raised by one ingestion pass.
///
/// Whether an error aborts the pass depends on the line it came from: any
/// failure on a `cpu<N>`/`sock<N>` line only drops that entry, an unknown
/// scalar name is skipped, and everything else on a scalar line is fatal.
#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error("failed to read stat file {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported stat field {0}")]
    UnknownField(String),

    #[error("malformed value {value:?} for stat field {field}: {source}")]
    MalformedValue {
        field: String,
        value: String,
        #[source]
        source: ValueError,
    },

    #[error("stat field {0} has no value")]
    MissingValue(String),

    #[error("{kind} stat entry has {actual} fields, expected {expected}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("schema error: field {field} is declared as {kind:?} but its slot rejected the value")]
    Schema { field: &'static str, kind: FieldKind },
}
