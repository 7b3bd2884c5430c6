//! Record ingestion for ip2asn snapshots.
//!
//! Turns tab-separated rows into validated [`RangeRecord`]s. Any malformed
//! row is fatal: the snapshot is trusted, so a bad row means a bad snapshot
//! and no partial result is produced.

pub mod reader;
pub mod record;

use std::io;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

use crate::ip::RangeError;

pub use reader::RecordReader;
pub use record::{parse_line, IngestStats, LineOutcome, RangeRecord, FIELD_COUNT};

/// Ingestion policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Drop ranges whose start or end lies in private address space
    pub strip_private: bool,
}

/// Errors raised while reading a snapshot
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("line {line}: expected 5 tab-separated fields, found {found}")]
    MissingField { line: usize, found: usize },

    #[error("line {line}: invalid {field} address '{value}'")]
    InvalidAddress {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: invalid ASN '{value}'")]
    InvalidAsn {
        line: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("line {line}: {source}")]
    InvalidRange {
        line: usize,
        #[source]
        source: RangeError,
    },

    #[error("failed to read line {line}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    /// 1-based line the error was raised on
    pub fn line(&self) -> usize {
        match self {
            IngestError::MissingField { line, .. }
            | IngestError::InvalidAddress { line, .. }
            | IngestError::InvalidAsn { line, .. }
            | IngestError::InvalidRange { line, .. }
            | IngestError::Io { line, .. } => *line,
        }
    }

    /// True for errors caused by row content rather than the reader
    pub fn is_malformed(&self) -> bool {
        !matches!(self, IngestError::Io { .. })
    }
}
