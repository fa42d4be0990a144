use clpir_encoding::DecodeError;

use crate::metadata::VersionCompatibility;
use crate::protocol::EncodingType;

/// Errors that can occur while writing or reading an IR stream.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// The buffer ended mid-field. Retry once more bytes are available.
    #[error("incomplete IR stream (more bytes needed)")]
    IncompleteIr,

    /// The bytes are present but structurally invalid.
    #[error("corrupted IR stream: {0}")]
    CorruptedIr(String),

    /// The stream's magic number names a different variable width.
    #[error("unexpected IR encoding (expected {expected}, found {found})")]
    UnexpectedEncoding {
        expected: EncodingType,
        found: EncodingType,
    },

    /// The preamble declares a protocol version this crate cannot read.
    #[error("unsupported IR protocol version '{version}' ({compatibility})")]
    UnsupportedVersion {
        version: String,
        compatibility: VersionCompatibility,
    },

    /// A value is longer than its length field can describe.
    #[error("{what} too long ({len} bytes, max {max})")]
    EncodingTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// The event is well-formed but its variables do not fit its logtype.
    #[error("event decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Metadata serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation was called out of order (e.g. an event before the preamble).
    #[error("invalid IR encoder state: {0}")]
    InvalidState(&'static str),

    /// An I/O error occurred in a stream adapter.
    #[error("IR I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IrError {
    /// True if the same call may succeed once more bytes are available.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IncompleteIr)
    }

    pub(crate) fn corrupted(reason: impl Into<String>) -> Self {
        Self::CorruptedIr(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, IrError>;
