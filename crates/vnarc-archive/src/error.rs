//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when unpacking archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (truncated or unreadable stream).
    #[error("{0}")]
    Common(#[from] vnarc_common::Error),

    /// No registered decoder recognized the input.
    #[error("unrecognized archive format")]
    UnrecognizedFormat,

    /// A format name was requested that is not registered.
    #[error("unknown archive format: {0}")]
    UnknownFormat(String),

    /// Bad signature or header fields.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The file table could not be decoded.
    #[error("corrupt file table: {0}")]
    TableCorrupt(String),

    /// The serialized table used an opcode outside the supported subset.
    #[error("unsupported table opcode {opcode:#04x} at offset {position}")]
    UnsupportedOpcode { opcode: u8, position: usize },

    /// An entry points outside the archive.
    #[error("entry {name} ({size} bytes at {offset:#x}) exceeds archive size {stream_size}")]
    OutOfBoundsEntry {
        name: String,
        offset: u64,
        size: u64,
        stream_size: u64,
    },

    /// A single entry could not be produced.
    #[error("failed to read entry {name}: {reason}")]
    UnreadableEntry { name: String, reason: String },
}

impl Error {
    /// Whether the error only affects a single entry, so unpacking may
    /// continue with the next one.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            Self::OutOfBoundsEntry { .. } | Self::UnreadableEntry { .. }
        )
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
