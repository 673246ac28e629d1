//! Error types for vnarc-common.

use thiserror::Error;

/// Common error type for vnarc operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Seek target lies past the end of the stream.
    #[error("seek to {position} is past the end of a {size}-byte stream")]
    SeekOutOfBounds { position: usize, size: usize },

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
