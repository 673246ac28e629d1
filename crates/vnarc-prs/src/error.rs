//! Error types for PRS decoding.

use thiserror::Error;

/// Errors that can occur when decoding PRS images.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] vnarc_common::Error),

    /// Invalid PRS magic.
    #[error("invalid PRS magic: expected 59 42 83 03, got {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// A back-reference points before the start of the output.
    #[error("back-reference distance {distance} at output position {position} reaches before the start")]
    BackReferenceUnderflow { distance: usize, position: usize },

    /// The declared dimensions cannot be produced from the payload, or the
    /// output buffer cannot be allocated.
    #[error("output for a {width}x{height} image is too large for its payload")]
    OutputTooLarge { width: u16, height: u16 },

    /// Width or height is zero.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u16, height: u16 },

    /// PNG encoding failed.
    #[cfg(feature = "png")]
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for PRS operations.
pub type Result<T> = std::result::Result<T, Error>;
