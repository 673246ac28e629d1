//! PRS image decoding for MarbleEngine game files.
//!
//! PRS images store 24-bit BGR pixels compressed with a flag-driven LZ77
//! variant, followed by a delta filter across the three colour channels.
//!
//! # Example
//!
//! ```no_run
//! use vnarc_prs::PrsImage;
//!
//! let data = std::fs::read("title.prs")?;
//! let image = PrsImage::decode(&data)?;
//! std::fs::write("title.png", image.to_png()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod picture;

pub mod decode;

pub use decode::{apply_delta_filter, decode_pixels, decompress};
pub use error::{Error, Result};
pub use header::PrsHeader;
pub use picture::PrsImage;

/// PRS file magic bytes.
pub const PRS_MAGIC: &[u8; 4] = b"YB\x83\x03";
