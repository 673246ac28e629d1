//! Common utilities for vnarc.
//!
//! This crate provides foundational types shared by the vnarc crates:
//!
//! - [`BinaryReader`] - Seekable byte-stream reader with explicit endianness
//! - [`VirtualFile`] - A named in-memory file produced by a decoder

mod error;
mod file;
mod reader;

pub use error::{Error, Result};
pub use file::{has_extension, VirtualFile};
pub use reader::BinaryReader;
