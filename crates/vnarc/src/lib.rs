//! vnarc - visual-novel archive extraction and image decoding library.
//!
//! This crate provides a unified interface to the vnarc crates.
//!
//! # Crates
//!
//! - [`vnarc_common`] - Byte-stream reader and virtual files
//! - [`vnarc_archive`] - SAR and RPA archives, output sinks, format registry
//! - [`vnarc_prs`] - PRS image decoding
//!
//! # Example
//!
//! ```no_run
//! use vnarc::prelude::*;
//!
//! let registry = Registry::with_defaults();
//! let input = ArchiveInput::open("images.rpa")?;
//! let decoder = registry.detect(&input)?;
//!
//! let mut sink = BufferedSink::new();
//! registry.unpack(decoder, &input, &mut sink)?;
//!
//! for file in sink.files() {
//!     if PrsImage::is_prs(file.data()) {
//!         let image = PrsImage::decode(file.data())?;
//!         println!("{}: {}x{}", file.name(), image.width(), image.height());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use vnarc_archive as archive;
pub use vnarc_common as common;
pub use vnarc_prs as prs;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use vnarc_archive::{
        ArchiveDecoder, ArchiveInput, BufferedSink, EntryInfo, FileSink, PersistedSink, Registry,
    };
    pub use vnarc_common::{BinaryReader, VirtualFile};
    pub use vnarc_prs::PrsImage;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
