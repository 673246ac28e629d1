//! Archive readers for visual-novel game files.
//!
//! Supported containers:
//!
//! - NScripter `.sar` - flat big-endian table, stored files
//! - Ren'Py `.rpa` (2.0 and 3.0) - zlib-compressed pickled index with
//!   XOR-obfuscated offsets and inline file prefixes
//!
//! Decoders are looked up through a [`Registry`] and write their output
//! into a [`FileSink`], either to disk ([`PersistedSink`]) or to memory
//! ([`BufferedSink`]).
//!
//! # Example
//!
//! ```no_run
//! use vnarc_archive::{ArchiveInput, PersistedSink, Registry};
//!
//! let registry = Registry::with_defaults();
//! let input = ArchiveInput::open("archive.rpa")?;
//!
//! let decoder = registry.detect(&input)?;
//! let mut sink = PersistedSink::new(Some("out".into()));
//! registry.unpack(decoder, &input, &mut sink)?;
//! println!("{} saved, {} failed", sink.saved(), sink.failed());
//! # Ok::<(), vnarc_archive::Error>(())
//! ```

mod decompress;
mod error;
mod input;
mod registry;
mod sink;

pub mod pickle;
pub mod rpa;
pub mod sar;

pub use error::{Error, Result};
pub use input::ArchiveInput;
pub use registry::{ArchiveDecoder, EntryInfo, Registry};
pub use rpa::RpaDecoder;
pub use sar::SarDecoder;
pub use sink::{BufferedSink, FileSink, PersistedSink};
