//! Archive input source.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use vnarc_common::BinaryReader;

use crate::Result;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// An archive file opened for unpacking.
///
/// Holds the file name (used for extension-based recognition) and the
/// archive bytes, either memory-mapped from disk or owned in memory.
pub struct ArchiveInput {
    name: String,
    backing: Backing,
}

impl ArchiveInput {
    /// Open an archive from disk using a read-only memory map.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the map is read-only and lives as long as `self`; the
        // archive is not expected to be modified while it is being unpacked.
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            name,
            backing: Backing::Mapped(mmap),
        })
    }

    /// Wrap an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            backing: Backing::Owned(data),
        }
    }

    /// Get the archive file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw archive bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(data) => data,
        }
    }

    /// Get the archive size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Check whether the archive is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Check the archive's file extension, ignoring ASCII case.
    pub fn has_extension(&self, extension: &str) -> bool {
        vnarc_common::has_extension(&self.name, extension)
    }

    /// Check whether the archive starts with `signature`.
    pub fn starts_with(&self, signature: &[u8]) -> bool {
        self.data().starts_with(signature)
    }

    /// Create a fresh reader positioned at the start of the archive.
    pub fn reader(&self) -> BinaryReader<'_> {
        BinaryReader::new(self.data())
    }
}

impl std::fmt::Debug for ArchiveInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveInput")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
