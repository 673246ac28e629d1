//! NScripter SAR archives.
//!
//! A flat, uncompressed container:
//!
//! ```text
//! u16 BE  file count
//! u32 BE  base offset of file data
//! repeated file count times:
//!     cstring name
//!     u32 BE  offset relative to base
//!     u32 BE  size
//! ```

use vnarc_common::{BinaryReader, VirtualFile};
use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::registry::{ArchiveDecoder, EntryInfo};
use crate::sink::{deposit_entry, FileSink};
use crate::{ArchiveInput, Error, Result};

/// SAR header.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct SarHeader {
    /// Number of table entries.
    pub file_count: U16<BigEndian>,
    /// Offset that entry offsets are relative to.
    pub data_offset: U32<BigEndian>,
}

/// One SAR table entry, with its offset already made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub offset: u64,
    pub size: u32,
}

/// Decoder for `.sar` archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct SarDecoder;

impl SarDecoder {
    /// Read the header and file table.
    pub fn read_table(reader: &mut BinaryReader<'_>) -> Result<Vec<TableEntry>> {
        let header: SarHeader = reader.read_struct()?;
        let file_count = header.file_count.get();
        let base = u64::from(header.data_offset.get());

        let mut table = Vec::with_capacity(file_count as usize);
        for _ in 0..file_count {
            let name = String::from_utf8_lossy(reader.read_cstring_bytes()?).into_owned();
            let offset = base + u64::from(reader.read_u32_be()?);
            let size = reader.read_u32_be()?;
            table.push(TableEntry { name, offset, size });
        }

        tracing::debug!(entries = table.len(), base, "read SAR table");
        Ok(table)
    }

    /// Copy one entry's bytes out of the archive.
    pub fn read_file(reader: &mut BinaryReader<'_>, entry: &TableEntry) -> Result<VirtualFile> {
        let end = entry.offset + u64::from(entry.size);
        if end > reader.len() as u64 {
            return Err(Error::OutOfBoundsEntry {
                name: entry.name.clone(),
                offset: entry.offset,
                size: entry.size.into(),
                stream_size: reader.len() as u64,
            });
        }

        reader.seek(entry.offset as usize)?;
        let data = reader.read_bytes(entry.size as usize)?.to_vec();
        Ok(VirtualFile::new(entry.name.clone(), data))
    }
}

impl ArchiveDecoder for SarDecoder {
    fn name(&self) -> &'static str {
        "nscripter/sar"
    }

    fn recognizes(&self, input: &ArchiveInput) -> bool {
        input.has_extension("sar")
    }

    fn list(&self, input: &ArchiveInput) -> Result<Vec<EntryInfo>> {
        let table = Self::read_table(&mut input.reader())?;
        Ok(table
            .into_iter()
            .map(|e| EntryInfo {
                name: e.name,
                offset: e.offset,
                size: e.size.into(),
                prefix_len: 0,
            })
            .collect())
    }

    fn unpack(&self, input: &ArchiveInput, sink: &mut dyn FileSink) -> Result<()> {
        let mut reader = input.reader();
        let table = Self::read_table(&mut reader)?;

        for entry in &table {
            deposit_entry(sink, &entry.name, &mut || Self::read_file(&mut reader, entry))?;
        }
        Ok(())
    }
}
