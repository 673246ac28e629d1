//! Ren'Py RPA archives.
//!
//! ```text
//! "RPA-2.0 " <16 hex digits: table offset>
//! "RPA-3.0 " <16 hex digits: table offset> <sep> <8 hex digits: key>
//! ```
//!
//! The table lives at the given offset and runs to the end of the file. It
//! is a zlib stream holding a pickled index of
//! `name -> [(offset ^ key, size ^ key, prefix)]`. The prefix is stored
//! inline in the index and is prepended to the bytes read from the archive.

use vnarc_common::{BinaryReader, VirtualFile};

use crate::decompress::inflate_table;
use crate::pickle::unpickle;
use crate::registry::{ArchiveDecoder, EntryInfo};
use crate::sink::{deposit_entry, FileSink};
use crate::{ArchiveInput, Error, Result};

/// Signature of version 2 archives.
pub const MAGIC_V2: &[u8; 8] = b"RPA-2.0 ";
/// Signature of version 3 archives.
pub const MAGIC_V3: &[u8; 8] = b"RPA-3.0 ";

/// RPA sub-version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpaVersion {
    /// No obfuscation key.
    V2,
    /// Offsets and sizes are XORed with a key from the header.
    V3,
}

/// Parsed RPA header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpaHeader {
    pub version: RpaVersion,
    pub table_offset: u64,
    pub key: u32,
}

impl RpaHeader {
    /// Read the header from the start of the archive.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let magic = reader.read_bytes(8).map_err(truncated)?;
        let version = if magic == MAGIC_V3 {
            RpaVersion::V3
        } else if magic == MAGIC_V2 {
            RpaVersion::V2
        } else {
            return Err(Error::MalformedHeader(format!(
                "not an RPA archive (signature {magic:02x?})"
            )));
        };

        let table_offset = read_hex(reader, 16)?;
        let key = match version {
            RpaVersion::V3 => {
                reader.skip(1).map_err(truncated)?;
                read_hex(reader, 8)? as u32
            }
            RpaVersion::V2 => 0,
        };

        Ok(Self {
            version,
            table_offset,
            key,
        })
    }
}

/// One RPA table entry, already de-obfuscated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    pub prefix: Vec<u8>,
}

impl TableEntry {
    /// Length of the inline prefix.
    #[inline]
    pub fn prefix_len(&self) -> usize {
        self.prefix.len()
    }
}

/// Decoder for Ren'Py `.rpa` archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpaDecoder;

impl RpaDecoder {
    /// Read header and table.
    pub fn read_table(reader: &mut BinaryReader<'_>) -> Result<(RpaHeader, Vec<TableEntry>)> {
        let header = RpaHeader::read(reader)?;
        tracing::info!(version = ?header.version, key = header.key, "RPA header");

        let offset = usize::try_from(header.table_offset)
            .ok()
            .filter(|&o| o <= reader.len())
            .ok_or_else(|| {
                Error::MalformedHeader(format!(
                    "table offset {:#x} is past the end of the archive",
                    header.table_offset
                ))
            })?;
        reader.seek(offset)?;

        let raw = inflate_table(reader.read_to_end())?;
        let table = decode_table(&raw, header.key)?;
        tracing::debug!(entries = table.len(), table_bytes = raw.len(), "read RPA table");

        Ok((header, table))
    }

    /// Build one entry's contents: inline prefix followed by stored bytes.
    pub fn read_file(reader: &mut BinaryReader<'_>, entry: &TableEntry) -> Result<VirtualFile> {
        let end = u64::from(entry.offset) + u64::from(entry.size);
        if end > reader.len() as u64 {
            return Err(Error::OutOfBoundsEntry {
                name: entry.name.clone(),
                offset: entry.offset.into(),
                size: entry.size.into(),
                stream_size: reader.len() as u64,
            });
        }

        reader.seek(entry.offset as usize)?;
        let stored = reader.read_bytes(entry.size as usize)?;

        let mut data = Vec::with_capacity(entry.prefix_len() + stored.len());
        data.extend_from_slice(&entry.prefix);
        data.extend_from_slice(stored);
        Ok(VirtualFile::new(entry.name.clone(), data))
    }
}

impl ArchiveDecoder for RpaDecoder {
    fn name(&self) -> &'static str {
        "renpy/rpa"
    }

    fn recognizes(&self, input: &ArchiveInput) -> bool {
        input.starts_with(MAGIC_V3) || input.starts_with(MAGIC_V2)
    }

    fn list(&self, input: &ArchiveInput) -> Result<Vec<EntryInfo>> {
        let (_, table) = Self::read_table(&mut input.reader())?;
        Ok(table
            .into_iter()
            .map(|e| EntryInfo {
                prefix_len: e.prefix_len(),
                name: e.name,
                offset: e.offset.into(),
                size: e.size.into(),
            })
            .collect())
    }

    fn unpack(&self, input: &ArchiveInput, sink: &mut dyn FileSink) -> Result<()> {
        let mut reader = input.reader();
        let (_, table) = Self::read_table(&mut reader)?;

        for entry in &table {
            deposit_entry(sink, &entry.name, &mut || Self::read_file(&mut reader, entry))?;
        }
        Ok(())
    }
}

/// Turn an unpickled index into table entries.
///
/// Strings come in `(name, prefix)` pairs and integers in `(offset, size)`
/// pairs. Indices without prefixes (an odd string count) are rejected.
pub fn decode_table(raw: &[u8], key: u32) -> Result<Vec<TableEntry>> {
    let (strings, integers) = unpickle(raw)?.into_parts();

    if strings.len() % 2 != 0 {
        return Err(Error::TableCorrupt(format!(
            "odd number of strings ({}) in index",
            strings.len()
        )));
    }
    if integers.len() != strings.len() {
        return Err(Error::TableCorrupt(format!(
            "{} strings but {} integers in index",
            strings.len(),
            integers.len()
        )));
    }

    let mut strings = strings.into_iter();
    let entries = integers
        .chunks_exact(2)
        .filter_map(|pair| {
            let name = strings.next()?;
            let prefix = strings.next()?;
            Some(TableEntry {
                name: String::from_utf8_lossy(&name).into_owned(),
                offset: pair[0] as u32 ^ key,
                size: pair[1] as u32 ^ key,
                prefix,
            })
        })
        .collect();
    Ok(entries)
}

/// Read `digits` ASCII hex digits as a big-endian number.
///
/// Characters that are not hex digits count as zero.
fn read_hex(reader: &mut BinaryReader<'_>, digits: usize) -> Result<u64> {
    let text = reader.read_bytes(digits).map_err(truncated)?;
    let mut value = 0u64;
    for &c in text {
        let digit = match (c as char).to_digit(16) {
            Some(d) => d,
            None => {
                tracing::warn!("non-hex character {c:#04x} in RPA header");
                0
            }
        };
        value = value.wrapping_mul(16).wrapping_add(digit.into());
    }
    Ok(value)
}

fn truncated(e: vnarc_common::Error) -> Error {
    Error::MalformedHeader(format!("truncated header: {e}"))
}
