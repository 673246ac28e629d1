//! PRS header structure.

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use vnarc_common::BinaryReader;

use crate::{Error, Result, PRS_MAGIC};

/// PRS file header (16 bytes, little-endian).
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PrsHeader {
    /// Magic bytes (`YB\x83\x03`).
    pub magic: [u8; 4],
    /// Size of the compressed payload following the header.
    pub compressed_size: U32<LittleEndian>,
    /// Reserved.
    pub reserved: [u8; 4],
    /// Image width in pixels.
    pub width: U16<LittleEndian>,
    /// Image height in pixels.
    pub height: U16<LittleEndian>,
}

impl PrsHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 16;

    /// Parse and validate the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: PrsHeader = reader.read_struct()?;
        if &header.magic != PRS_MAGIC {
            return Err(Error::InvalidMagic(header.magic));
        }
        Ok(header)
    }

    /// Image width.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width.get()
    }

    /// Image height.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height.get()
    }

    /// Declared payload size.
    #[inline]
    pub fn compressed_size(&self) -> usize {
        self.compressed_size.get() as usize
    }
}
