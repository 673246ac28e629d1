//! Binary reader over byte slices.
//!
//! [`BinaryReader`] is the byte-stream contract every decoder in vnarc
//! consumes: positional reads with the endianness chosen per call site,
//! plus `seek`/`position`/`skip`/`len`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A seekable cursor over a byte slice.
///
/// # Example
///
/// ```
/// use vnarc_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x10];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u32_be().unwrap(), 0x0000_0010);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    ///
    /// Seeking exactly to the end is allowed; anything past it is not.
    #[inline]
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::SeekOutOfBounds {
                position,
                size: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Advance the position by a number of bytes.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Consume and return everything up to the end of the buffer.
    #[inline]
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let bytes = self.remaining_bytes();
        self.position = self.data.len();
        bytes
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read_bytes(4).map(BigEndian::read_u32)
    }

    /// Read a null-terminated byte string, without the terminator.
    pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        let remaining = self.remaining_bytes();
        let null_pos = memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator)?;
        self.position += null_pos + 1;
        Ok(&remaining[..null_pos])
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }
}
