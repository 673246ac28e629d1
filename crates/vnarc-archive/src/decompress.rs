//! Decompression utilities for archive tables.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::{Error, Result};

/// Decompress a zlib-wrapped DEFLATE stream.
///
/// Any decoder failure is reported as [`Error::TableCorrupt`]; this is only
/// used for file tables, which are unusable when they fail to inflate.
pub fn decompress_zlib(data: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut decoder = ZlibDecoder::new(data);

    output.clear();
    decoder
        .read_to_end(output)
        .map_err(|e| Error::TableCorrupt(format!("inflate failed: {e}")))?;

    Ok(())
}

/// Decompress a zlib stream into a fresh buffer.
pub fn inflate_table(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len().saturating_mul(4));
    decompress_zlib(data, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zlib_roundtrip() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"Hello, World! This is a test of zlib compression.";

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = inflate_table(&compressed).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_garbage_is_table_corrupt() {
        let result = inflate_table(b"definitely not zlib");
        assert!(matches!(result, Err(Error::TableCorrupt(_))));
    }
}
