//! PRS pixel decompression.
//!
//! The payload is an LZ77 variant driven by a flag register. Each step
//! shifts the register left; when its low byte runs empty a new control
//! byte is loaded as `(byte << 1) + 1`, the extra bit marking where the next
//! reload happens. Bit 8 of the register picks the operation:
//!
//! - `0`: copy one literal byte.
//! - `1`: read a control byte `tmp`:
//!   - `tmp < 0x80`, `tmp & 3 == 3`: raw run of `(tmp >> 2) + 9` bytes.
//!   - `tmp < 0x80` otherwise: back-reference, length `(tmp & 3) + 2`,
//!     distance `(tmp >> 2) + 1`.
//!   - `tmp >= 0x80`: 14-bit value from `tmp & 0x3f` and the next byte. With
//!     bit `0x40` clear it packs a 4-bit length (+3) and a 10-bit distance;
//!     with it set the whole value is the distance and a third byte indexes
//!     [`LENGTH_TABLE`].
//!
//! After decompression the buffer still holds deltas against the byte one
//! pixel (three channels) earlier; [`apply_delta_filter`] undoes that.

use crate::{Error, Result};

/// Match lengths selected by the long back-reference form.
pub const LENGTH_TABLE: [usize; 256] = build_length_table();

const fn build_length_table() -> [usize; 256] {
    let mut table = [0usize; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i + 3;
        i += 1;
    }
    table[0xfd] = 0x100;
    table[0xfe] = 0x400;
    table[0xff] = 0x1000;
    table
}

/// Largest number of output bytes a single source byte can account for.
///
/// Every operation consumes at least one source byte and emits at most
/// `LENGTH_TABLE[0xff]` bytes.
pub const MAX_EXPANSION: usize = 0x1000;

/// Decompress a PRS payload into a `width * height * 3` byte buffer.
///
/// Running out of input or output ends decoding early without an error;
/// bytes that were never written stay zero. The delta filter is not applied.
///
/// Dimensions that `source` could not fill even at the maximum expansion
/// ratio are rejected before anything is allocated.
pub fn decompress(source: &[u8], width: u16, height: u16) -> Result<Vec<u8>> {
    let target_size = usize::from(width) * usize::from(height) * 3;
    let too_large = || Error::OutputTooLarge { width, height };
    if target_size > source.len().saturating_mul(MAX_EXPANSION) {
        return Err(too_large());
    }

    let mut output = Vec::new();
    output
        .try_reserve_exact(target_size)
        .map_err(|_| too_large())?;
    output.resize(target_size, 0);
    let mut src = source.iter().copied();
    let mut dst = 0usize;
    let mut flag = 0u32;

    loop {
        flag <<= 1;
        if flag & 0xff == 0 {
            let Some(control) = src.next() else { break };
            flag = (u32::from(control) << 1) + 1;
        }

        if flag & 0x100 == 0 {
            if dst >= target_size {
                break;
            }
            let Some(byte) = src.next() else { break };
            output[dst] = byte;
            dst += 1;
            continue;
        }

        let Some(tmp) = src.next() else { break };
        let (length, shift) = if tmp < 0x80 {
            if tmp & 3 == 3 {
                let run = usize::from(tmp >> 2) + 9;
                for _ in 0..run {
                    if dst >= target_size {
                        break;
                    }
                    let Some(byte) = src.next() else { break };
                    output[dst] = byte;
                    dst += 1;
                }
                continue;
            }
            (usize::from(tmp & 3) + 2, usize::from(tmp >> 2))
        } else {
            let Some(lo) = src.next() else { break };
            let combined = usize::from(lo) | (usize::from(tmp & 0x3f) << 8);
            if tmp & 0x40 == 0 {
                ((combined & 0xf) + 3, combined >> 4)
            } else {
                let Some(code) = src.next() else { break };
                (LENGTH_TABLE[usize::from(code)], combined)
            }
        };

        let distance = shift + 1;
        // Must stay byte-at-a-time: when distance < length the source range
        // overlaps bytes written by this same copy.
        for _ in 0..length {
            if dst >= target_size {
                break;
            }
            if distance > dst {
                return Err(Error::BackReferenceUnderflow {
                    distance,
                    position: dst,
                });
            }
            output[dst] = output[dst - distance];
            dst += 1;
        }
    }

    if dst < target_size {
        tracing::debug!(decoded = dst, expected = target_size, "PRS stream ended early");
    }
    Ok(output)
}

/// Undo the encoder's delta filter: every byte adds the byte three
/// positions earlier.
pub fn apply_delta_filter(pixels: &mut [u8]) {
    for i in 3..pixels.len() {
        pixels[i] = pixels[i].wrapping_add(pixels[i - 3]);
    }
}

/// Decompress and un-filter a PRS payload into BGR pixels.
pub fn decode_pixels(source: &[u8], width: u16, height: u16) -> Result<Vec<u8>> {
    let mut pixels = decompress(source, width, height)?;
    apply_delta_filter(&mut pixels);
    Ok(pixels)
}
