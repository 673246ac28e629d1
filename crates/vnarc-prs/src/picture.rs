//! Decoded PRS images.

use crate::decode::decode_pixels;
use crate::header::PrsHeader;
use crate::{Error, Result, PRS_MAGIC};

/// A decoded PRS image with pixels in BGR order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrsImage {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl PrsImage {
    /// Check whether data starts with the PRS magic.
    pub fn is_prs(data: &[u8]) -> bool {
        data.starts_with(PRS_MAGIC)
    }

    /// Decode a complete PRS file.
    ///
    /// A payload shorter than the header claims is decoded as far as it
    /// goes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PrsHeader::parse(data)?;
        let (width, height) = (header.width(), header.height());
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }

        let payload = &data[PrsHeader::SIZE..];
        let declared = header.compressed_size();
        if payload.len() < declared {
            tracing::warn!(
                declared,
                available = payload.len(),
                "PRS payload shorter than declared"
            );
        }
        let payload = &payload[..declared.min(payload.len())];

        let pixels = decode_pixels(payload, width, height)?;
        tracing::debug!(width, height, "decoded PRS image");
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw pixels, three bytes per pixel in blue, green, red order.
    #[inline]
    pub fn bgr_pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Convert to an RGB image buffer.
    #[cfg(feature = "png")]
    pub fn to_rgb_image(&self) -> image::RgbImage {
        let width = u32::from(self.width);
        image::RgbImage::from_fn(width, self.height.into(), |x, y| {
            let i = (y as usize * width as usize + x as usize) * 3;
            image::Rgb([self.pixels[i + 2], self.pixels[i + 1], self.pixels[i]])
        })
    }

    /// Encode the image as PNG.
    #[cfg(feature = "png")]
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        self.to_rgb_image()
            .write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prs_file(width: u16, height: u16, payload: &[u8]) -> Vec<u8> {
        let mut data = PRS_MAGIC.to_vec();
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_decode_applies_delta() {
        // Two pixels as literals: (1, 2, 3) then deltas (1, 1, 1).
        let data = prs_file(2, 1, &[0x00, 1, 2, 3, 1, 1, 1]);
        assert!(PrsImage::is_prs(&data));

        let image = PrsImage::decode(&data).unwrap();
        assert_eq!(image.bgr_pixels(), &[1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn test_payload_limited_to_declared_size() {
        let mut data = prs_file(1, 1, &[0x00, 7, 7]);
        // Trailing bytes beyond the declared size are ignored.
        data.extend_from_slice(&[9, 9, 9]);

        let image = PrsImage::decode(&data).unwrap();
        assert_eq!(image.bgr_pixels(), &[7, 7, 0]);
    }

    #[test]
    fn test_huge_dimensions_fail_cleanly() {
        let data = prs_file(0xffff, 0xffff, &[0x00]);
        assert_eq!(data.len(), 17);
        assert!(matches!(
            PrsImage::decode(&data),
            Err(Error::OutputTooLarge { width: 0xffff, height: 0xffff })
        ));
    }

    #[test]
    fn test_empty_image_rejected() {
        let data = prs_file(0, 4, &[]);
        assert!(matches!(
            PrsImage::decode(&data),
            Err(Error::EmptyImage { width: 0, height: 4 })
        ));
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_rgb_conversion_swaps_channels() {
        let data = prs_file(1, 1, &[0x00, 0x10, 0x20, 0x30]);
        let image = PrsImage::decode(&data).unwrap();

        let rgb = image.to_rgb_image();
        assert_eq!(rgb.get_pixel(0, 0).0, [0x30, 0x20, 0x10]);

        let png = image.to_png().unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }
}
