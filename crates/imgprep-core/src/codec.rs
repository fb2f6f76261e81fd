//! Image decoding and resizing seam.
//!
//! The encoder only needs "bytes to pixels" and "pixels to a square of N";
//! both sit behind [`ImageCodec`] so tests and alternative backends can swap
//! them out. [`ImageCrateCodec`] is the default, built on the `image` crate.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

/// Decoded 8-bit pixels, row-major with interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    depth: u32,
    samples: Vec<u8>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, depth: u32, samples: Vec<u8>) -> Result<Self, CodecError> {
        let expected = width as usize * height as usize * depth as usize;
        if samples.len() != expected {
            return Err(CodecError(format!(
                "pixel buffer holds {} samples, expected {expected} for {width}x{height}x{depth}",
                samples.len()
            )));
        }
        Ok(Self { width, height, depth, samples })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
}

pub trait ImageCodec: Send + Sync {
    /// Decode encoded image bytes. Grayscale sources come back as RGB; alpha
    /// channels are kept.
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, CodecError>;

    /// Resize to a `size x size` grid with the same depth.
    fn resize(&self, grid: &PixelGrid, size: u32) -> Result<PixelGrid, CodecError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, CodecError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| CodecError(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());

        let (depth, samples) = match decoded.color().channel_count() {
            1 | 3 => (3, decoded.to_rgb8().into_raw()),
            2 => (2, decoded.to_luma_alpha8().into_raw()),
            _ => (4, decoded.to_rgba8().into_raw()),
        };
        PixelGrid::new(width, height, depth, samples)
    }

    fn resize(&self, grid: &PixelGrid, size: u32) -> Result<PixelGrid, CodecError> {
        if size == 0 {
            return Err(CodecError("target size must be > 0".to_string()));
        }
        match grid.depth {
            1 => resize_as::<Luma<u8>>(grid, size),
            2 => resize_as::<LumaA<u8>>(grid, size),
            3 => resize_as::<Rgb<u8>>(grid, size),
            4 => resize_as::<Rgba<u8>>(grid, size),
            other => Err(CodecError(format!("unsupported channel count: {other}"))),
        }
    }
}

fn resize_as<P>(grid: &PixelGrid, size: u32) -> Result<PixelGrid, CodecError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let view = ImageBuffer::<P, &[u8]>::from_raw(grid.width, grid.height, grid.samples.as_slice())
        .ok_or_else(|| CodecError("pixel buffer does not match its dimensions".to_string()))?;
    let resized = imageops::resize(&view, size, size, FilterType::Triangle);
    PixelGrid::new(size, size, grid.depth, resized.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_gray_jpeg, encode_gray_png, encode_rgb_jpeg, encode_rgba_png};

    #[test]
    fn test_decode_channel_layout() {
        let codec = ImageCrateCodec;

        let rgb = codec.decode(&encode_rgb_jpeg(32, 24)).unwrap();
        assert_eq!((rgb.width(), rgb.height(), rgb.depth()), (32, 24, 3));

        let gray = codec.decode(&encode_gray_png(8, 8)).unwrap();
        assert_eq!(gray.depth(), 3);

        let gray = codec.decode(&encode_gray_jpeg(16, 16)).unwrap();
        assert_eq!(gray.depth(), 3);
        assert_eq!(gray.samples().len(), 16 * 16 * 3);
        // Expanded gray keeps equal channels.
        assert!(gray.samples().chunks(3).all(|px| px[0] == px[1] && px[1] == px[2]));

        let rgba = codec.decode(&encode_rgba_png(8, 8)).unwrap();
        assert_eq!(rgba.depth(), 4);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(ImageCrateCodec.decode(b"definitely not an image").is_err());
    }

    #[test]
    fn test_resize_to_square() {
        let codec = ImageCrateCodec;
        let grid = codec.decode(&encode_rgb_jpeg(50, 20)).unwrap();
        let resized = codec.resize(&grid, 16).unwrap();

        assert_eq!((resized.width(), resized.height(), resized.depth()), (16, 16, 3));
        assert_eq!(resized.samples().len(), 16 * 16 * 3);
    }

    #[test]
    fn test_resize_rejects_zero() {
        let grid = PixelGrid::new(1, 1, 3, vec![0, 0, 0]).unwrap();
        assert!(ImageCrateCodec.resize(&grid, 0).is_err());
    }

    #[test]
    fn test_pixel_grid_checks_length() {
        assert!(PixelGrid::new(2, 2, 3, vec![0; 11]).is_err());
    }
}
