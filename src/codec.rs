//! Raster codec.
//!
//! This module handles decoding uploaded images and tile files into pixels,
//! and encoding the composed mosaic as JPEG.
//!
//! # Design Decisions
//!
//! - **Format sniffing**: Inputs are decoded by inspecting their magic bytes,
//!   so tiles and uploads may be either JPEG or PNG regardless of file name.
//!
//! - **JPEG output**: The mosaic is always encoded as JPEG. JPEG has no alpha
//!   channel, so the canvas is flattened to RGB before encoding.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::io::Cursor;

use crate::error::CodecError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Image Codec
// =============================================================================

/// Decoder for tile and source images, and JPEG encoder for mosaics.
///
/// # Example
///
/// ```ignore
/// use photo_mosaic::codec::ImageCodec;
///
/// let codec = ImageCodec::new();
/// let img = codec.decode(&upload_bytes)?.to_rgba8();
/// let jpeg = codec.encode_jpeg(&img, 85)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImageCodec {}

impl ImageCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self {}
    }

    /// Decode an image, detecting the format from its content.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the format is not recognised or the
    /// data is corrupt.
    pub fn decode(&self, source: &[u8]) -> Result<DynamicImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode {
                message: e.to_string(),
            })?;

        reader.decode().map_err(|e| CodecError::Decode {
            message: e.to_string(),
        })
    }

    /// Decode an image straight into 8-bit RGBA.
    pub fn decode_rgba(&self, source: &[u8]) -> Result<RgbaImage, CodecError> {
        Ok(self.decode(source)?.to_rgba8())
    }

    /// Encode an RGBA canvas as JPEG at the given quality.
    ///
    /// Quality is clamped to 1-100.
    pub fn encode_jpeg(&self, image: &RgbaImage, quality: u8) -> Result<Bytes, CodecError> {
        let quality = clamp_quality(quality);
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);

        encoder
            .encode_image(&rgb)
            .map_err(|e| CodecError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
