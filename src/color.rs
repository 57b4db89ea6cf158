//! Color signatures and the distance metric used for tile matching.
//!
//! A [`ColorSignature`] is a plain `(r, g, b)` triple in 8-bit channel space
//! (0.0-255.0). Both sampled source pixels and tile averages use the same
//! convention, so distances between them are directly comparable.

use image::{Rgba, RgbaImage};
use serde::Serialize;

/// Average or sampled color of an image region, without alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ColorSignature {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorSignature {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Signature of a single pixel. Alpha is ignored.
    pub fn from_pixel(pixel: &Rgba<u8>) -> Self {
        let [r, g, b, _] = pixel.0;
        Self::new(r as f64, g as f64, b as f64)
    }

    /// Per-channel mean over every pixel of the image.
    ///
    /// Returns `None` for an image with no pixels.
    pub fn average_of(image: &RgbaImage) -> Option<Self> {
        let pixel_count = image.width() as u64 * image.height() as u64;
        if pixel_count == 0 {
            return None;
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for pixel in image.pixels() {
            r += pixel[0] as u64;
            g += pixel[1] as u64;
            b += pixel[2] as u64;
        }

        let total = pixel_count as f64;
        Some(Self::new(r as f64 / total, g as f64 / total, b as f64 / total))
    }

    /// Euclidean distance between two signatures in raw channel space.
    pub fn distance(&self, other: &ColorSignature) -> f64 {
        distance(*self, *other)
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f64; 3]> for ColorSignature {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// Euclidean norm of the per-channel differences.
#[inline]
pub fn distance(a: ColorSignature, b: ColorSignature) -> f64 {
    let dr = a.r - b.r;
    let dg = a.g - b.g;
    let db = a.b - b.b;
    (dr * dr + dg * dg + db * db).sqrt()
}
