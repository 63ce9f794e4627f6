//! Shared test utilities: synthetic rasters and encoded fixtures.
//!
//! Everything is generated in memory and deterministic, so pipeline tests
//! can assert exact dimensions, border pixels and byte-for-byte idempotence
//! without fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let src = jpeg_source(400, 300);
//! let out = transform(&RustBackend::new(), &src, &TransformRequest::new(200, 150)).unwrap();
//! assert_eq!((out.image.width, out.image.height), (200, 150));
//! ```

use crate::imaging::{ImageMime, Quality, RustBackend, SourceImage};
use crate::imaging::ImageBackend;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

// =========================================================================
// Rasters
// =========================================================================

/// Two-tone checkerboard (64 / 192 grey) with `cell`-pixel squares.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = if (x / cell + y / cell) % 2 == 0 { 192 } else { 64 };
        Rgb([v, v, v])
    });
    DynamicImage::ImageRgb8(img)
}

/// Horizontal grey ramp from 0 to 255.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let span = width.saturating_sub(1).max(1);
    let img = RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / span) as u8;
        Rgb([v, v, v])
    });
    DynamicImage::ImageRgb8(img)
}

/// Colourful, non-uniform content that never hits pure black, so letterbox
/// bars are distinguishable from content.
pub fn photo_like(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (40 + (x * 7 + y) % 200) as u8,
            (40 + (y * 5 + x / 3) % 200) as u8,
            (40 + ((x ^ y) % 180)) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Deterministic high-entropy noise (xorshift), hard to compress.
pub fn noise_rgb(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgb([next(), next(), next()])
    });
    DynamicImage::ImageRgb8(img)
}

/// RGBA content with a horizontal alpha ramp.
pub fn translucent(width: u32, height: u32) -> DynamicImage {
    let span = width.saturating_sub(1).max(1);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([200, (y % 256) as u8, 90, (55 + x * 200 / span) as u8])
    });
    DynamicImage::ImageRgba8(img)
}

// =========================================================================
// Encoded fixtures
// =========================================================================

pub fn encode(img: &DynamicImage, mime: ImageMime, quality: u32) -> Vec<u8> {
    RustBackend::new()
        .encode(img, mime, Quality::new(quality))
        .unwrap()
}

/// A decoded JPEG source of `photo_like` content.
pub fn jpeg_source(width: u32, height: u32) -> SourceImage {
    let bytes = encode(&photo_like(width, height), ImageMime::Jpeg, 92);
    RustBackend::new().decode(&bytes).unwrap()
}

/// A PNG source wrapping `img` losslessly.
pub fn png_source(img: DynamicImage) -> SourceImage {
    SourceImage::new(img, ImageMime::Png)
}
