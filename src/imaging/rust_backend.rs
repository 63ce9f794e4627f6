//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::guess_format` + `image::load_from_memory_with_format` |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Sharpening | [`unsharp_mask`](super::sharpen::unsharp_mask) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB only) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (RGB or RGBA) |
//! | Encode → WebP | `webp` crate (lossy, libwebp) |

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::format::ImageMime;
use super::params::{Quality, Sharpening};
use super::sharpen::unsharp_mask;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgb, RgbImage};

/// Extensions the batch runner will pick up from directories.
const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    INPUT_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop alpha by compositing over black, the letterbox fill colour.
fn flatten_on_black(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let over = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        Rgb([over(r), over(g), over(b)])
    })
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = flatten_on_black(image);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value() as u8)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    let result = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        encoder.write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
    } else {
        let rgb = image.to_rgb8();
        encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
    };
    result.map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

/// Lossy WebP via libwebp. Alpha is kept when the raster has it.
fn encode_webp(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| BackendError::Encode("failed to create WebPConfig".into()))?;
    config.quality = quality.value() as f32;

    let (w, h) = (image.width(), image.height());
    let memory = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), w, h).encode_advanced(&config)
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), w, h).encode_advanced(&config)
    }
    .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e:?}")))?;

    Ok(memory.to_vec())
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        let format = image::guess_format(bytes)
            .map_err(|e| BackendError::Decode(format!("Unrecognized image data: {e}")))?;
        let mime = ImageMime::from_image_format(format).ok_or_else(|| {
            BackendError::Decode(format!("Unsupported input format: {format:?}"))
        })?;
        let pixels = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| BackendError::Decode(format!("Failed to decode {mime}: {e}")))?;
        Ok(SourceImage::new(pixels, mime))
    }

    fn resample(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        sharpening: Option<Sharpening>,
    ) -> DynamicImage {
        let resized = if (image.width(), image.height()) == (width, height) {
            image.clone()
        } else {
            image.resize_exact(width, height, FilterType::Lanczos3)
        };
        match sharpening {
            Some(s) => unsharp_mask(&resized, s),
            None => resized,
        }
    }

    fn encode(
        &self,
        image: &DynamicImage,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        match mime {
            ImageMime::Jpeg => encode_jpeg(image, quality),
            ImageMime::Png => encode_png(image),
            ImageMime::WebP => encode_webp(image, quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{noise_rgb, photo_like, translucent};
    use image::{Rgba, RgbaImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
        for ext in exts {
            assert!(ImageMime::from_extension(ext).is_some());
        }
    }

    #[test]
    fn encode_then_decode_each_format() {
        let backend = RustBackend::new();
        let img = photo_like(64, 48);
        for mime in [ImageMime::Jpeg, ImageMime::Png, ImageMime::WebP] {
            let bytes = backend.encode(&img, mime, Quality::default()).unwrap();
            let decoded = backend.decode(&bytes).unwrap();
            assert_eq!(decoded.mime, mime);
            assert_eq!(decoded.dimensions(), (64, 48));
        }
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        let err = backend.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn decode_truncated_jpeg_errors() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&photo_like(64, 64), ImageMime::Jpeg, Quality::default())
            .unwrap();
        let err = backend.decode(&bytes[..40]).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn jpeg_drops_alpha_png_keeps_it() {
        let backend = RustBackend::new();
        let img = translucent(20, 10);

        let jpeg = backend.encode(&img, ImageMime::Jpeg, Quality::default()).unwrap();
        assert!(!backend.decode(&jpeg).unwrap().pixels.color().has_alpha());

        let png = backend.encode(&img, ImageMime::Png, Quality::default()).unwrap();
        let decoded = backend.decode(&png).unwrap().pixels.to_rgba8();
        assert_eq!(decoded, img.to_rgba8());
    }

    #[test]
    fn jpeg_composites_transparency_onto_black() {
        let backend = RustBackend::new();
        // Left half fully transparent white, right half opaque mid-grey
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 16, |x, _| {
            if x < 16 {
                Rgba([255, 255, 255, 0])
            } else {
                Rgba([128, 128, 128, 255])
            }
        }));
        let jpeg = backend.encode(&img, ImageMime::Jpeg, Quality::new(95)).unwrap();
        let decoded = backend.decode(&jpeg).unwrap().pixels.to_rgb8();
        for c in decoded.get_pixel(4, 8).0 {
            assert!(c < 12, "transparent pixel leaked colour: {c}");
        }
        for c in decoded.get_pixel(27, 8).0 {
            assert!(c.abs_diff(128) < 12);
        }
    }

    #[test]
    fn out_of_range_quality_encodes_as_the_clamped_value() {
        let backend = RustBackend::new();
        let img = noise_rgb(64, 64);
        let over = backend.encode(&img, ImageMime::Jpeg, Quality::new(300)).unwrap();
        let max = backend.encode(&img, ImageMime::Jpeg, Quality::new(100)).unwrap();
        assert_eq!(over, max);
        let mid = backend.encode(&img, ImageMime::Jpeg, Quality::new(44)).unwrap();
        assert_ne!(over, mid);
    }

    #[test]
    fn webp_keeps_alpha() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&translucent(20, 10), ImageMime::WebP, Quality::default())
            .unwrap();
        assert!(backend.decode(&bytes).unwrap().pixels.color().has_alpha());
    }

    #[test]
    fn lower_jpeg_quality_is_smaller() {
        let backend = RustBackend::new();
        let img = noise_rgb(128, 128);
        let high = backend.encode(&img, ImageMime::Jpeg, Quality::new(95)).unwrap();
        let low = backend.encode(&img, ImageMime::Jpeg, Quality::new(20)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn resample_produces_exact_dimensions() {
        let backend = RustBackend::new();
        let img = photo_like(400, 300);
        let out = backend.resample(&img, 123, 45, None);
        assert_eq!((out.width(), out.height()), (123, 45));
    }

    #[test]
    fn resample_same_size_without_sharpening_is_identity() {
        let backend = RustBackend::new();
        let img = photo_like(40, 30);
        let out = backend.resample(&img, 40, 30, None);
        assert_eq!(out.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn resample_with_sharpening_differs() {
        let backend = RustBackend::new();
        let img = photo_like(400, 300);
        let plain = backend.resample(&img, 200, 150, None);
        let sharp = backend.resample(&img, 200, 150, Sharpening::from_slider(100));
        assert_ne!(plain.to_rgb8(), sharp.to_rgb8());
    }
}
