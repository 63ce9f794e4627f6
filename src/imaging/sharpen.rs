//! Unsharp mask with amount, radius and threshold.
//!
//! `image::imageops::unsharpen` only takes sigma and threshold, with a fixed
//! strength. Device presets need the strength to follow the sharpen slider,
//! so the mask is applied here: `out = orig + (orig - blur(orig)) * amount/100`
//! for every pixel whose luma moved by at least `threshold` levels.
//!
//! Alpha is carried through untouched.

use super::params::Sharpening;
use image::{DynamicImage, ImageBuffer, Pixel, imageops};

/// Apply the mask, returning an 8-bit RGB or RGBA image.
pub fn unsharp_mask(image: &DynamicImage, sharpening: Sharpening) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(sharpen_buffer(&image.to_rgba8(), sharpening))
    } else {
        DynamicImage::ImageRgb8(sharpen_buffer(&image.to_rgb8(), sharpening))
    }
}

fn luma<P: Pixel<Subpixel = u8>>(p: &P) -> f32 {
    let [r, g, b] = p.to_rgb().0;
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Sharpen the first three channels of an RGB(A) buffer.
fn sharpen_buffer<P>(src: &ImageBuffer<P, Vec<u8>>, sharpening: Sharpening) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let blurred = imageops::blur(src, sharpening.radius);
    let gain = sharpening.amount / 100.0;
    let threshold = sharpening.threshold as f32;

    let mut out = src.clone();
    for (px, soft) in out.pixels_mut().zip(blurred.pixels()) {
        if (luma(&*px) - luma(soft)).abs() < threshold {
            continue;
        }
        let soft = soft.channels();
        for (c, value) in px.channels_mut().iter_mut().take(3).enumerate() {
            let v = *value as f32;
            let sharpened = v + (v - soft[c] as f32) * gain;
            *value = sharpened.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
