//! Pure geometry for the transform pipeline.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropMode;

/// A pixel rectangle inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRegion {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_full(&self, source: (u32, u32)) -> bool {
        *self == Self::full(source.0, source.1)
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Where a letterboxed image lands on the target canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Scaled content size.
    pub width: u32,
    pub height: u32,
    /// Offset of the content's top-left corner on the canvas.
    pub x: u32,
    pub y: u32,
}

/// Whether two `(width, height)` pairs have exactly the same aspect ratio.
///
/// Uses integer cross-multiplication so 800x600 and 4000x3000 compare equal
/// without float noise.
pub fn same_aspect(a: (u32, u32), b: (u32, u32)) -> bool {
    a.0 as u64 * b.1 as u64 == a.1 as u64 * b.0 as u64
}

/// Choose the source rectangle to read pixels from.
///
/// # Arguments
/// * `source` - Source dimensions (width, height), both > 0
/// * `target` - Target dimensions (width, height), both > 0
/// * `crop` - Crop mode
///
/// # Examples
/// ```
/// # use avfit::imaging::{select_source_region, CropMode, SourceRegion};
/// // 4000x3000 (4:3) auto-cropped for 1920x1080 (16:9) keeps a 4000x2250 band
/// let r = select_source_region((4000, 3000), (1920, 1080), &CropMode::AutoCenter);
/// assert_eq!(r, SourceRegion { x: 0, y: 375, width: 4000, height: 2250 });
/// ```
pub fn select_source_region(source: (u32, u32), target: (u32, u32), crop: &CropMode) -> SourceRegion {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    match crop {
        CropMode::None => SourceRegion::full(src_w, src_h),
        CropMode::AutoCenter => {
            let src_aspect = src_w as f64 / src_h as f64;
            let tgt_aspect = tgt_w as f64 / tgt_h as f64;

            if src_aspect > tgt_aspect {
                // Source is wider: trim left and right
                let w = ((src_h as f64 * tgt_aspect).round() as u32).clamp(1, src_w);
                SourceRegion {
                    x: (src_w - w) / 2,
                    y: 0,
                    width: w,
                    height: src_h,
                }
            } else {
                // Source is taller (or equal): trim top and bottom
                let h = ((src_w as f64 / tgt_aspect).round() as u32).clamp(1, src_h);
                SourceRegion {
                    x: 0,
                    y: (src_h - h) / 2,
                    width: src_w,
                    height: h,
                }
            }
        }
        CropMode::Explicit(b) => {
            let x = ((b.x() * src_w as f64).round() as u32).min(src_w - 1);
            let y = ((b.y() * src_h as f64).round() as u32).min(src_h - 1);
            let w = ((b.width() * src_w as f64).round() as u32).clamp(1, src_w - x);
            let h = ((b.height() * src_h as f64).round() as u32).clamp(1, src_h - y);
            SourceRegion {
                x,
                y,
                width: w,
                height: h,
            }
        }
    }
}

/// Fit `source` entirely inside `target`, centered.
///
/// One scaled edge matches the target exactly; the other is smaller and
/// padded equally on both sides (odd leftovers go to the far side).
pub fn letterbox_placement(source: (u32, u32), target: (u32, u32)) -> Placement {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: bars above and below
        let h = ((tgt_w as f64 / src_aspect).round() as u32).clamp(1, tgt_h);
        Placement {
            width: tgt_w,
            height: h,
            x: 0,
            y: (tgt_h - h) / 2,
        }
    } else {
        // Source is taller: bars left and right
        let w = ((tgt_h as f64 * src_aspect).round() as u32).clamp(1, tgt_w);
        Placement {
            width: w,
            height: tgt_h,
            x: (tgt_w - w) / 2,
            y: 0,
        }
    }
}

/// True when producing `target` from `source` enlarges either edge.
pub fn is_upscale(source: (u32, u32), target: (u32, u32)) -> bool {
    target.0 > source.0 || target.1 > source.1
}
