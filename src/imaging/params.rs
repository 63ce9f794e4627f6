//! Parameter types for the transform pipeline.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between callers (CLI, batch runner, or any other host) and the
//! [`operations`](super::operations) module that runs the pipeline on a
//! [`backend`](super::backend).
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`Sharpening`] — Unsharp-mask parameters (amount, radius, threshold).
//! - [`CropBox`] / [`CropMode`] — Which part of the source to keep.
//! - [`TransformRequest`] — Full specification of one pipeline invocation.
//! - [`EncodedImage`] — Encoded output bytes plus their mime type and size.
//! - [`ByteSize`] — Human-friendly byte counts (`500KB`, `2MB`).

use super::format::{ImageMime, OutputFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality setting for lossy image encoding (1-100).
///
/// The value is always within range: every constructor, deserialization
/// included, goes through [`Quality::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as a `0.0–1.0` factor.
    pub fn factor(self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Build from a `0.0–1.0` factor, rounding to the nearest step.
    pub fn from_factor(factor: f32) -> Self {
        Self::new((factor * 100.0).round().max(0.0) as u32)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Unsharp-mask parameters.
///
/// - `amount`: Strength in percent (100 = add the full edge difference once)
/// - `radius`: Sigma of the Gaussian blur that defines "edge"
/// - `threshold`: Minimum luma difference (0-255) before a pixel is touched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub amount: f32,
    pub radius: f32,
    pub threshold: u8,
}

impl Sharpening {
    pub const RADIUS: f32 = 0.6;
    pub const THRESHOLD: u8 = 2;

    /// Map the user-facing 0-100 slider to mask parameters.
    ///
    /// Returns `None` for 0: no sharpening pass at all.
    pub fn from_slider(sharpen_amount: u32) -> Option<Self> {
        let slider = sharpen_amount.min(100);
        (slider > 0).then(|| Self {
            amount: slider as f32 * 1.5,
            radius: Self::RADIUS,
            threshold: Self::THRESHOLD,
        })
    }
}

/// Smallest crop edge an interactive editor should let the user draw,
/// as a fraction of the source edge.
pub const MIN_INTERACTIVE_FRACTION: f64 = 0.05;

const CROP_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid crop box: {0}")]
pub struct InvalidCropBox(pub String);

/// A crop rectangle in fractions of the source dimensions.
///
/// Always satisfies `x + width <= 1`, `y + height <= 1` and positive
/// `width`/`height`; out-of-range boxes are rejected by [`CropBox::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl CropBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, InvalidCropBox> {
        let values = [("x", x), ("y", y), ("width", width), ("height", height)];
        for (name, v) in values {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(InvalidCropBox(format!("{name} = {v} is outside [0, 1]")));
            }
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(InvalidCropBox("width and height must be positive".into()));
        }
        if x + width > 1.0 + CROP_TOLERANCE {
            return Err(InvalidCropBox(format!(
                "x + width = {} exceeds 1",
                x + width
            )));
        }
        if y + height > 1.0 + CROP_TOLERANCE {
            return Err(InvalidCropBox(format!(
                "y + height = {} exceeds 1",
                y + height
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// The whole image.
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Parses `x,y,width,height`.
impl FromStr for CropBox {
    type Err = InvalidCropBox;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| InvalidCropBox(format!("'{s}': {e}")))?;
        match parts.as_slice() {
            [x, y, w, h] => Self::new(*x, *y, *w, *h),
            _ => Err(InvalidCropBox(format!(
                "'{s}': expected four comma-separated values"
            ))),
        }
    }
}

/// Which part of the source to keep.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CropMode {
    /// Keep everything; letterbox if the aspect differs.
    #[default]
    None,
    /// Crop the longer dimension symmetrically to the target aspect.
    AutoCenter,
    /// Use exactly this box; the aspect may change when resampled.
    Explicit(CropBox),
}

impl CropMode {
    /// Resolve independent UI flags. Explicit beats auto-center beats none.
    pub fn from_flags(auto_center: bool, explicit: Option<CropBox>) -> Self {
        match (explicit, auto_center) {
            (Some(b), _) => Self::Explicit(b),
            (None, true) => Self::AutoCenter,
            (None, false) => Self::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AutoCenter => "auto-center",
            Self::Explicit(_) => "explicit",
        }
    }
}

/// Everything one pipeline invocation needs besides the source pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub target_width: u32,
    pub target_height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
    /// 0-100; 0 disables sharpening.
    pub sharpen_amount: u32,
    pub crop: CropMode,
    /// Byte ceiling. `None` or `Some(0)` means unconstrained.
    pub target_file_size: Option<u64>,
}

impl TransformRequest {
    /// A request with default quality, no sharpening, no crop and no budget.
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
            format: OutputFormat::Original,
            quality: Quality::default(),
            sharpen_amount: 0,
            crop: CropMode::None,
            target_file_size: None,
        }
    }

    pub fn sharpening(&self) -> Option<Sharpening> {
        Sharpening::from_slider(self.sharpen_amount)
    }

    /// The effective byte budget, if any.
    pub fn budget(&self) -> Option<u64> {
        self.target_file_size.filter(|&b| b > 0)
    }
}

/// Encoded pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A byte count that parses from and prints as `B` / `KB` / `MB` (binary units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const KB: u64 = 1024;
    pub const MB: u64 = 1024 * 1024;

    pub fn bytes(self) -> u64 {
        self.0
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid size '{0}' (expected e.g. 0, 250000, 500KB or 2MB)")]
pub struct InvalidByteSize(pub String);

impl FromStr for ByteSize {
    type Err = InvalidByteSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let (number, unit) = if let Some(n) = upper.strip_suffix("MB") {
            (n, Self::MB)
        } else if let Some(n) = upper.strip_suffix("KB") {
            (n, Self::KB)
        } else if let Some(n) = upper.strip_suffix('B') {
            (n, 1)
        } else {
            (upper.as_str(), 1)
        };
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| InvalidByteSize(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(InvalidByteSize(s.to_string()));
        }
        Ok(Self((value * unit as f64).round() as u64))
    }
}

impl TryFrom<String> for ByteSize {
    type Error = InvalidByteSize;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ByteSize> for String {
    fn from(size: ByteSize) -> Self {
        size.0.to_string()
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        if b < Self::KB {
            write!(f, "{b} B")
        } else if b < Self::MB {
            write!(f, "{:.1} KB", b as f64 / Self::KB as f64)
        } else {
            write!(f, "{:.1} MB", b as f64 / Self::MB as f64)
        }
    }
}
