//! Output format selection and mime mapping.
//!
//! Two closed enums replace free-form format strings:
//!
//! - [`OutputFormat`] — what the caller asked for (`original`, `jpeg`, `png`, `webp`).
//! - [`ImageMime`] — a concrete encodable type. `Original` resolves to the
//!   source's mime via [`OutputFormat::resolve`].
//!
//! | Name | Format | Mime | Extension |
//! |---|---|---|---|
//! | `original` | [`OutputFormat::Original`] | source's | source's |
//! | `jpg`, `jpeg` | [`OutputFormat::Jpeg`] | `image/jpeg` | `jpg` |
//! | `png` | [`OutputFormat::Png`] | `image/png` | `png` |
//! | `webp` | [`OutputFormat::WebP`] | `image/webp` | `webp` |

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A mime type the pipeline can both decode and encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMime {
    Jpeg,
    Png,
    WebP,
}

const MIME_TABLE: &[(ImageMime, &str, &str, ImageFormat)] = &[
    (ImageMime::Jpeg, "image/jpeg", "jpg", ImageFormat::Jpeg),
    (ImageMime::Png, "image/png", "png", ImageFormat::Png),
    (ImageMime::WebP, "image/webp", "webp", ImageFormat::WebP),
];

impl ImageMime {
    fn row(self) -> &'static (ImageMime, &'static str, &'static str, ImageFormat) {
        match self {
            Self::Jpeg => &MIME_TABLE[0],
            Self::Png => &MIME_TABLE[1],
            Self::WebP => &MIME_TABLE[2],
        }
    }

    pub fn as_str(self) -> &'static str {
        self.row().1
    }

    /// Preferred file extension, without the dot.
    pub fn extension(self) -> &'static str {
        self.row().2
    }

    pub fn image_format(self) -> ImageFormat {
        self.row().3
    }

    /// Whether quality settings change the encoded output.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }

    /// JPEG-family output is the only kind the size budget applies to.
    pub fn is_jpeg_family(self) -> bool {
        self == Self::Jpeg
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        MIME_TABLE
            .iter()
            .find(|(.., f)| *f == format)
            .map(|(mime, ..)| *mime)
    }

    /// Parse a mime string such as `image/png`. `image/jpg` is accepted as JPEG.
    pub fn from_mime_str(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s == "image/jpg" {
            return Some(Self::Jpeg);
        }
        MIME_TABLE
            .iter()
            .find(|(_, m, ..)| *m == s)
            .map(|(mime, ..)| *mime)
    }

    /// Guess from a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the source's format.
    #[default]
    Original,
    Jpeg,
    Png,
    #[serde(rename = "webp")]
    WebP,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format '{0}' (expected original, jpeg, jpg, png or webp)")]
pub struct UnknownFormat(pub String);

impl OutputFormat {
    /// Strict name lookup. `jpg` and `jpeg` both map to [`OutputFormat::Jpeg`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "original" => Some(Self::Original),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Lenient lookup: unknown names become JPEG.
    ///
    /// The second element is `true` when the fallback was taken so the caller
    /// can report it instead of silently changing the output type.
    pub fn from_name_or_jpeg(name: &str) -> (Self, bool) {
        match Self::from_name(name) {
            Some(format) => (format, false),
            None => (Self::Jpeg, true),
        }
    }

    /// The concrete mime type to encode, given the source's mime.
    pub fn resolve(self, source: ImageMime) -> ImageMime {
        match self {
            Self::Original => source,
            Self::Jpeg => ImageMime::Jpeg,
            Self::Png => ImageMime::Png,
            Self::WebP => ImageMime::WebP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
