//! Output file naming.
//!
//! Every produced file is named `<stem>_<label>.<ext>`:
//!
//! - **stem**: the source file name up to its first `.` (`lobby.final.png` → `lobby`)
//! - **label**: the preset id, or `<width>x<height>` for ad-hoc sizes
//! - **ext**: from the output mime type (`jpg`, `png`, `webp`)
//!
//! ```text
//! IMG_0042.jpeg + 1080p          + image/jpeg → IMG_0042_1080p.jpg
//! floorplan.v2.png + 1024x768    + image/png  → floorplan_1024x768.png
//! ```

use crate::imaging::ImageMime;

/// Used when the source name has no usable stem (e.g. `.png`).
const FALLBACK_STEM: &str = "image";

/// The part of `source_name` before its first `.`.
pub fn file_stem(source_name: &str) -> &str {
    let stem = source_name.split('.').next().unwrap_or_default();
    if stem.is_empty() { FALLBACK_STEM } else { stem }
}

/// Build the output file name for a transformed image.
pub fn output_file_name(source_name: &str, label: &str, mime: ImageMime) -> String {
    format!("{}_{}.{}", file_stem(source_name), label, mime.extension())
}
