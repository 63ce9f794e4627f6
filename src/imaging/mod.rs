//! Image processing — pure Rust plus libwebp for lossy WebP.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::guess_format` + `load_from_memory_with_format` |
//! | **Resample** | Lanczos3 `resize_exact` + custom unsharp mask |
//! | **Letterbox** | `imageops::replace` onto a black canvas |
//! | **Encode** | `image` JPEG/PNG encoders, `webp` for WebP |
//! | **Size budget** | bounded JPEG re-compression loop |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for region and placement math (unit testable)
//! - **Parameters**: Data structures describing a transform request
//! - **Format**: Closed output-format and mime enums with one mapping table
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The pipeline combining calculations + backend

pub mod backend;
mod calculations;
pub mod compress;
mod format;
pub mod operations;
mod params;
pub mod rust_backend;
mod sharpen;

pub use backend::{BackendError, ImageBackend, SourceImage};
pub use calculations::{
    Placement, SourceRegion, is_upscale, letterbox_placement, same_aspect, select_source_region,
};
pub use compress::{RecompressPolicy, Recompressed, constrain_size};
pub use format::{ImageMime, OutputFormat, UnknownFormat};
pub use operations::{
    Stage, TransformError, TransformOutput, TransformWarning, letterbox, transform,
    transform_bytes,
};
pub use params::{
    ByteSize, CropBox, CropMode, EncodedImage, InvalidByteSize, InvalidCropBox,
    MIN_INTERACTIVE_FRACTION, Quality, Sharpening, TransformRequest,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use sharpen::unsharp_mask;
