//! The transform pipeline.
//!
//! These functions combine calculations with backend execution:
//!
//! ```text
//! RegionSelected → Resampled → Composited? → Encoded → SizeConstrained? → Done
//! ```
//!
//! Invalid dimensions fail before any pixel work. Decode and encode failures
//! are fatal for the invocation. The size budget is best-effort: a miss or an
//! internal re-compression failure becomes a [`TransformWarning`] and the
//! invocation still succeeds.

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::calculations::{
    SourceRegion, is_upscale, letterbox_placement, same_aspect, select_source_region,
};
use super::compress::{RecompressPolicy, constrain_size};
use super::params::{CropMode, EncodedImage, InvalidCropBox, Sharpening, TransformRequest};
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("invalid target dimensions {width}x{height}: both must be > 0")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("{0}")]
    InvalidCropBox(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

impl From<InvalidCropBox> for TransformError {
    fn from(e: InvalidCropBox) -> Self {
        Self::InvalidCropBox(e.to_string())
    }
}

/// Non-fatal conditions raised while producing a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformWarning {
    #[error("size budget of {budget} bytes not met, best attempt is {achieved} bytes")]
    CompressionBudgetNotMet { budget: u64, achieved: u64 },
    #[error("re-compression failed, kept the initial encode: {0}")]
    CompressionFailed(String),
    #[error("upscaling {}x{} source region to {}x{}", .region.0, .region.1, .target.0, .target.1)]
    Upscaling {
        region: (u32, u32),
        target: (u32, u32),
    },
}

/// Pipeline states an invocation passed through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RegionSelected,
    Resampled,
    Composited,
    Encoded,
    SizeConstrained,
    Done,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::RegionSelected => "region-selected",
            Stage::Resampled => "resampled",
            Stage::Composited => "composited",
            Stage::Encoded => "encoded",
            Stage::SizeConstrained => "size-constrained",
            Stage::Done => "done",
        }
    }
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub image: EncodedImage,
    pub source_dimensions: (u32, u32),
    pub region: SourceRegion,
    pub stages: Vec<Stage>,
    pub warnings: Vec<TransformWarning>,
    /// `true` when no budget applied or the budget was met.
    pub met_budget: bool,
}

impl TransformOutput {
    pub fn passed(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

fn validate_dimensions(request: &TransformRequest) -> Result<(), TransformError> {
    if request.target_width == 0 || request.target_height == 0 {
        return Err(TransformError::InvalidDimensions {
            width: request.target_width,
            height: request.target_height,
        });
    }
    Ok(())
}

/// Decode `bytes` and run [`transform`] on them.
pub fn transform_bytes(
    backend: &impl ImageBackend,
    bytes: &[u8],
    request: &TransformRequest,
) -> Result<TransformOutput, TransformError> {
    validate_dimensions(request)?;
    let source = backend.decode(bytes).map_err(|e| match e {
        BackendError::Encode(msg) => TransformError::Encode(msg),
        other => TransformError::Decode(other.to_string()),
    })?;
    transform(backend, &source, request)
}

/// Run the full pipeline on a decoded source.
pub fn transform(
    backend: &impl ImageBackend,
    source: &SourceImage,
    request: &TransformRequest,
) -> Result<TransformOutput, TransformError> {
    validate_dimensions(request)?;
    let target = (request.target_width, request.target_height);
    let source_dimensions = source.dimensions();
    let mut stages = Vec::with_capacity(6);
    let mut warnings = Vec::new();

    let region = select_source_region(source_dimensions, target, &request.crop);
    stages.push(Stage::RegionSelected);
    debug!(
        crop = request.crop.label(),
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        "source region selected"
    );

    let needs_letterbox =
        matches!(request.crop, CropMode::None) && !same_aspect(source_dimensions, target);
    // Letterboxed content only grows to its placement, not to the whole canvas
    let content = if needs_letterbox {
        let placement = letterbox_placement((region.width, region.height), target);
        (placement.width, placement.height)
    } else {
        target
    };
    if is_upscale((region.width, region.height), content) {
        warnings.push(TransformWarning::Upscaling {
            region: (region.width, region.height),
            target: content,
        });
    }

    let cropped: Cow<'_, DynamicImage> = if region.is_full(source_dimensions) {
        Cow::Borrowed(&source.pixels)
    } else {
        Cow::Owned(
            source
                .pixels
                .crop_imm(region.x, region.y, region.width, region.height),
        )
    };

    let raster = if needs_letterbox {
        let boxed = letterbox(backend, &cropped, target, request.sharpening());
        stages.push(Stage::Resampled);
        stages.push(Stage::Composited);
        boxed
    } else {
        let resampled = backend.resample(&cropped, target.0, target.1, request.sharpening());
        stages.push(Stage::Resampled);
        resampled
    };
    debug!(
        width = target.0,
        height = target.1,
        letterboxed = needs_letterbox,
        sharpen = request.sharpen_amount,
        "resampled"
    );

    let mime = request.format.resolve(source.mime);
    let bytes = backend
        .encode(&raster, mime, request.quality)
        .map_err(|e| TransformError::Encode(e.to_string()))?;
    let mut image = EncodedImage {
        bytes,
        mime,
        width: target.0,
        height: target.1,
    };
    stages.push(Stage::Encoded);
    debug!(%mime, quality = request.quality.value(), size = image.len(), "encoded");

    let mut met_budget = true;
    if let Some(budget) = request.budget()
        && mime.is_jpeg_family()
        && image.len() as u64 > budget
    {
        match constrain_size(
            backend,
            &image,
            budget,
            target.0.max(target.1),
            request.quality,
            RecompressPolicy::default(),
        ) {
            Ok(result) => {
                met_budget = result.met_budget;
                image = result.image;
                stages.push(Stage::SizeConstrained);
                if !met_budget {
                    warn!(
                        budget,
                        achieved = image.len(),
                        attempts = result.attempts,
                        "size budget not met"
                    );
                    warnings.push(TransformWarning::CompressionBudgetNotMet {
                        budget,
                        achieved: image.len() as u64,
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "re-compression failed, keeping initial encode");
                met_budget = false;
                warnings.push(TransformWarning::CompressionFailed(e.to_string()));
            }
        }
    }

    stages.push(Stage::Done);
    Ok(TransformOutput {
        image,
        source_dimensions,
        region,
        stages,
        warnings,
        met_budget,
    })
}

/// Fit `image` inside `target` on an opaque black canvas.
///
/// The content keeps its alpha; the result only has an alpha channel if the
/// input did.
pub fn letterbox(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    target: (u32, u32),
    sharpening: Option<Sharpening>,
) -> DynamicImage {
    let placement = letterbox_placement((image.width(), image.height()), target);
    let scaled = backend.resample(image, placement.width, placement.height, sharpening);

    let mut canvas = RgbaImage::from_pixel(target.0, target.1, Rgba([0, 0, 0, 255]));
    imageops::replace(
        &mut canvas,
        &scaled.to_rgba8(),
        placement.x as i64,
        placement.y as i64,
    );

    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }
}
