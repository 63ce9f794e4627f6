//! Size-constrained JPEG re-compression.
//!
//! A bounded retry loop: each attempt shrinks width, height and quality by
//! the same step and re-encodes, stopping as soon as the buffer fits the
//! budget. The smallest buffer seen is kept, so a miss still returns the best
//! effort, and the caller is told explicitly whether the budget was met.

use super::backend::{BackendError, ImageBackend};
use super::format::ImageMime;
use super::params::{EncodedImage, Quality};
use image::DynamicImage;
use tracing::debug;

/// How hard to try before giving up on a size budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecompressPolicy {
    pub max_iterations: u32,
    /// Multiplier applied to width, height and quality on every attempt.
    pub step: f32,
}

impl Default for RecompressPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            step: 0.95,
        }
    }
}

/// Outcome of [`constrain_size`].
#[derive(Debug, Clone)]
pub struct Recompressed {
    pub image: EncodedImage,
    pub met_budget: bool,
    /// Encodes performed (0 when the input already fit).
    pub attempts: u32,
}

/// Scale `(width, height)` down so the longer edge is at most `max_dim`.
fn clamp_to_max_dimension(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dim || max_dim == 0 {
        return (width, height);
    }
    let scale = max_dim as f64 / longest as f64;
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

fn scaled(value: u32, factor: f32) -> u32 {
    ((value as f64 * factor as f64).round() as u32).max(1)
}

/// Re-encode `initial` as JPEG until it fits in `budget` bytes.
///
/// `max_dimension` caps the longer edge before the first attempt; the
/// pipeline passes `max(target_width, target_height)`. Decode and encode
/// failures are returned as errors so the caller can fall back to `initial`.
pub fn constrain_size(
    backend: &impl ImageBackend,
    initial: &EncodedImage,
    budget: u64,
    max_dimension: u32,
    quality: Quality,
    policy: RecompressPolicy,
) -> Result<Recompressed, BackendError> {
    if initial.len() as u64 <= budget {
        return Ok(Recompressed {
            image: initial.clone(),
            met_budget: true,
            attempts: 0,
        });
    }

    let decoded = backend.decode(&initial.bytes)?.pixels;
    let (mut width, mut height) =
        clamp_to_max_dimension(decoded.width(), decoded.height(), max_dimension);
    let mut factor = quality.factor();
    let mut best = initial.clone();
    let mut attempts = 0;

    while attempts < policy.max_iterations {
        attempts += 1;
        width = scaled(width, policy.step);
        height = scaled(height, policy.step);
        factor *= policy.step;
        let q = Quality::from_factor(factor);

        let candidate = attempt(backend, &decoded, width, height, q)?;
        debug!(
            attempt = attempts,
            width,
            height,
            quality = q.value(),
            size = candidate.len(),
            budget,
            "recompression attempt"
        );
        if candidate.len() < best.len() {
            best = candidate;
        }
        if best.len() as u64 <= budget {
            break;
        }
    }

    Ok(Recompressed {
        met_budget: best.len() as u64 <= budget,
        image: best,
        attempts,
    })
}

fn attempt(
    backend: &impl ImageBackend,
    decoded: &DynamicImage,
    width: u32,
    height: u32,
    quality: Quality,
) -> Result<EncodedImage, BackendError> {
    let resized = backend.resample(decoded, width, height, None);
    let bytes = backend.encode(&resized, ImageMime::Jpeg, quality)?;
    Ok(EncodedImage {
        bytes,
        mime: ImageMime::Jpeg,
        width,
        height,
    })
}
