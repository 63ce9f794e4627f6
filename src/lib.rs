//! # avfit
//!
//! Fit images to AV targets: HD and 4K displays, portrait and landscape
//! signage, touch panels, slide decks. One request describes the target size,
//! format, quality, sharpening, crop and an optional byte budget; the
//! pipeline turns source bytes into output bytes.
//!
//! # Architecture: Five-Stage Pipeline
//!
//! ```text
//! 1. Region select   none / auto-center / explicit box → source rectangle
//! 2. Resample        Lanczos3 to target size, optional unsharp mask
//! 3. Letterbox       black bars, only for "none" with a different aspect
//! 4. Encode          JPEG / PNG / WebP at the requested quality
//! 5. Size budget     bounded JPEG re-compression (optional)
//! ```
//!
//! Each stage's output is the next stage's input. Invocations share no state,
//! so a batch runs them in parallel without coordination.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The pipeline: geometry, backend trait, encoders, re-compression |
//! | [`presets`] | Built-in AV preset catalog and the user-extensible repository |
//! | [`config`] | `avfit.toml` loading, validation, merging, request resolution |
//! | [`naming`] | `<stem>_<label>.<ext>` output file names |
//! | [`batch`] | Parallel batch runner with per-item failure collection |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Format Enum
//!
//! Output formats are an enum with one mapping table to mime types and
//! extensions. The command line rejects unknown names. Only preset files keep
//! the old lenient behavior (unknown → JPEG), and it logs when it happens.
//!
//! ## Explicit Budget Outcome
//!
//! The re-compressor returns whether the byte budget was met alongside the
//! best buffer it produced. A miss, or a failure inside the loop, becomes a
//! warning on the result instead of an error: the caller always gets a
//! usable image and always knows if it is over budget.
//!
//! ## Crop Precedence
//!
//! An explicit crop box beats auto-center, which beats no crop
//! ([`imaging::CropMode::from_flags`]). Crop boxes outside the unit square
//! are rejected rather than clamped.
//!
//! ## Injected Presets
//!
//! Presets live in a [`presets::PresetRepository`] built from config and passed
//! to whoever resolves requests. The pipeline only sees a
//! [`imaging::TransformRequest`].

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod presets;

#[cfg(test)]
pub(crate) mod test_helpers;
