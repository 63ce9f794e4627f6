//! CLI output formatting.
//!
//! # Result-First Display
//!
//! Every result leads with what was produced (output file, size, dimensions)
//! and shows the inputs that led there as indented context lines. Warnings
//! are indented under the item they belong to, so a batch log reads as an
//! inventory of outputs.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! out/lobby_1080p.jpg  1920x1080  image/jpeg  412.3 KB
//!     Source: photos/lobby.jpg
//!     Crop: auto-center
//!     Quality: 85  Sharpen: 0
//!     Budget: 400.0 KB (not met)
//!     Warning: size budget of 409600 bytes not met, best attempt is 422195 bytes
//! ```
//!
//! ## Batch
//!
//! ```text
//! Processing 3 images
//! 001 lobby_1080p.jpg  1920x1080  412.3 KB
//! 002 FAILED photos/broken.png
//!     Error: decode failed: ...
//! 003 stage_1080p.jpg  1920x1080  388.0 KB
//!
//! Processed 2 of 3 images (800.3 KB), 1 failed
//! ```
//!
//! ## Presets
//!
//! ```text
//! 1080p              1920x1080  jpeg  1080p Display
//!     Standard HD displays and monitors
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::batch::{BatchEvent, BatchReport, WrittenImage};
use crate::imaging::{ByteSize, CropMode, TransformRequest};
use crate::presets::Preset;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `name  WxH  size`, the headline for a written image.
fn written_line(written: &WrittenImage) -> String {
    format!(
        "{}  {}x{}  {}",
        file_name(&written.output),
        written.width,
        written.height,
        ByteSize(written.bytes)
    )
}

fn warning_lines(warnings: &[String], depth: usize) -> Vec<String> {
    warnings
        .iter()
        .map(|w| format!("{}Warning: {}", indent(depth), w))
        .collect()
}

// ============================================================================
// Resize
// ============================================================================

/// Format the result of a single `resize`.
pub fn format_resize_output(
    source: &Path,
    request: &TransformRequest,
    written: &WrittenImage,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {}x{}  {}  {}",
        written.output.display(),
        written.width,
        written.height,
        written.mime,
        ByteSize(written.bytes)
    )];
    lines.push(format!("{}Source: {}", indent(1), source.display()));
    let crop = match request.crop {
        CropMode::None => "none (letterbox if aspect differs)".to_string(),
        CropMode::AutoCenter => "auto-center".to_string(),
        CropMode::Explicit(b) => format!(
            "explicit x={:.3} y={:.3} w={:.3} h={:.3}",
            b.x(),
            b.y(),
            b.width(),
            b.height()
        ),
    };
    lines.push(format!("{}Crop: {}", indent(1), crop));
    lines.push(format!(
        "{}Quality: {}  Sharpen: {}",
        indent(1),
        request.quality.value(),
        request.sharpen_amount
    ));
    if let Some(budget) = request.budget() {
        let status = if written.met_budget { "met" } else { "not met" };
        lines.push(format!(
            "{}Budget: {} ({})",
            indent(1),
            ByteSize(budget),
            status
        ));
    }
    lines.extend(warning_lines(&written.warnings, 1));
    lines
}

/// Print the result of a single `resize` to stdout.
pub fn print_resize_output(source: &Path, request: &TransformRequest, written: &WrittenImage) {
    for line in format_resize_output(source, request, written) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Processing {} {}", total, noun)]
        }
        BatchEvent::ItemDone { index, written, .. } => {
            let mut lines = vec![format!(
                "{} {}",
                format_index(index + 1),
                written_line(written)
            )];
            lines.extend(warning_lines(&written.warnings, 1));
            lines
        }
        BatchEvent::ItemFailed {
            index,
            source,
            error,
        } => vec![
            format!("{} FAILED {}", format_index(index + 1), source.display()),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

/// Format the closing summary line of a batch.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let total = report.items.len();
    let mut line = format!(
        "Processed {} of {} images ({})",
        report.succeeded(),
        total,
        ByteSize(report.total_bytes())
    );
    if report.failed() > 0 {
        line.push_str(&format!(", {} failed", report.failed()));
    }
    vec![String::new(), line]
}

/// Print the closing summary of a batch to stdout.
pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Format the preset catalog: one header line per preset plus its use case.
pub fn format_presets(presets: &[Preset]) -> Vec<String> {
    let id_width = presets.iter().map(|p| p.id.len()).max().unwrap_or(0);
    let mut lines = Vec::new();
    for p in presets {
        let size = format!("{}x{}", p.width, p.height);
        lines.push(format!(
            "{:<id_width$}  {:<9}  {:<4}  {}",
            p.id,
            size,
            p.format.name(),
            p.name
        ));
        if !p.use_case.is_empty() {
            lines.push(format!("{}{}", indent(1), p.use_case));
        }
    }
    lines
}

/// Print the preset catalog to stdout.
pub fn print_presets(presets: &[Preset]) {
    for line in format_presets(presets) {
        println!("{}", line);
    }
}
