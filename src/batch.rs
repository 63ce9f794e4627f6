//! Batch processing: one request applied to many files.
//!
//! ## Input Expansion
//!
//! Each input path is either a file (taken as-is, whatever its extension) or
//! a directory, which is walked recursively for files with a supported
//! extension (`jpg`, `jpeg`, `png`, `webp`, case-insensitive). The combined
//! list is sorted so runs are reproducible.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── lobby_1080p.jpg
//! ├── stage-left_1080p.jpg
//! ├── stage-left-2_1080p.jpg    # second "stage-left.*" in the batch
//! └── ...
//! ```
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel with [rayon](https://docs.rs/rayon), each
//! as an independent pipeline invocation. A failure is recorded against its
//! item and never stops the others. Progress is streamed as [`BatchEvent`]s
//! over an optional channel so the CLI can print while work continues.

use crate::imaging::{
    ImageBackend, ImageMime, RustBackend, TransformError, TransformRequest,
    supported_input_extensions, transform_bytes,
};
use crate::naming::{file_stem, output_file_name};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
}

/// Why a single file failed.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// A successfully written output file.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenImage {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub mime: String,
    pub bytes: u64,
    pub met_budget: bool,
    pub warnings: Vec<String>,
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ItemDone {
        index: usize,
        source: PathBuf,
        written: WrittenImage,
    },
    ItemFailed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Ok(WrittenImage),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub source: PathBuf,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Per-item results, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Ok(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn total_bytes(&self) -> u64 {
        self.items
            .iter()
            .filter_map(|i| match &i.outcome {
                ItemOutcome::Ok(w) => Some(w.bytes),
                ItemOutcome::Failed { .. } => None,
            })
            .sum()
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Expand `inputs` into a sorted list of image files.
pub fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                    sources.push(entry.into_path());
                }
            }
        } else if input.is_file() {
            sources.push(input.clone());
        } else {
            return Err(BatchError::InputNotFound(input.clone()));
        }
    }
    sources.sort();
    sources.dedup();
    Ok(sources)
}

/// Output stems for `sources`, suffixing repeats with `-2`, `-3`, ...
///
/// A suffixed stem never collides with another source's own stem or with a
/// stem already handed out, so no two outputs share a name.
pub fn unique_stems(sources: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = sources
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            file_stem(&name).to_string()
        })
        .collect();
    let own: HashSet<&str> = stems.iter().map(String::as_str).collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();

    stems
        .iter()
        .map(|stem| {
            if taken.insert(stem.clone()) {
                return stem.clone();
            }
            let counter = next_suffix.entry(stem.as_str()).or_insert(2);
            loop {
                let candidate = format!("{stem}-{counter}");
                *counter += 1;
                if !own.contains(candidate.as_str()) && taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Read, transform and write one file.
///
/// `destination` maps the output mime type to the path to write.
pub fn transform_file(
    backend: &impl ImageBackend,
    source: &Path,
    request: &TransformRequest,
    destination: impl FnOnce(ImageMime) -> PathBuf,
) -> Result<WrittenImage, ItemError> {
    let bytes = fs::read(source)?;
    let out = transform_bytes(backend, &bytes, request)?;
    let path = destination(out.image.mime);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &out.image.bytes)?;
    debug!(source = %source.display(), output = %path.display(), size = out.image.len(), "wrote");

    Ok(WrittenImage {
        output: path,
        width: out.image.width,
        height: out.image.height,
        mime: out.image.mime.to_string(),
        bytes: out.image.len() as u64,
        met_budget: out.met_budget,
        warnings: out.warnings.iter().map(|w| w.to_string()).collect(),
    })
}

pub fn run_batch(
    sources: &[PathBuf],
    request: &TransformRequest,
    label: &str,
    out_dir: &Path,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    run_batch_with_backend(&RustBackend::new(), sources, request, label, out_dir, events)
}

/// Run a batch using a specific backend (allows testing with mock).
pub fn run_batch_with_backend(
    backend: &impl ImageBackend,
    sources: &[PathBuf],
    request: &TransformRequest,
    label: &str,
    out_dir: &Path,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    fs::create_dir_all(out_dir)?;
    let stems = unique_stems(sources);

    if let Some(tx) = &events {
        tx.send(BatchEvent::Started {
            total: sources.len(),
        })
        .ok();
    }

    let items = sources
        .par_iter()
        .zip(stems.par_iter())
        .enumerate()
        .map_with(events, |tx, (index, (source, stem))| {
            let result = transform_file(backend, source, request, |mime| {
                out_dir.join(output_file_name(stem, label, mime))
            });
            let (event, outcome) = match result {
                Ok(written) => (
                    BatchEvent::ItemDone {
                        index,
                        source: source.clone(),
                        written: written.clone(),
                    },
                    ItemOutcome::Ok(written),
                ),
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "batch item failed");
                    (
                        BatchEvent::ItemFailed {
                            index,
                            source: source.clone(),
                            error: e.to_string(),
                        },
                        ItemOutcome::Failed {
                            error: e.to_string(),
                        },
                    )
                }
            };
            if let Some(tx) = tx {
                tx.send(event).ok();
            }
            BatchItem {
                source: source.clone(),
                outcome,
            }
        })
        .collect();

    Ok(BatchReport { items })
}
