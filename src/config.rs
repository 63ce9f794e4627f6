//! Application configuration module.
//!
//! Handles loading, validating, and merging `avfit.toml`. Stock defaults are
//! overridden by the user's file, and CLI flags override both when a
//! [`TransformRequest`] is resolved.
//!
//! ## Config File Location
//!
//! `avfit` reads `--config <FILE>` when given, otherwise `avfit.toml` in the
//! working directory if it exists, otherwise the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! quality = 85           # Lossy encoding quality (1-100)
//! sharpen = 0            # Unsharp mask strength (0-100, 0 = off)
//! format = "original"    # original | jpeg | jpg | png | webp
//! auto_crop = false      # Center-crop to the target aspect instead of letterboxing
//! max_size = "0"         # JPEG size budget: "0" = none, "500KB", "2MB", "250000"
//!
//! [processing]
//! max_processes = 4      # Max parallel workers (omit for auto = CPU cores)
//!
//! [[presets]]            # Extra presets; reuse a built-in id to replace it
//! id = "lobby-wall"
//! name = "Lobby Video Wall"
//! width = 3840
//! height = 1080
//! use_case = "Stretched lobby display"
//! format = "jpeg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{ByteSize, CropBox, CropMode, OutputFormat, Quality, TransformRequest};
use crate::presets::{Preset, PresetRepository};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "avfit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unknown preset '{id}' (available: {available})")]
    UnknownPreset { id: String, available: String },
}

/// Configuration loaded from `avfit.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Request defaults used when a CLI flag is absent.
    pub defaults: DefaultsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// User-defined presets.
    pub presets: Vec<PresetConfig>,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.defaults;
        if !(1..=100).contains(&d.quality) {
            return Err(ConfigError::Validation(
                "defaults.quality must be 1-100".into(),
            ));
        }
        if d.sharpen > 100 {
            return Err(ConfigError::Validation(
                "defaults.sharpen must be 0-100".into(),
            ));
        }
        if OutputFormat::from_name(&d.format).is_none() {
            return Err(ConfigError::Validation(format!(
                "defaults.format '{}' is not one of original, jpeg, jpg, png, webp",
                d.format
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        for (i, p) in self.presets.iter().enumerate() {
            if p.id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "presets[{i}].id must not be empty"
                )));
            }
            if p.width == 0 || p.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "preset '{}' must have non-zero width and height",
                    p.id
                )));
            }
            if self.presets[..i].iter().any(|other| other.id == p.id) {
                return Err(ConfigError::Validation(format!(
                    "preset '{}' is defined twice",
                    p.id
                )));
            }
        }
        Ok(())
    }

    /// The default output format. Validated configs always parse.
    pub fn default_format(&self) -> OutputFormat {
        OutputFormat::from_name(&self.defaults.format).unwrap_or_default()
    }

    /// Built-in presets merged with `[[presets]]`.
    pub fn preset_repository(&self) -> PresetRepository {
        PresetRepository::with_user_presets(self.presets.iter().map(PresetConfig::to_preset))
    }
}

/// Request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Unsharp mask slider (0 = off, 100 = strongest).
    pub sharpen: u32,
    /// Output format name.
    pub format: String,
    /// Center-crop to the target aspect instead of letterboxing.
    pub auto_crop: bool,
    /// JPEG byte budget; zero means unconstrained.
    pub max_size: ByteSize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            sharpen: 0,
            format: OutputFormat::Original.name().to_string(),
            auto_crop: false,
            max_size: ByteSize(0),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// A `[[presets]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_case: Option<String>,
    /// Free-form format name; unknown names fall back to JPEG with a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl PresetConfig {
    pub fn to_preset(&self) -> Preset {
        let format = match self.format.as_deref() {
            None => OutputFormat::Jpeg,
            Some(name) => {
                let (format, fell_back) = OutputFormat::from_name_or_jpeg(name);
                if fell_back {
                    warn!(preset = %self.id, format = name, "unknown preset format, using jpeg");
                }
                format
            }
        };
        Preset {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            width: self.width,
            height: self.height,
            use_case: self.use_case.clone().unwrap_or_default(),
            format,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or from [`CONFIG_FILE_NAME`] in the working
/// directory when `path` is `None`.
///
/// An explicit path must exist; the implicit one is optional.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(toml::from_str(&fs::read_to_string(p)?)?),
        None => load_raw_config(Path::new(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Per-invocation settings from the command line. `None` defers to config.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub preset: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<OutputFormat>,
    pub quality: Option<u32>,
    pub sharpen: Option<u32>,
    /// `Some(false)` turns off an `auto_crop = true` from config.
    pub auto_crop: Option<bool>,
    pub crop_box: Option<CropBox>,
    pub max_size: Option<ByteSize>,
}

/// A request plus the label used in output file names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub request: TransformRequest,
    /// Preset id, or `<width>x<height>` for ad-hoc sizes.
    pub label: String,
}

/// Combine config defaults, an optional preset and CLI overrides.
///
/// Precedence, most specific first: CLI flag, preset, `[defaults]`.
/// Explicit `--width`/`--height` override the preset's dimensions.
pub fn resolve_request(
    config: &AppConfig,
    presets: &PresetRepository,
    overrides: &RequestOverrides,
) -> Result<ResolvedRequest, ConfigError> {
    let preset = match overrides.preset.as_deref() {
        Some(id) => Some(presets.find(id).ok_or_else(|| ConfigError::UnknownPreset {
            id: id.to_string(),
            available: presets.ids().join(", "),
        })?),
        None => None,
    };

    let width = overrides.width.or(preset.map(|p| p.width));
    let height = overrides.height.or(preset.map(|p| p.height));
    let (Some(width), Some(height)) = (width, height) else {
        return Err(ConfigError::Validation(
            "no target size: pass --preset, or both --width and --height".into(),
        ));
    };

    let label = match preset {
        Some(p) if (width, height) == p.dimensions() => p.id.clone(),
        _ => format!("{width}x{height}"),
    };

    let format = overrides
        .format
        .or(preset.map(|p| p.format))
        .unwrap_or_else(|| config.default_format());
    let quality = Quality::new(overrides.quality.unwrap_or(config.defaults.quality));
    let sharpen_amount = overrides.sharpen.unwrap_or(config.defaults.sharpen).min(100);
    let crop = CropMode::from_flags(
        overrides.auto_crop.unwrap_or(config.defaults.auto_crop),
        overrides.crop_box,
    );
    let budget = overrides.max_size.unwrap_or(config.defaults.max_size).bytes();

    Ok(ResolvedRequest {
        request: TransformRequest {
            target_width: width,
            target_height: height,
            format,
            quality,
            sharpen_amount,
            crop,
            target_file_size: (budget > 0).then_some(budget),
        },
        label,
    })
}

/// Returns a fully-commented stock `avfit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# avfit Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# avfit reads --config <FILE> when given, otherwise ./avfit.toml if present.
# Command-line flags override everything in this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Request defaults
# ---------------------------------------------------------------------------
[defaults]
# Lossy encoding quality for JPEG and WebP (1 = worst, 100 = best).
quality = 85

# Unsharp mask strength applied after resampling (0 = off, 100 = strongest).
sharpen = 0

# Output format: original (keep the source format), jpeg, jpg, png or webp.
format = "original"

# Center-crop to the target aspect ratio instead of letterboxing.
auto_crop = false

# Maximum JPEG file size. "0" disables the budget.
# Accepts plain bytes ("250000") or KB / MB suffixes ("500KB", "2MB").
max_size = "0"

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers for `avfit batch`.
# Omit to use all CPU cores. Larger values are clamped to the core count.
# max_processes = 4

# ---------------------------------------------------------------------------
# Custom presets
# ---------------------------------------------------------------------------
# Add your own targets, or reuse a built-in id (1080p, 4k, signage-landscape,
# signage-portrait, powerpoint, control-panel, documentation) to replace it.
#
# [[presets]]
# id = "lobby-wall"
# name = "Lobby Video Wall"
# width = 3840
# height = 1080
# use_case = "Stretched lobby display"
# format = "jpeg"
"##
}
