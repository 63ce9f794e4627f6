//! AV output presets.
//!
//! A preset names a target resolution and format for one class of device:
//! an HD display, a portrait signage screen, a touch panel. The built-in
//! catalog covers common AV targets; `[[presets]]` entries in `avfit.toml`
//! add more or replace a built-in by reusing its id.
//!
//! Presets live in a [`PresetRepository`] that callers build and pass
//! around. The pipeline itself never sees presets, only the
//! [`TransformRequest`](crate::imaging::TransformRequest) built from one.

use crate::imaging::OutputFormat;
use serde::Serialize;

/// A named target for one class of display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub use_case: String,
    pub format: OutputFormat,
}

impl Preset {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// `(id, name, width, height, use case, format)`
const BUILTIN: &[(&str, &str, u32, u32, &str, OutputFormat)] = &[
    (
        "1080p",
        "1080p Display",
        1920,
        1080,
        "Standard HD displays and monitors",
        OutputFormat::Jpeg,
    ),
    (
        "4k",
        "4K Display",
        3840,
        2160,
        "Ultra HD displays and projectors",
        OutputFormat::Jpeg,
    ),
    (
        "signage-landscape",
        "Digital Signage Landscape",
        1920,
        1080,
        "Horizontal digital signage displays",
        OutputFormat::Jpeg,
    ),
    (
        "signage-portrait",
        "Digital Signage Portrait",
        1080,
        1920,
        "Vertical digital signage displays",
        OutputFormat::Jpeg,
    ),
    (
        "powerpoint",
        "PowerPoint Optimized",
        1280,
        720,
        "Presentations and slide decks",
        OutputFormat::Jpeg,
    ),
    (
        "control-panel",
        "Control Panel UI",
        1024,
        768,
        "Touch panel interfaces and control systems",
        OutputFormat::Png,
    ),
    (
        "documentation",
        "Documentation/Web",
        800,
        600,
        "Web pages and documentation",
        OutputFormat::Jpeg,
    ),
];

/// The stock preset catalog, in display order.
pub fn builtin_presets() -> Vec<Preset> {
    BUILTIN
        .iter()
        .map(|&(id, name, width, height, use_case, format)| Preset {
            id: id.to_string(),
            name: name.to_string(),
            width,
            height,
            use_case: use_case.to_string(),
            format,
        })
        .collect()
}

/// Built-in presets merged with user-defined ones.
#[derive(Debug, Clone)]
pub struct PresetRepository {
    presets: Vec<Preset>,
}

impl Default for PresetRepository {
    fn default() -> Self {
        Self {
            presets: builtin_presets(),
        }
    }
}

impl PresetRepository {
    /// Built-ins first, in catalog order, then user presets.
    ///
    /// A user preset whose id matches a built-in replaces it in place.
    pub fn with_user_presets(user: impl IntoIterator<Item = Preset>) -> Self {
        let mut repo = Self::default();
        for preset in user {
            repo.insert(preset);
        }
        repo
    }

    /// Add a preset, replacing any existing one with the same id.
    pub fn insert(&mut self, preset: Preset) {
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn all(&self) -> &[Preset] {
        &self.presets
    }

    pub fn find(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.id.as_str()).collect()
    }
}
