//! Session tuning, loadable from a JSON file.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "gestures": { "debounce_frames": 3 }, "pipeline": { "mode": "latest" } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use airsketch_common::config::{read_json_file, write_json_file};
use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::geometry::CanvasMapping;
use airsketch_model::stroke::Rgba;
use airsketch_processing::{ClassifierConfig, SmoothingConfig, StrokeConfig};
use airsketch_render::RasterStyle;

use crate::handoff::HandoffMode;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub canvas: CanvasConfig,
    pub smoothing: SmoothingConfig,
    pub gestures: ClassifierConfig,
    pub strokes: StrokeConfig,
    pub pipeline: PipelineConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,

    /// Flip camera X so the drawing follows the hand like a mirror.
    pub mirror_x: bool,

    pub background: Rgba,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            mirror_x: true,
            background: Rgba::WHITE,
        }
    }
}

impl CanvasConfig {
    pub fn mapping(&self) -> CanvasMapping {
        CanvasMapping::new(self.width, self.height, self.mirror_x)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: HandoffMode,

    /// Processing time per frame before it counts as an overrun.
    pub frame_budget_ms: u64,

    /// How long a render may take before the frame loop stops waiting.
    pub render_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: HandoffMode::Ordered,
            frame_budget_ms: 33,
            render_timeout_ms: 50,
        }
    }
}

/// Files written when the session ends.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Raster image of the final canvas.
    pub image: Option<PathBuf>,

    /// Sketch document with the sealed strokes.
    pub sketch: Option<PathBuf>,
}

impl SessionConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> SketchResult<Self> {
        let config: Self = read_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> SketchResult<()> {
        write_json_file(path, self)
    }

    pub fn validate(&self) -> SketchResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(SketchError::config("canvas dimensions must be non-zero"));
        }
        self.smoothing.validate()?;
        self.gestures.validate()?;
        self.strokes.validate()?;
        if self.pipeline.frame_budget_ms == 0 {
            return Err(SketchError::config("pipeline.frame_budget_ms must be positive"));
        }
        Ok(())
    }

    pub fn raster_style(&self) -> RasterStyle {
        RasterStyle::new(self.canvas.width, self.canvas.height, self.canvas.background)
            .with_erase_radius(self.strokes.erase_radius)
    }
}
