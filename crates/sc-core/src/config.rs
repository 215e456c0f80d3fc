//! Engine configuration.
//!
//! Every field has a default, so a host may supply a partial JSON object
//! (or nothing at all) and override only what it cares about.

use crate::error::ConfigError;
use crate::layout::GridParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Maximum entries kept on each of the undo and redo stacks. Default: **50**.
    pub history_capacity: usize,

    pub min_zoom: f32,
    pub max_zoom: f32,

    /// Multiplier applied by one zoom-in / zoom-out step. Default: **1.2**.
    pub zoom_step: f32,

    /// Offset (canvas units) applied to copies made by `copy_selection`.
    pub copy_offset: f32,

    /// Grid used by the filter-driven rebuild.
    pub grid: GridParams,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            min_zoom: 0.1,
            max_zoom: 4.0,
            zoom_step: 1.2,
            copy_offset: 24.0,
            grid: GridParams::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".into(),
            ));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} is empty or non-positive",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.grid.item_width <= 0.0 || self.grid.item_height <= 0.0 {
            return Err(ConfigError::Invalid("grid items need a positive size".into()));
        }
        Ok(())
    }
}
