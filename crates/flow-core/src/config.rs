//! Canvas configuration.

use crate::error::FlowResult;
use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration shared by the store, drag controller and render sync.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Drawing surface width. Default: **1200**.
    pub width: f32,

    /// Drawing surface height. Default: **800**.
    pub height: f32,

    /// Grid cell size used for drag snapping. Default: **20**.
    pub grid_size: f32,

    /// Snap dragged positions to the grid. Default: **true**.
    pub snap_to_grid: bool,

    /// Padding added around member bounds to form a group rectangle.
    /// Default: **24**.
    pub group_padding: f32,

    /// Snapshots retained by the undo log; 0 keeps all. Default: **200**.
    pub history_limit: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            grid_size: 20.0,
            snap_to_grid: true,
            group_padding: 24.0,
            history_limit: 200,
        }
    }
}

impl CanvasConfig {
    pub fn from_json(json: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Round a single coordinate to the nearest grid line (halves round up).
    pub fn snap_value(&self, v: f32) -> f32 {
        if !self.snap_to_grid || self.grid_size <= 0.0 {
            return v;
        }
        (v / self.grid_size + 0.5).floor() * self.grid_size
    }

    pub fn snap(&self, x: f32, y: f32) -> (f32, f32) {
        (self.snap_value(x), self.snap_value(y))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
