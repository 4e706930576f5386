//! Editor configuration.

use card_core::{CanvasSize, EditorError, EditorResult};
use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

/// Tunables for an [`Editor`](crate::editor::Editor).
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum retained history snapshots. Default: **50**.
    pub history_depth: usize,

    /// Offset applied on both axes to a duplicated node. Default: **10**.
    pub duplicate_offset: f32,

    /// Arrow-key nudge distance. Shift+arrow always moves exactly ten
    /// times this. Default: **1**.
    pub nudge_step: f32,

    /// Zoom in/out increment in percentage points. Default: **10**.
    pub zoom_step: f32,

    /// Zoom clamp, in percent. Defaults: **10** and **400**.
    pub min_zoom: f32,
    pub max_zoom: f32,

    /// Initial artboard size. Default: **600×400**.
    pub canvas_size: CanvasSize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 50,
            duplicate_offset: 10.0,
            nudge_step: 1.0,
            zoom_step: 10.0,
            min_zoom: 10.0,
            max_zoom: 400.0,
            canvas_size: CanvasSize::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config. The top level must be an
    /// object.
    pub fn from_json(text: &str) -> EditorResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(EditorError::Parse("editor config must be a JSON object".into()));
        }
        let config: EditorConfig = serde_json::from_value(value)?;
        Ok(config.sanitized())
    }

    /// Large nudge distance: always ten steps.
    pub fn large_nudge(&self) -> f32 {
        self.nudge_step * 10.0
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Repair values no editor can run with: at least one history entry,
    /// a minimum zoom of 1% and `max_zoom >= min_zoom`.
    pub(crate) fn sanitized(mut self) -> Self {
        self.history_depth = self.history_depth.max(1);
        self.min_zoom = self.min_zoom.max(1.0);
        if self.max_zoom.is_nan() || self.max_zoom < self.min_zoom {
            self.max_zoom = self.min_zoom;
        }
        self
    }
}
