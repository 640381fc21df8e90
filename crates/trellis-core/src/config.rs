//! Interaction tuning shared by every canvas and editor.
//!
//! All distances suffixed `_px` are in screen pixels and are converted to
//! canvas units through the current transform at the point of use, so the
//! felt radius stays constant regardless of zoom.

use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};

/// Errors raised while loading an `InteractionConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid interaction config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`{field}` must be positive and finite, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Configuration for canvases, drag handlers and the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Snap radius for node placement. Default: **20 px**.
    pub node_snap_distance_px: f64,

    /// Snap radius for keyframe times. Default: **6 px**.
    pub keyframe_snap_distance_px: f64,

    /// Size assumed for neighbors when computing side-by-side snap slots.
    pub default_node_size: Size,

    /// Gap kept between a snapped node and its neighbor.
    pub snap_padding: Vec2,

    pub min_scale: f64,
    pub max_scale: f64,

    /// Scale multiplier per wheel notch. Default: **1.2**.
    pub zoom_step: f64,

    /// Upper bound for the scale chosen by fit-to-area, so tiny bounds are
    /// not magnified. Default: **1.0**.
    pub fit_max_scale: f64,

    /// Exponential easing rate of animated transitions, per second.
    pub transition_speed: f64,

    /// How far a jump-in/out transition starts from its target scale.
    pub jump_scale_factor: f64,

    /// Minimum pointer travel before a press counts as a drag.
    pub drag_threshold_px: f64,

    /// Canvas padding added around the selection when focusing it.
    pub focus_padding: f64,

    /// Maximum undo depth; older entries are dropped.
    pub max_undo_depth: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            node_snap_distance_px: 20.0,
            keyframe_snap_distance_px: 6.0,
            default_node_size: Size::new(110.0, 25.0),
            snap_padding: Vec2::new(20.0, 20.0),
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 1.2,
            fit_max_scale: 1.0,
            transition_speed: 10.0,
            jump_scale_factor: 3.0,
            drag_threshold_px: 0.0,
            focus_padding: 50.0,
            max_undo_depth: 100,
        }
    }
}

impl InteractionConfig {
    /// Parse a (possibly partial) JSON object; missing fields use defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if the JSON is malformed or a scale-related field
    /// is not a positive finite number.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields that would otherwise break the transform invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("zoom_step", self.zoom_step),
            ("fit_max_scale", self.fit_max_scale),
            ("jump_scale_factor", self.jump_scale_factor),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.max_scale < self.min_scale {
            return Err(ConfigError::OutOfRange {
                field: "max_scale",
                value: self.max_scale,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = InteractionConfig::from_json(r#"{ "node_snap_distance_px": 12.0 }"#).unwrap();
        assert_eq!(
            config,
            InteractionConfig {
                node_snap_distance_px: 12.0,
                ..InteractionConfig::default()
            }
        );
    }

    #[test]
    fn rejects_non_positive_zoom_step() {
        let err = InteractionConfig::from_json(r#"{ "zoom_step": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "zoom_step",
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            InteractionConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
