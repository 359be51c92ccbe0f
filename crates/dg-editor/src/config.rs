//! Interaction tuning: anchor sizes, tolerances, and the multi-select key.

use crate::input::Modifiers;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid interaction config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid interaction config: {0}")]
    Invalid(String),
}

/// Modifier key that turns a click into add/remove-from-selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiSelectKey {
    #[default]
    Ctrl,
    Shift,
    Meta,
}

impl MultiSelectKey {
    pub fn held(self, modifiers: Modifiers) -> bool {
        match self {
            MultiSelectKey::Ctrl => modifiers.ctrl,
            MultiSelectKey::Shift => modifiers.shift,
            MultiSelectKey::Meta => modifiers.meta,
        }
    }
}

/// Configuration for the reference controller.
///
/// Every field is optional in JSON; missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Side length of an anchor handle. Default: **6**.
    pub anchor_size: f32,

    /// Extra slack around an anchor handle that still counts as "near".
    /// Default: **3**.
    pub anchor_tolerance: f32,

    /// Slack around shape outlines for hit testing (connectors are thin).
    /// Default: **4**.
    pub hit_tolerance: f32,

    /// Distance within which a connector endpoint snaps onto a connection
    /// point. Default: **8**.
    pub snap_tolerance: f32,

    /// Smallest width or height a corner drag can shrink a shape to.
    /// Default: **10**.
    pub min_shape_size: f32,

    pub multi_select: MultiSelectKey,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            anchor_size: 6.0,
            anchor_tolerance: 3.0,
            hit_tolerance: 4.0,
            snap_tolerance: 8.0,
            min_shape_size: 10.0,
            multi_select: MultiSelectKey::Ctrl,
        }
    }
}

impl InteractionConfig {
    /// Parse a JSON object and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: InteractionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sizes must be positive and tolerances non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("anchor_size", self.anchor_size),
            ("min_shape_size", self.min_shape_size),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("anchor_tolerance", self.anchor_tolerance),
            ("hit_tolerance", self.hit_tolerance),
            ("snap_tolerance", self.snap_tolerance),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
