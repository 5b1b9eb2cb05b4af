//! Editor configuration.
//!
//! Plain structs with defaults; any subset of fields can be supplied from a
//! TOML document, e.g.
//!
//! ```toml
//! history_depth = 200
//! nudge_large = 8
//!
//! [snap]
//! tolerance = 4
//! grid_size = 8
//! ```

use lk_spatial::SnapConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum undo entries kept.
    pub history_depth: usize,
    /// Pointer travel before a press becomes a drag.
    pub drag_threshold: f64,
    /// Arrow-key nudge distance.
    pub nudge: f64,
    /// Shift+arrow nudge distance.
    pub nudge_large: f64,
    /// Rotation snap increment in degrees.
    pub rotation_step: f64,
    /// How close to an increment a rotation must be to snap.
    pub rotation_tolerance: f64,
    pub snap: SnapConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            drag_threshold: 3.0,
            nudge: 1.0,
            nudge_large: 10.0,
            rotation_step: 15.0,
            rotation_tolerance: 3.0,
            snap: SnapConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid("history_depth must be at least 1".into()));
        }
        let non_negative = [
            ("drag_threshold", self.drag_threshold),
            ("nudge", self.nudge),
            ("nudge_large", self.nudge_large),
            ("rotation_step", self.rotation_step),
            ("rotation_tolerance", self.rotation_tolerance),
            ("snap.tolerance", self.snap.tolerance),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!("{name} must be a finite, non-negative number")));
            }
        }
        if self.snap.grid_size.is_some_and(|g| g <= 0.0) {
            return Err(ConfigError::Invalid("snap.grid_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EditorConfig::from_toml_str("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = EditorConfig::from_toml_str(
            r#"
history_depth = 20

[snap]
tolerance = 4.0
grid_size = 8.0
"#,
        )
        .unwrap();
        assert_eq!(config.history_depth, 20);
        assert_eq!(config.nudge_large, 10.0);
        assert_eq!(config.snap.tolerance, 4.0);
        assert_eq!(config.snap.grid_size, Some(8.0));
        assert!(config.snap.snap_to_objects);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EditorConfig::from_toml_str("history_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EditorConfig::from_toml_str("nudge = \"far\""),
            Err(ConfigError::Toml(_))
        ));
    }
}
