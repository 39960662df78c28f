//! Physics tuning constants
//!
//! One table per `PhysicsSystem`. Values are tuned for 60 Hz stepping:
//! every per-tick change is scaled by `dt * 60`, so a 60 Hz host applies
//! them exactly once per frame.
//!
//! Stored as RON, e.g.
//! ```text
//! (gravity: 0.5, max_fall_speed: 8.0, deceleration: 0.5)
//! ```
//! Missing fields fall back to the defaults.

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("{field} must be finite and non-negative, got {value}")]
    OutOfRange { field: &'static str, value: f32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward speed added per tick while airborne
    pub gravity: f32,
    /// Terminal downward speed
    pub max_fall_speed: f32,
    /// Friction coefficient while grounded
    pub ground_friction: f32,
    /// Friction coefficient while airborne
    pub air_friction: f32,
    /// Base horizontal slowdown per tick, scaled by the friction coefficient
    pub deceleration: f32,
    /// Downward speed a body needs before solid ground or a platform catches it
    pub landing_speed_threshold: f32,
    /// How far below a platform's top the body's bottom may already be and still land
    pub platform_tolerance: f32,
    /// Height of the ground probe strip below the collision box (px)
    pub ground_probe_depth: i32,
    /// Extra depth added to the fall distance when looking through penetrable tiles (px)
    pub lookahead_margin: i32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            max_fall_speed: 8.0,
            ground_friction: 0.6,
            air_friction: 0.7,
            deceleration: 0.5,
            landing_speed_threshold: 0.6,
            platform_tolerance: 3.0,
            ground_probe_depth: 2,
            lookahead_margin: 3,
        }
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::OutOfRange { field, value });
    }
    Ok(())
}

impl PhysicsConfig {
    /// Reject anything that could push NaN or sign flips into a step
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("gravity", self.gravity)?;
        non_negative("max_fall_speed", self.max_fall_speed)?;
        non_negative("ground_friction", self.ground_friction)?;
        non_negative("air_friction", self.air_friction)?;
        non_negative("deceleration", self.deceleration)?;
        non_negative("landing_speed_threshold", self.landing_speed_threshold)?;
        non_negative("platform_tolerance", self.platform_tolerance)?;
        if self.max_fall_speed <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "max_fall_speed",
                value: self.max_fall_speed,
            });
        }
        if self.ground_probe_depth <= 0 {
            return Err(ConfigError::NotPositive {
                field: "ground_probe_depth",
                value: self.ground_probe_depth as f32,
            });
        }
        if self.lookahead_margin < 0 {
            return Err(ConfigError::OutOfRange {
                field: "lookahead_margin",
                value: self.lookahead_margin as f32,
            });
        }
        Ok(())
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let config: PhysicsConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&contents)?;
        log::info!("loaded physics config from {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = PhysicsConfig::from_ron_str("(gravity: 0.25, max_fall_speed: 12.0)").unwrap();
        assert_eq!(config.gravity, 0.25);
        assert_eq!(config.max_fall_speed, 12.0);
        assert_eq!(config.ground_friction, PhysicsConfig::default().ground_friction);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let config = PhysicsConfig { gravity: -1.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "gravity", .. })
        ));

        let config = PhysicsConfig { deceleration: f32::NAN, ..Default::default() };
        assert!(config.validate().is_err());

        let config = PhysicsConfig { ground_probe_depth: 0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "ground_probe_depth", .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(air_friction: 0.9)").unwrap();

        let config = PhysicsConfig::load(file.path()).unwrap();
        assert_eq!(config.air_friction, 0.9);

        assert!(matches!(
            PhysicsConfig::from_ron_str("(gravity: \"heavy\")"),
            Err(ConfigError::Parse(_))
        ));
    }
}
