//! # Unified Configuration System
//!
//! All tunables of the scene engine in one serializable structure. Every
//! field has a default, so a config file only needs to name what it changes.
//!
//! ## Configuration Categories
//!
//! - **Simulation**: physics stepping, gravity, spawn safety, delta clamping
//! - **Dispatch**: throttle for entity updates sent to the external store
//! - **Surface**: logical size and device pixel density of the backing surface
//! - **Render**: frame interval used for staggered composition, clear color
//! - **Logging**: default log filter

use serde::{Serialize, Deserialize};
use std::time::Duration;

use crate::foundation::math::{Color, Vec2};

// Re-export from the config module for convenience
pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Simulation Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step the physics world every tick
    pub physics_enabled: bool,
    /// World gravity in units per second squared
    pub gravity: Vec2,
    /// Bodies never spawn below this Y coordinate
    pub min_spawn_y: f32,
    /// Measured frame deltas are clamped to this many seconds
    pub max_delta_seconds: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics_enabled: true,
            gravity: Vec2::new(0.0, -9.81),
            min_spawn_y: 0.0,
            max_delta_seconds: 0.1,
        }
    }
}

/// # Dispatch Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minimum milliseconds between two dispatches to the state store
    pub interval_ms: u64,
}

impl DispatchConfig {
    /// Interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { interval_ms: 16 }
    }
}

/// # Surface Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Logical width in CSS-style pixels
    pub logical_width: u32,
    /// Logical height in CSS-style pixels
    pub logical_height: u32,
    /// Physical pixels per logical pixel
    pub device_pixel_ratio: f32,
}

impl SurfaceConfig {
    /// Backing surface size in physical pixels
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| {
            let scaled = (v as f32 * self.device_pixel_ratio).round();
            if scaled <= 0.0 {
                1
            } else {
                // Saturating float to int cast
                scaled as u32
            }
        };
        (scale(self.logical_width), scale(self.logical_height))
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            logical_width: 1280,
            logical_height: 720,
            device_pixel_ratio: 1.0,
        }
    }
}

/// # Render Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// One frame interval in milliseconds, the Sequential stagger step
    pub frame_interval_ms: f32,
    /// Clear color for every frame
    pub clear_color: Color,
}

impl RenderConfig {
    /// Frame interval as a duration
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(self.frame_interval_ms.max(0.0) / 1000.0)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16.0,
            clear_color: Color::TRANSPARENT,
        }
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter, e.g. `info` or `scene_engine=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Physics and timing
    pub simulation: SimulationConfig,
    /// External state dispatch throttle
    pub dispatch: DispatchConfig,
    /// Backing surface
    pub surface: SurfaceConfig,
    /// Rendering
    pub render: RenderConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.surface.device_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid(
                "device_pixel_ratio must be positive".to_string(),
            ));
        }
        if self.surface.logical_width == 0 || self.surface.logical_height == 0 {
            return Err(ConfigError::Invalid("surface size cannot be zero".to_string()));
        }
        if !(self.render.frame_interval_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be positive".to_string(),
            ));
        }
        if !(self.simulation.max_delta_seconds > 0.0) {
            return Err(ConfigError::Invalid(
                "max_delta_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [simulation]
            physics_enabled = false

            [surface]
            device_pixel_ratio = 2.0
        "#;
        let config = EngineConfig::parse(text, ConfigFormat::Toml).unwrap();
        assert!(!config.simulation.physics_enabled);
        assert_eq!(config.dispatch.interval_ms, 16);
        assert_eq!(config.surface.physical_size(), (2560, 1440));
    }

    #[test]
    fn test_partial_ron() {
        let text = "(dispatch: (interval_ms: 33), logging: (level: \"debug\"))";
        let config = EngineConfig::parse(text, ConfigFormat::Ron).unwrap();
        assert_eq!(config.dispatch.interval_ms, 33);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = EngineConfig::load_from_file("engine.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_pixel_ratio() {
        let mut config = EngineConfig::default();
        config.surface.device_pixel_ratio = 0.0;
        assert!(config.validate().is_err());
    }
}
