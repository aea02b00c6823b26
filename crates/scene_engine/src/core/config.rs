//! # Application Configuration
//!
//! Settings for the render loop, the camera and the scene graph, grouped in
//! one serializable tree. Every section has defaults, so a configuration file
//! only needs the values it changes:
//!
//! ```toml
//! [engine]
//! target_fps = 30
//!
//! [camera]
//! position = [0.0, 0.0, 25.0]
//!
//! [scene]
//! propagation = "full"
//! ```

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::scene::PropagationMode;

/// # Engine Configuration
///
/// Loop pacing, logging and the initial viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Target frame rate for the paced scheduler; `None` runs unpaced
    pub target_fps: Option<u32>,
    /// Stop after this many frames; `None` runs until stopped
    pub max_frames: Option<u64>,
    /// Initial viewport width in pixels
    pub viewport_width: u32,
    /// Initial viewport height in pixels
    pub viewport_height: u32,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            target_fps: Some(60),
            max_frames: None,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: Option<u32>) -> Self {
        self.target_fps = fps;
        self
    }

    /// Limit the number of frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Set the initial viewport
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("Unknown log level '{}'", self.log_level)));
        }
        if self.target_fps == Some(0) {
            return Err(ConfigError::Invalid("Target FPS must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Camera Configuration
///
/// Initial perspective camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping distance
    pub near: f32,
    /// Far clipping distance
    pub far: f32,
    /// Initial position in world space
    pub position: [f32; 3],
}

impl CameraConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "Field of view must be between 0 and 180 degrees, got {}",
                self.fov_degrees
            )));
        }
        if self.near <= 0.0 || self.far <= self.near {
            return Err(ConfigError::Invalid(format!(
                "Clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.0, 25.0],
        }
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// World-matrix propagation strategy
    pub propagation: PropagationMode,
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Camera configuration
    pub camera: CameraConfig,
    /// Scene graph configuration
    pub scene: SceneConfig,
}

impl Config for ApplicationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.camera.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scene_engine_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        assert!(Config::validate(&config).is_ok());
        assert_eq!(config.scene.propagation, PropagationMode::Incremental);
        assert_eq!(config.camera.position, [0.0, 0.0, 25.0]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            [engine]
            target_fps = 30

            [scene]
            propagation = "full"
        "#;
        let config: ApplicationConfig = toml::from_str(text).unwrap();

        assert_eq!(config.engine.target_fps, Some(30));
        assert_eq!(config.engine.log_level, "info");
        assert_eq!(config.scene.propagation, PropagationMode::Full);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = ApplicationConfig::default();
        config.camera.near = 0.0;
        assert!(matches!(Config::validate(&config), Err(ConfigError::Invalid(_))));

        let mut config = ApplicationConfig::default();
        config.engine.target_fps = Some(0);
        assert!(matches!(Config::validate(&config), Err(ConfigError::Invalid(_))));

        let mut config = ApplicationConfig::default();
        config.engine = config.engine.with_log_level("loud");
        assert!(matches!(Config::validate(&config), Err(ConfigError::Invalid(_))));

        config.engine = config.engine.with_log_level("debug");
        assert!(Config::validate(&config).is_ok());
    }

    #[test]
    fn test_save_and_load_toml_and_ron() {
        let mut config = ApplicationConfig::default();
        config.engine = config.engine.with_max_frames(120).with_viewport(640, 480);
        config.scene.propagation = PropagationMode::Full;

        for extension in ["toml", "ron"] {
            let path = temp_path(&format!("config.{}", extension));
            config.save_to_file(&path).unwrap();
            let loaded = ApplicationConfig::load_from_file(&path).unwrap();
            std::fs::remove_file(&path).ok();

            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = ApplicationConfig::default().save_to_file(temp_path("config.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ApplicationConfig::load_or_default(temp_path("missing.toml")).unwrap();
        assert_eq!(config, ApplicationConfig::default());
    }
}
