//! # Core Engine Module
//!
//! Shared configuration types used by the render loop, the camera and the
//! scene graph.

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    CameraConfig,
    EngineConfig,
    SceneConfig,
};
pub use crate::config::{Config, ConfigError};
