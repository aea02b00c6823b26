//! Tutorial scenes for the scene engine
//!
//! Shared pieces of the tutorial binaries: a camera orbit controller, the
//! key light every scene uses, and a headless launcher that loads configuration and drives the render loop.

pub mod launcher;
pub mod lighting;
pub mod orbit_controller;

pub use launcher::{launch, LaunchError, CONFIG_ENV_VAR};
pub use lighting::spawn_key_light;
pub use orbit_controller::OrbitController;
