//! # Scene Engine
//!
//! A small scene-graph and render-loop core for 3D scenes.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed node hierarchy with full and incremental world-matrix propagation
//! - **Camera**: Perspective projection with viewport resize handling
//! - **Render Loop**: Cooperative `update → propagate → render` frame driver with deterministic timing
//! - **Lights**: Light payloads placed by the same hierarchy as renderables
//! - **Pluggable Rendering**: Any [`Renderer`] sink; a headless recorder is included
//! - **Configuration**: TOML and RON settings files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Spinner {
//!     cube: Option<NodeId>,
//! }
//!
//! impl Application for Spinner {
//!     fn initialize(&mut self, scene: &mut SceneGraph, _camera: &mut Camera) -> Result<(), AppError> {
//!         let cube = scene.spawn_root(Transform::identity());
//!         scene.set_renderable(cube, Some(Renderable::new(MeshHandle(0), MaterialHandle(0))))?;
//!         self.cube = Some(cube);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), AppError> {
//!         let t = frame.elapsed_secs();
//!         if let Some(cube) = self.cube {
//!             if let Some(transform) = frame.scene.transform_mut(cube) {
//!                 transform.rotation = Quat::from_euler_angles(t, t, 0.0);
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut scene = SceneGraph::with_mode(config.scene.propagation);
//!     let mut camera = Camera::from_config(&config.camera, 1280, 720);
//!     let mut renderer = HeadlessRenderer::new();
//!     let mut app = Spinner { cube: None };
//!
//!     let mut render_loop = RenderLoop::new(&mut app, &mut scene, &mut camera, &mut renderer);
//!     render_loop.on_resize(1280, 720);
//!     render_loop.run(&mut PacedScheduler::new(Some(60), Some(120)))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod scene;
pub mod render;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{
    FrameContext, FrameStatus, HostScheduler, LoopError, LoopState, LoopStats, PacedScheduler, RenderLoop,
};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        FrameContext, FrameStatus, HostScheduler, LoopError, LoopState, PacedScheduler, RenderLoop,
        foundation::{
            math::{Vec3, Mat4, Quat, Transform},
            time::{FrameTime, Stopwatch},
        },
        scene::{SceneGraph, NodeId, Renderable, DrawItem, Light, LightItem, PropagationMode, SceneError},
        render::{Renderer, Camera, HeadlessRenderer, MeshHandle, MaterialHandle, RenderError},
        config::Config,
        core::config::{ApplicationConfig, EngineConfig, CameraConfig},
    };
}
