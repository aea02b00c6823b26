//! Application trait and lifecycle management

use crate::engine::FrameContext;
use crate::render::Camera;
use crate::scene::{SceneError, SceneGraph};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to describe a scene and animate it. The render loop
/// owns the frame cadence; the application only builds the scene and mutates
/// it once per frame.
pub trait Application {
    /// Build the initial scene
    ///
    /// Called once by [`RenderLoop::start`](crate::engine::RenderLoop::start)
    /// before the first frame.
    fn initialize(&mut self, scene: &mut SceneGraph, camera: &mut Camera) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before propagation. Animations should be a pure
    /// function of `frame.time().elapsed` so that replays at different frame
    /// rates agree.
    fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called once when the loop transitions to stopped.
    fn cleanup(&mut self, _scene: &mut SceneGraph) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Scene graph error propagated to application level
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
