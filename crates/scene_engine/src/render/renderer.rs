//! Renderer abstraction for the render loop
//!
//! The rasterizer is an external collaborator. The core only hands it a
//! world-space draw list, the world-space lights and a view-projection
//! matrix once per frame.

use crate::foundation::math::Mat4;
use crate::scene::{DrawItem, LightItem};
use thiserror::Error;

/// Handle to a mesh resource owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u64);

/// Handle to a material resource owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u64);

/// Errors reported by a renderer
#[derive(Error, Debug)]
pub enum RenderError {
    /// The backend failed to produce the frame
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering sink driven by the render loop
///
/// `render_frame` is called exactly once per frame with a read-only snapshot.
/// Implementations must not expect the slice to outlive the call.
pub trait Renderer {
    /// Configure the output viewport size in pixels
    fn configure_viewport(&mut self, width: u32, height: u32);

    /// Draw one frame
    fn render_frame(&mut self, draw_list: &[DrawItem], lights: &[LightItem], view_projection: &Mat4) -> RenderResult<()>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn configure_viewport(&mut self, width: u32, height: u32) {
        (**self).configure_viewport(width, height);
    }

    fn render_frame(&mut self, draw_list: &[DrawItem], lights: &[LightItem], view_projection: &Mat4) -> RenderResult<()> {
        (**self).render_frame(draw_list, lights, view_projection)
    }
}
