//! Rendering interfaces
//!
//! Camera projection and the renderer sink the render loop submits to.
//! Rasterization itself lives outside this crate.

pub mod camera;
pub mod headless;
pub mod renderer;

pub use camera::{Camera, CameraError};
pub use headless::{FrameRecord, HeadlessRenderer};
pub use renderer::{MaterialHandle, MeshHandle, RenderError, RenderResult, Renderer};
