//! Scene graph
//!
//! Hierarchy of spatial nodes with local/world transform propagation and
//! draw-list generation.
//!
//! ## Per-frame flow
//!
//! ```text
//! update(elapsed)          mutates local transforms
//!      ↓
//! SceneGraph::propagate    world = parent_world * local, parent before child
//!      ↓
//! SceneGraph::flatten      pre-order (world, renderable) pairs
//! SceneGraph::lights       pre-order (world, light) pairs
//!      ↓
//! Renderer
//! ```

mod light;
mod node;
mod renderable;
mod scene_graph;

pub use light::{Light, LightItem, LightType};
pub use node::{NodeId, SceneNode};
pub use renderable::{DrawItem, Renderable};
pub use scene_graph::{Ancestors, Flatten, Lights, PropagationMode, PropagationStats, SceneError, SceneGraph};
