//! Renderable payloads and draw items
//!
//! A renderable is an opaque pair of renderer handles. The scene graph never
//! looks inside it; it only carries it through to the draw list.

use super::node::NodeId;
use crate::foundation::math::Mat4;
use crate::render::{MaterialHandle, MeshHandle};

/// Mesh and material association of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Renderable {
    /// Geometry to draw
    pub mesh: MeshHandle,

    /// Material to draw it with
    pub material: MaterialHandle,
}

impl Renderable {
    /// Create a new renderable payload
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self { mesh, material }
    }
}

/// One entry of a flattened draw list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Node the item was produced from
    pub node: NodeId,

    /// World-space matrix of the node
    pub world: Mat4,

    /// Payload to draw
    pub renderable: Renderable,
}
