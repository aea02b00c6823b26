//! Scene node stored in the scene graph arena

use super::light::Light;
use super::renderable::Renderable;
use crate::foundation::math::{Mat4, Transform};

slotmap::new_key_type! {
    /// Stable identifier of a node in a [`SceneGraph`](super::SceneGraph)
    pub struct NodeId;
}

/// A single node of the scene hierarchy
///
/// Nodes never own each other directly. The graph arena owns every node;
/// `children` lists the ids this node owns logically, and `parent` is a
/// lookup-only back reference.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) name: Option<String>,
    pub(crate) transform: Transform,
    pub(crate) world: Mat4,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) renderable: Option<Renderable>,
    pub(crate) light: Option<Light>,
    pub(crate) visible: bool,
    pub(crate) is_root: bool,

    /// Local transform or placement changed since the last propagation
    pub(crate) dirty: bool,
    /// Some descendant is dirty
    pub(crate) child_dirty: bool,
    /// Last propagation pass that visited this node
    pub(crate) visit_stamp: u64,
}

impl SceneNode {
    pub(crate) fn new(transform: Transform) -> Self {
        Self {
            name: None,
            transform,
            world: Mat4::identity(),
            parent: None,
            children: Vec::new(),
            renderable: None,
            light: None,
            visible: true,
            is_root: false,
            dirty: true,
            child_dirty: false,
            visit_stamp: 0,
        }
    }

    /// Debug name, if one was assigned
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World matrix as of the last propagation pass
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Parent node, if attached under one
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Renderable payload
    pub fn renderable(&self) -> Option<Renderable> {
        self.renderable
    }

    /// Light payload
    pub fn light(&self) -> Option<Light> {
        self.light
    }

    /// Whether this subtree is submitted for drawing
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether this node is one of the graph roots
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Whether this node is neither a root nor a child
    pub fn is_detached(&self) -> bool {
        !self.is_root && self.parent.is_none()
    }

    /// Whether the world matrix is waiting for a propagation pass
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
