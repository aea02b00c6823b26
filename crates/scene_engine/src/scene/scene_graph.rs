//! Hierarchical scene graph
//!
//! Nodes live in a slot-map arena. Ownership flows strictly from roots to
//! leaves through each node's child list; parent ids are lookup-only. A node
//! is in exactly one of three placements: a root, a child of one parent, or
//! detached. Detached subtrees keep their nodes alive but are neither
//! propagated nor drawn.
//!
//! World matrices are recomputed top-down by a propagation pass, either in
//! full or incrementally from dirty flags. Both strategies produce
//! bit-identical results because they evaluate the same product
//! `parent_world * local` for every recomputed node.

use super::light::{Light, LightItem};
use super::node::{NodeId, SceneNode};
use super::renderable::{DrawItem, Renderable};
use crate::foundation::math::{Mat4, Mat4Ext, Transform, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Attaching would make a node its own ancestor, or a cycle was found while traversing
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Intended (or traversed) parent
        parent: NodeId,
        /// Intended (or revisited) child
        child: NodeId,
    },

    /// The node is already placed in the hierarchy and must be detached first
    #[error("Node {0:?} already has a parent or is a root; detach it first")]
    DetachRequired(NodeId),

    /// The id does not refer to a live node
    #[error("Node {0:?} does not exist")]
    NodeNotFound(NodeId),
}

/// World-matrix propagation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Recompute every reachable node on each pass
    Full,
    /// Recompute only dirty nodes and their descendants
    #[default]
    Incremental,
}

/// Counters reported by a propagation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Nodes entered by the traversal
    pub visited: usize,
    /// Nodes whose world matrix was recomputed
    pub recomputed: usize,
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    node: NodeId,
    parent: Option<NodeId>,
    parent_world: Mat4,
    forced: bool,
}

/// Tree of scene nodes with world-transform propagation
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
    mode: PropagationMode,
    pass: u64,
}

impl SceneGraph {
    /// Create an empty graph using incremental propagation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with an explicit propagation strategy
    pub fn with_mode(mode: PropagationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Propagation strategy used by [`propagate`](Self::propagate)
    pub fn mode(&self) -> PropagationMode {
        self.mode
    }

    /// Change the propagation strategy
    pub fn set_mode(&mut self, mode: PropagationMode) {
        self.mode = mode;
    }

    // ---------------------------------------------------------------------
    // Node creation and destruction
    // ---------------------------------------------------------------------

    /// Create a detached node
    pub fn spawn(&mut self, transform: Transform) -> NodeId {
        self.nodes.insert(SceneNode::new(transform))
    }

    /// Create a node and attach it as a new root
    pub fn spawn_root(&mut self, transform: Transform) -> NodeId {
        let id = self.spawn(transform);
        self.nodes[id].is_root = true;
        self.roots.push(id);
        id
    }

    /// Create a node and attach it as the last child of `parent`
    pub fn spawn_child(&mut self, parent: NodeId, transform: Transform) -> Result<NodeId, SceneError> {
        self.require(parent)?;
        let id = self.spawn(transform);
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        self.mark_dirty(id);
        Ok(id)
    }

    /// Destroy a node together with its whole subtree
    ///
    /// Returns the number of nodes removed (zero for an unknown id).
    pub fn despawn(&mut self, id: NodeId) -> usize {
        if !self.nodes.contains_key(id) {
            return 0;
        }
        self.detach(id);

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        log::debug!("Despawned {:?} ({} nodes)", id, removed);
        removed
    }

    /// Destroy every node
    pub fn clear(&mut self) {
        log::debug!("Clearing scene graph ({} nodes)", self.nodes.len());
        self.nodes.clear();
        self.roots.clear();
    }

    // ---------------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------------

    /// Attach a detached node as a root
    pub fn add_root(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.require(id)?;
        if node.parent.is_some() || node.is_root {
            return Err(SceneError::DetachRequired(id));
        }
        self.nodes[id].is_root = true;
        self.roots.push(id);
        self.mark_dirty(id);
        Ok(())
    }

    /// Detach a root; returns `false` if `id` is not a root
    pub fn remove_root(&mut self, id: NodeId) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.is_root => node.is_root = false,
            _ => return false,
        }
        self.roots.retain(|&root| root != id);
        self.mark_dirty(id);
        true
    }

    /// Attach `child` as the last child of `parent`
    ///
    /// Fails without touching the graph if the link would create a cycle or
    /// if `child` is already placed somewhere.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.require(parent)?;
        let child_node = self.require(child)?;
        let already_placed = child_node.parent.is_some() || child_node.is_root;

        if parent == child || self.is_ancestor(child, parent) {
            log::warn!("Rejected attaching {:?} under {:?}: cycle", child, parent);
            return Err(SceneError::Cycle { parent, child });
        }
        if already_placed {
            return Err(SceneError::DetachRequired(child));
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.mark_dirty(child);
        log::trace!("Attached {:?} under {:?}", child, parent);
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// Returns `false` and leaves the graph untouched if `child` is not
    /// currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let is_child = self
            .nodes
            .get(child)
            .is_some_and(|node| node.parent == Some(parent));
        if !is_child {
            return false;
        }

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&id| id != child);
        }
        self.nodes[child].parent = None;
        self.mark_dirty(child);
        log::trace!("Detached {:?} from {:?}", child, parent);
        true
    }

    /// Detach a node from wherever it is placed; returns `false` if already detached
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.nodes.get(id).map(|node| (node.parent, node.is_root)) {
            Some((Some(parent), _)) => self.remove_child(parent, id),
            Some((None, true)) => self.remove_root(id),
            _ => false,
        }
    }

    // ---------------------------------------------------------------------
    // Node state
    // ---------------------------------------------------------------------

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Local transform of a node
    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.nodes.get(id).map(|node| &node.transform)
    }

    /// Mutable local transform of a node
    ///
    /// The node is marked dirty as soon as the borrow is handed out.
    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        self.mark_dirty(id);
        self.nodes.get_mut(id).map(|node| &mut node.transform)
    }

    /// Replace the local transform of a node
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.require(id)?;
        self.nodes[id].transform = transform;
        self.mark_dirty(id);
        Ok(())
    }

    /// Replace or clear (`None`) the renderable payload of a node
    pub fn set_renderable(&mut self, id: NodeId, renderable: Option<Renderable>) -> Result<(), SceneError> {
        self.require(id)?;
        self.nodes[id].renderable = renderable;
        Ok(())
    }

    /// Replace or clear (`None`) the light carried by a node
    pub fn set_light(&mut self, id: NodeId, light: Option<Light>) -> Result<(), SceneError> {
        self.require(id)?;
        self.nodes[id].light = light;
        Ok(())
    }

    /// Show or hide a subtree in the draw and light lists
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        self.require(id)?;
        self.nodes[id].visible = visible;
        Ok(())
    }

    /// Assign a debug name
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), SceneError> {
        self.require(id)?;
        self.nodes[id].name = Some(name.into());
        Ok(())
    }

    /// Find any live node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Roots in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Children of a node in insertion order (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Iterate the ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(id),
            budget: self.nodes.len(),
        }
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    /// World matrix as of the last propagation pass
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        self.nodes.get(id).map(|node| node.world)
    }

    /// World-space position as of the last propagation pass
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.nodes.get(id).map(|node| node.world.translation_part())
    }

    // ---------------------------------------------------------------------
    // Propagation
    // ---------------------------------------------------------------------

    /// Recompute world matrices with the configured strategy
    pub fn propagate(&mut self) -> Result<PropagationStats, SceneError> {
        match self.mode {
            PropagationMode::Full => self.propagate_full(),
            PropagationMode::Incremental => self.propagate_incremental(),
        }
    }

    /// Recompute the world matrix of every node reachable from a root
    pub fn propagate_full(&mut self) -> Result<PropagationStats, SceneError> {
        let pass = self.begin_pass();
        let mut stats = PropagationStats::default();
        let mut stack = self.root_visits();

        while let Some(visit) = stack.pop() {
            let node = self.enter(&visit, pass)?;
            node.world = visit.parent_world * node.transform.local_matrix();
            node.dirty = false;
            node.child_dirty = false;
            stats.visited += 1;
            stats.recomputed += 1;

            let world = node.world;
            stack.extend(node.children.iter().rev().map(|&child| Visit {
                node: child,
                parent: Some(visit.node),
                parent_world: world,
                forced: true,
            }));
        }

        log::trace!("Full propagation: {:?}", stats);
        Ok(stats)
    }

    /// Recompute only dirty nodes and everything below them
    ///
    /// Subtrees without any dirty node are skipped entirely.
    pub fn propagate_incremental(&mut self) -> Result<PropagationStats, SceneError> {
        let pass = self.begin_pass();
        let mut stats = PropagationStats::default();
        let mut stack = self.root_visits();

        while let Some(visit) = stack.pop() {
            let node = self.enter(&visit, pass)?;
            stats.visited += 1;

            let recompute = visit.forced || node.dirty;
            if recompute {
                node.world = visit.parent_world * node.transform.local_matrix();
                node.dirty = false;
                stats.recomputed += 1;
            }

            let descend = recompute || node.child_dirty;
            node.child_dirty = false;
            if descend {
                let world = node.world;
                stack.extend(node.children.iter().rev().map(|&child| Visit {
                    node: child,
                    parent: Some(visit.node),
                    parent_world: world,
                    forced: recompute,
                }));
            }
        }

        log::trace!("Incremental propagation: {:?}", stats);
        Ok(stats)
    }

    /// Lazily list `(world, renderable)` items in pre-order
    ///
    /// Only visible nodes with a payload are yielded; a hidden node hides its
    /// subtree. Each call starts a fresh traversal.
    ///
    /// The traversal visits at most [`len`](Self::len) nodes. On a graph
    /// corrupted into a cycle it logs an error and ends early rather than
    /// reporting it; [`propagate`](Self::propagate) is the pass that returns
    /// [`SceneError::Cycle`].
    pub fn flatten(&self) -> Flatten<'_> {
        Flatten {
            nodes: self.visible_nodes(),
        }
    }

    /// Lazily list `(world, light)` items in pre-order
    ///
    /// Follows the same visibility rules and cycle guard as
    /// [`flatten`](Self::flatten).
    pub fn lights(&self) -> Lights<'_> {
        Lights {
            nodes: self.visible_nodes(),
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn visible_nodes(&self) -> VisibleNodes<'_> {
        VisibleNodes {
            graph: self,
            stack: self.roots.iter().rev().copied().collect(),
            budget: self.nodes.len(),
        }
    }

    fn require(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Flag a node dirty and every ancestor as having a dirty descendant
    fn mark_dirty(&mut self, id: NodeId) {
        let mut current = match self.nodes.get_mut(id) {
            Some(node) => {
                node.dirty = true;
                node.parent
            }
            None => return,
        };

        let mut budget = self.nodes.len();
        while let Some(parent_id) = current {
            if budget == 0 {
                break;
            }
            budget -= 1;
            match self.nodes.get_mut(parent_id) {
                Some(parent) => {
                    parent.child_dirty = true;
                    current = parent.parent;
                }
                None => break,
            }
        }
    }

    fn begin_pass(&mut self) -> u64 {
        self.pass += 1;
        self.pass
    }

    fn root_visits(&self) -> Vec<Visit> {
        self.roots
            .iter()
            .rev()
            .map(|&root| Visit {
                node: root,
                parent: None,
                parent_world: Mat4::identity(),
                forced: false,
            })
            .collect()
    }

    fn enter(&mut self, visit: &Visit, pass: u64) -> Result<&mut SceneNode, SceneError> {
        let node = self
            .nodes
            .get_mut(visit.node)
            .ok_or(SceneError::NodeNotFound(visit.node))?;
        if node.visit_stamp == pass {
            log::error!("Node {:?} reached twice in one propagation pass", visit.node);
            return Err(SceneError::Cycle {
                parent: visit.parent.unwrap_or(visit.node),
                child: visit.node,
            });
        }
        node.visit_stamp = pass;
        Ok(node)
    }

    /// Link without any validation, used to corrupt graphs in tests
    #[cfg(test)]
    pub(crate) fn link_unchecked(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
    }
}

/// Iterator over the ancestors of a node
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
    budget: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        let current = self.next?;
        self.next = self.graph.parent(current);
        Some(current)
    }
}

/// Pre-order walk over visible nodes, bounded by the node count
#[derive(Debug, Clone)]
struct VisibleNodes<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
    budget: usize,
}

impl<'a> Iterator for VisibleNodes<'a> {
    type Item = (NodeId, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if self.budget == 0 {
                log::error!("Scene traversal exceeded node count; graph contains a cycle");
                self.stack.clear();
                return None;
            }
            self.budget -= 1;

            let Some(node) = self.graph.nodes.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            self.stack.extend(node.children.iter().rev().copied());
            return Some((id, node));
        }
        None
    }
}

/// Pre-order draw-list iterator returned by [`SceneGraph::flatten`]
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    nodes: VisibleNodes<'a>,
}

impl Iterator for Flatten<'_> {
    type Item = DrawItem;

    fn next(&mut self) -> Option<DrawItem> {
        self.nodes.find_map(|(node, data)| {
            data.renderable.map(|renderable| DrawItem {
                node,
                world: data.world,
                renderable,
            })
        })
    }
}

/// Pre-order light-list iterator returned by [`SceneGraph::lights`]
#[derive(Debug, Clone)]
pub struct Lights<'a> {
    nodes: VisibleNodes<'a>,
}

impl Iterator for Lights<'_> {
    type Item = LightItem;

    fn next(&mut self) -> Option<LightItem> {
        self.nodes.find_map(|(node, data)| {
            data.light.map(|light| LightItem {
                node,
                world: data.world,
                light,
            })
        })
    }
}
