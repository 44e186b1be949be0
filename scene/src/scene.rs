use log::debug;

use crate::node::{Node, NodeId, NodeKind};
use crate::TransformError;

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// In-memory scene graph.
///
/// Nodes live in an arena of generation-checked slots. Removing a node frees
/// its slot and bumps the generation, so any [`NodeId`] still pointing at it
/// resolves to nothing.
///
/// # Example
/// ```
/// use xform_scene::{NodeKind, Scene};
///
/// let mut scene = Scene::new();
/// let root = scene.add_transform(None, "root").unwrap();
/// let shape = scene.add_shape(Some(root), "rootShape", NodeKind::Mesh).unwrap();
/// assert_eq!(scene.get_node(root).unwrap().children(), &[shape]);
/// ```
#[derive(Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root_nodes: Vec<NodeId>,
    len: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Gets a reference to a node, or `None` if the handle is stale.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    /// Gets a mutable reference to a node, or `None` if the handle is stale.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Finds the first live node with the given name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|node| node.name() == name).map(|node| node.id)
    }

    /// Iterates over live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(|slot| slot.node.as_ref())
    }

    /// Adds a new node to the scene tree.
    ///
    /// # Arguments
    /// * `parent` - Optional parent node. If `Some`, the parent must be live.
    /// * `name` - Name of the node.
    /// * `kind` - Node kind.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidHandle`] if the parent doesn't exist.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, TransformError> {
        if let Some(parent_id) = parent {
            if !self.contains(parent_id) {
                return Err(TransformError::InvalidHandle(parent_id));
            }
        }

        let id = match self.free.pop() {
            Some(index) => NodeId::new(index, self.slots[index as usize].generation),
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                NodeId::new((self.slots.len() - 1) as u32, 0)
            }
        };

        let mut node = Node::new(id, name, kind);
        node.set_parent(parent);

        match parent.and_then(|parent_id| self.get_node_mut(parent_id)) {
            Some(parent_node) => parent_node.add_child(id),
            None => self.root_nodes.push(id),
        }

        self.slots[id.index() as usize].node = Some(node);
        self.len += 1;
        Ok(id)
    }

    /// Adds a plain transform node.
    pub fn add_transform(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
    ) -> Result<NodeId, TransformError> {
        self.add_node(parent, name, NodeKind::Transform)
    }

    /// Adds a skeleton joint.
    pub fn add_joint(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
    ) -> Result<NodeId, TransformError> {
        self.add_node(parent, name, NodeKind::Joint)
    }

    /// Adds a shape node (anything without transform channels).
    ///
    /// # Errors
    /// Returns [`TransformError::Argument`] if `kind` is a transform kind.
    pub fn add_shape(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, TransformError> {
        if kind.is_transform() {
            return Err(TransformError::Argument(format!(
                "'{}' is a transform kind, not a shape",
                kind
            )));
        }
        self.add_node(parent, name, kind)
    }

    /// Removes a node and all its descendants.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidHandle`] if the node doesn't exist.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<(), TransformError> {
        let parent = match self.get_node(node_id) {
            Some(node) => node.parent(),
            None => return Err(TransformError::InvalidHandle(node_id)),
        };

        match parent.and_then(|parent_id| self.get_node_mut(parent_id)) {
            Some(parent_node) => parent_node.remove_child(node_id),
            None => self.root_nodes.retain(|&id| id != node_id),
        }

        self.remove_node_recursive(node_id);
        Ok(())
    }

    fn remove_node_recursive(&mut self, node_id: NodeId) {
        let Some(node) = self.get_node(node_id) else {
            return;
        };
        let children = node.children().to_vec();

        for child_id in children {
            self.remove_node_recursive(child_id);
        }

        let slot = &mut self.slots[node_id.index() as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node_id.index());
        self.len -= 1;

        debug!("Removed node {}", node_id);
    }
}
