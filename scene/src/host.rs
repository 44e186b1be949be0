//! Capabilities the transform operations need from a scene graph.
//!
//! The operations in this crate never touch [`Scene`] directly. They go
//! through three narrow traits so that any host able to resolve nodes, read
//! and write channels, and edit shape points can drive them.

use cgmath::{Point3, Vector3};

use crate::common::{matrix_from_slice, matrix_to_array, RotationOrder};
use crate::node::{Channel, Locator, Node, NodeId, NodeKind, Pivots};
use crate::{Scene, TransformError};

/// Node identity, liveness and hierarchy.
pub trait GraphAccess {
    /// Looks up a node by name.
    fn resolve(&self, name: &str) -> Option<NodeId>;

    /// True while the node exists. Must be checked before each use of a
    /// handle that may have been held across edits.
    fn is_alive(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, TransformError>;

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, TransformError>;

    fn kind(&self, node: NodeId) -> Result<NodeKind, TransformError>;
}

/// Transform channel storage.
///
/// Channel reads and writes fail with [`TransformError::NotATransform`] on
/// nodes without transform channels. Writes here ignore locks; honouring
/// them is the caller's job.
pub trait ChannelAccess: GraphAccess {
    fn channel(&self, node: NodeId, channel: Channel) -> Result<f64, TransformError>;

    fn set_channel(
        &mut self,
        node: NodeId,
        channel: Channel,
        value: f64,
    ) -> Result<(), TransformError>;

    fn is_locked(&self, node: NodeId, channel: Channel) -> Result<bool, TransformError>;

    fn rotation_order(&self, node: NodeId) -> Result<RotationOrder, TransformError>;

    /// Joint orientation as XYZ euler angles in radians. Zero for anything
    /// that is not a joint.
    fn joint_orient(&self, node: NodeId) -> Result<Vector3<f64>, TransformError>;

    /// Writes the joint orientation. Does nothing on non-joints.
    fn set_joint_orient(
        &mut self,
        node: NodeId,
        joint_orient: Vector3<f64>,
    ) -> Result<(), TransformError>;

    fn pivots(&self, node: NodeId) -> Result<Pivots, TransformError>;

    fn set_pivots(&mut self, node: NodeId, pivots: Pivots) -> Result<(), TransformError>;

    /// The persisted offset matrix in the 16-double interchange form.
    fn offset_matrix(&self, node: NodeId) -> Result<[f64; 16], TransformError>;

    fn set_offset_matrix(&mut self, node: NodeId, values: &[f64]) -> Result<(), TransformError>;
}

/// Shape point storage.
///
/// Point access works on curves, surfaces and meshes; locator access works on
/// locators. Anything else fails with
/// [`TransformError::UnsupportedGeometryKind`].
pub trait GeometryAccess: GraphAccess {
    fn points(&self, node: NodeId) -> Result<Vec<Point3<f64>>, TransformError>;

    fn set_points(&mut self, node: NodeId, points: &[Point3<f64>]) -> Result<(), TransformError>;

    fn locator(&self, node: NodeId) -> Result<Locator, TransformError>;

    fn set_locator(&mut self, node: NodeId, locator: Locator) -> Result<(), TransformError>;

    /// Flags a curve or surface for re-evaluation after its points moved.
    fn mark_geometry_dirty(&mut self, node: NodeId) -> Result<(), TransformError>;
}

/// Everything the freeze and pose operations need.
pub trait SceneHost: ChannelAccess + GeometryAccess {}

impl<T: ChannelAccess + GeometryAccess + ?Sized> SceneHost for T {}

// ============================================================================
// In-memory implementation
// ============================================================================

impl Scene {
    fn live(&self, id: NodeId) -> Result<&Node, TransformError> {
        self.get_node(id).ok_or(TransformError::InvalidHandle(id))
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut Node, TransformError> {
        self.get_node_mut(id).ok_or(TransformError::InvalidHandle(id))
    }

    fn transform(&self, id: NodeId) -> Result<&Node, TransformError> {
        let node = self.live(id)?;
        if node.kind().is_transform() {
            Ok(node)
        } else {
            Err(TransformError::NotATransform(id))
        }
    }

    fn transform_mut(&mut self, id: NodeId) -> Result<&mut Node, TransformError> {
        let node = self.live_mut(id)?;
        if node.kind().is_transform() {
            Ok(node)
        } else {
            Err(TransformError::NotATransform(id))
        }
    }

    fn shape(&self, id: NodeId, pointed: bool) -> Result<&Node, TransformError> {
        let node = self.live(id)?;
        if has_points(node.kind()) == pointed && is_shape_kind(node.kind()) {
            Ok(node)
        } else {
            Err(unsupported(node))
        }
    }

    fn shape_mut(&mut self, id: NodeId, pointed: bool) -> Result<&mut Node, TransformError> {
        let node = self.live_mut(id)?;
        if has_points(node.kind()) == pointed && is_shape_kind(node.kind()) {
            Ok(node)
        } else {
            Err(unsupported(node))
        }
    }
}

fn has_points(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Curve | NodeKind::Surface | NodeKind::Mesh)
}

fn is_shape_kind(kind: &NodeKind) -> bool {
    has_points(kind) || matches!(kind, NodeKind::Locator)
}

fn unsupported(node: &Node) -> TransformError {
    TransformError::UnsupportedGeometryKind {
        node: node.id,
        kind: node.kind().clone(),
    }
}

impl GraphAccess for Scene {
    fn resolve(&self, name: &str) -> Option<NodeId> {
        self.find_node(name)
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.contains(node)
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, TransformError> {
        Ok(self.live(node)?.parent())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, TransformError> {
        Ok(self.live(node)?.children().to_vec())
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, TransformError> {
        Ok(self.live(node)?.kind().clone())
    }
}

impl ChannelAccess for Scene {
    fn channel(&self, node: NodeId, channel: Channel) -> Result<f64, TransformError> {
        Ok(self.transform(node)?.channel(channel))
    }

    fn set_channel(
        &mut self,
        node: NodeId,
        channel: Channel,
        value: f64,
    ) -> Result<(), TransformError> {
        self.transform_mut(node)?.set_channel(channel, value);
        Ok(())
    }

    fn is_locked(&self, node: NodeId, channel: Channel) -> Result<bool, TransformError> {
        Ok(self.transform(node)?.is_locked(channel))
    }

    fn rotation_order(&self, node: NodeId) -> Result<RotationOrder, TransformError> {
        Ok(self.transform(node)?.rotation_order())
    }

    fn joint_orient(&self, node: NodeId) -> Result<Vector3<f64>, TransformError> {
        let node = self.transform(node)?;
        if node.kind().is_joint() {
            Ok(node.joint_orient())
        } else {
            Ok(Vector3::new(0.0, 0.0, 0.0))
        }
    }

    fn set_joint_orient(
        &mut self,
        node: NodeId,
        joint_orient: Vector3<f64>,
    ) -> Result<(), TransformError> {
        let node = self.transform_mut(node)?;
        if node.kind().is_joint() {
            node.set_joint_orient(joint_orient);
        }
        Ok(())
    }

    fn pivots(&self, node: NodeId) -> Result<Pivots, TransformError> {
        Ok(self.transform(node)?.pivots())
    }

    fn set_pivots(&mut self, node: NodeId, pivots: Pivots) -> Result<(), TransformError> {
        self.transform_mut(node)?.set_pivots(pivots);
        Ok(())
    }

    fn offset_matrix(&self, node: NodeId) -> Result<[f64; 16], TransformError> {
        Ok(matrix_to_array(&self.transform(node)?.offset_matrix()))
    }

    fn set_offset_matrix(&mut self, node: NodeId, values: &[f64]) -> Result<(), TransformError> {
        if values.len() != 16 {
            return Err(TransformError::Argument(format!(
                "offset matrix expects 16 values ({} given)",
                values.len()
            )));
        }
        let matrix = matrix_from_slice(values)?;
        self.transform_mut(node)?.set_offset_matrix(matrix);
        Ok(())
    }
}

impl GeometryAccess for Scene {
    fn points(&self, node: NodeId) -> Result<Vec<Point3<f64>>, TransformError> {
        Ok(self.shape(node, true)?.points().to_vec())
    }

    fn set_points(&mut self, node: NodeId, points: &[Point3<f64>]) -> Result<(), TransformError> {
        self.shape_mut(node, true)?.set_points(points.to_vec());
        Ok(())
    }

    fn locator(&self, node: NodeId) -> Result<Locator, TransformError> {
        Ok(self.shape(node, false)?.locator())
    }

    fn set_locator(&mut self, node: NodeId, locator: Locator) -> Result<(), TransformError> {
        self.shape_mut(node, false)?.set_locator(locator);
        Ok(())
    }

    fn mark_geometry_dirty(&mut self, node: NodeId) -> Result<(), TransformError> {
        let node = self.shape_mut(node, true)?;
        if matches!(node.kind(), NodeKind::Curve | NodeKind::Surface) {
            node.set_needs_update(true);
        }
        Ok(())
    }
}
