//! JSON scene file format.
//!
//! A scene file is a flat list of nodes. Parents are referenced by name and
//! must appear before their children. Rotation and joint orientation are
//! stored in degrees; everything in memory is radians.
//!
//! ```json
//! {
//!   "nodes": [
//!     { "name": "root", "translate": [1, 2, 3], "rotate": [0, 90, 0], "rotateOrder": "zxy" },
//!     { "name": "rootShape", "parent": "root", "kind": "mesh", "points": [[0, 0, 0]] }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::{is_identity, matrix_from_slice, matrix_to_array, RotationOrder, EPSILON};
use crate::node::{Channel, Channels, Locator, Node, NodeKind, Pivots};
use crate::{Scene, TransformError};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Duplicate node name: {0}")]
    DuplicateName(String),

    #[error("Node '{node}' references unknown parent '{parent}'")]
    UnknownParent { node: String, parent: String },

    #[error("Invalid value on node '{node}': {message}")]
    InvalidValue { node: String, message: String },

    #[error("Scene error: {0}")]
    Transform(#[from] TransformError),
}

// ============================================================================
// Serialized types
// ============================================================================

fn zero3() -> [f64; 3] {
    [0.0; 3]
}

fn one3() -> [f64; 3] {
    [1.0; 3]
}

fn is_zero3(value: &[f64; 3]) -> bool {
    *value == [0.0; 3]
}

fn is_one3(value: &[f64; 3]) -> bool {
    *value == [1.0; 3]
}

fn default_kind() -> String {
    NodeKind::Transform.name().to_string()
}

fn default_order() -> String {
    RotationOrder::Xyz.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub nodes: Vec<SerializedNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub translate: [f64; 3],
    /// Degrees.
    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub rotate: [f64; 3],
    #[serde(default = "one3", skip_serializing_if = "is_one3")]
    pub scale: [f64; 3],
    #[serde(default = "default_order")]
    pub rotate_order: String,
    /// Degrees, XYZ order.
    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub joint_orient: [f64; 3],

    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub rotate_pivot: [f64; 3],
    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub rotate_pivot_translate: [f64; 3],
    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub scale_pivot: [f64; 3],
    #[serde(default = "zero3", skip_serializing_if = "is_zero3")]
    pub scale_pivot_translate: [f64; 3],

    /// 16 row-major values, or 4 as a diagonal shorthand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_parent_matrix: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locked: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_position: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_scale: Option<[f64; 3]>,
}

fn degrees(radians: Vector3<f64>) -> [f64; 3] {
    [
        radians.x.to_degrees(),
        radians.y.to_degrees(),
        radians.z.to_degrees(),
    ]
}

fn radians(degrees: [f64; 3]) -> Vector3<f64> {
    Vector3::new(
        degrees[0].to_radians(),
        degrees[1].to_radians(),
        degrees[2].to_radians(),
    )
}

// ============================================================================
// Conversion: Scene -> Serialized
// ============================================================================

impl SerializedNode {
    pub fn from_node(node: &Node, scene: &Scene) -> Self {
        let pivots = node.pivots();
        let offset = node.offset_matrix();
        let is_locator = matches!(node.kind(), NodeKind::Locator);

        Self {
            name: node.name().to_string(),
            parent: node
                .parent()
                .and_then(|parent| scene.get_node(parent))
                .map(|parent| parent.name().to_string()),
            kind: node.kind().name().to_string(),
            translate: node.translate().into(),
            rotate: degrees(node.rotate()),
            scale: node.scale().into(),
            rotate_order: node.rotation_order().to_string(),
            joint_orient: degrees(node.joint_orient()),
            rotate_pivot: pivots.rotate_pivot.into(),
            rotate_pivot_translate: pivots.rotate_pivot_translate.into(),
            scale_pivot: pivots.scale_pivot.into(),
            scale_pivot_translate: pivots.scale_pivot_translate.into(),
            offset_parent_matrix: (!is_identity(&offset, EPSILON))
                .then(|| matrix_to_array(&offset).to_vec()),
            locked: node.locked().channels().map(|c| c.name().to_string()).collect(),
            points: node.points().iter().map(|p| [p.x, p.y, p.z]).collect(),
            local_position: is_locator.then(|| node.locator().local_position.into()),
            local_scale: is_locator.then(|| node.locator().local_scale.into()),
        }
    }

    fn invalid(&self, message: impl Into<String>) -> FormatError {
        FormatError::InvalidValue {
            node: self.name.clone(),
            message: message.into(),
        }
    }

    /// Copies the serialized attributes onto a freshly created node.
    fn apply_to(&self, node: &mut Node) -> Result<(), FormatError> {
        let order: RotationOrder = self
            .rotate_order
            .parse()
            .map_err(|e| self.invalid(format!("{}", e)))?;

        node.set_translate(self.translate.into());
        node.set_rotate(radians(self.rotate));
        node.set_scale(self.scale.into());
        node.set_rotation_order(order);
        node.set_joint_orient(radians(self.joint_orient));
        node.set_pivots(Pivots {
            rotate_pivot: self.rotate_pivot.into(),
            rotate_pivot_translate: self.rotate_pivot_translate.into(),
            scale_pivot: self.scale_pivot.into(),
            scale_pivot_translate: self.scale_pivot_translate.into(),
        });

        let offset = match &self.offset_parent_matrix {
            Some(values) => matrix_from_slice(values).map_err(|e| self.invalid(e.to_string()))?,
            None => Matrix4::identity(),
        };
        node.set_offset_matrix(offset);

        let mut locked = Channels::empty();
        for name in &self.locked {
            let channel: Channel = name.parse().map_err(|e: String| self.invalid(e))?;
            locked |= channel.flag();
        }
        node.set_locked(locked, true);

        node.set_points(
            self.points
                .iter()
                .map(|p| Point3::new(p[0], p[1], p[2]))
                .collect(),
        );

        let defaults = Locator::default();
        node.set_locator(Locator {
            local_position: self.local_position.map_or(defaults.local_position, Vector3::from),
            local_scale: self.local_scale.map_or(defaults.local_scale, Vector3::from),
        });

        Ok(())
    }
}

impl SceneFile {
    /// Serializes every node reachable from the scene roots, parents first.
    pub fn from_scene(scene: &Scene) -> Self {
        let mut nodes = Vec::with_capacity(scene.len());
        let mut stack: Vec<_> = scene.root_nodes().iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = scene.get_node(id) else {
                continue;
            };
            nodes.push(SerializedNode::from_node(node, scene));
            stack.extend(node.children().iter().rev().copied());
        }

        Self { nodes }
    }

    // ========================================================================
    // Conversion: Serialized -> Scene
    // ========================================================================

    pub fn into_scene(self) -> Result<Scene, FormatError> {
        let mut scene = Scene::new();
        let mut names = HashSet::new();

        for record in &self.nodes {
            if !names.insert(record.name.as_str()) {
                return Err(FormatError::DuplicateName(record.name.clone()));
            }

            let parent = match &record.parent {
                Some(parent) => Some(scene.find_node(parent).ok_or_else(|| {
                    FormatError::UnknownParent {
                        node: record.name.clone(),
                        parent: parent.clone(),
                    }
                })?),
                None => None,
            };

            let id = scene.add_node(parent, record.name.clone(), NodeKind::from(record.kind.as_str()))?;
            if let Some(node) = scene.get_node_mut(id) {
                record.apply_to(node)?;
            }
        }

        Ok(scene)
    }
}

impl Scene {
    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(&SceneFile::from_scene(self))?)
    }

    pub fn from_json(json: &str) -> Result<Scene, FormatError> {
        serde_json::from_str::<SceneFile>(json)?.into_scene()
    }

    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), FormatError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Scene, FormatError> {
        Scene::from_json(&std::fs::read_to_string(path)?)
    }
}
