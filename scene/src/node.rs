use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

use crate::common::{EulerRotation, RotationOrder};

/// Generation-checked handle to a node in a [`Scene`](crate::Scene).
///
/// A handle stays valid until its node is removed. Reusing the slot bumps the
/// generation, so stale handles fail liveness checks instead of aliasing the
/// new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// What a node is, as far as transform editing cares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Plain transform with translate/rotate/scale channels.
    Transform,
    /// Skeleton joint: a transform with an extra joint orientation.
    Joint,
    /// Curve geometry with control points.
    Curve,
    /// Surface geometry with control points.
    Surface,
    /// Polygon mesh with vertex positions.
    Mesh,
    /// Locator shape with a local position and extent.
    Locator,
    /// Anything else, named by its host type.
    Other(String),
}

impl NodeKind {
    /// True for kinds that carry transform channels.
    pub fn is_transform(&self) -> bool {
        matches!(self, NodeKind::Transform | NodeKind::Joint)
    }

    pub fn is_joint(&self) -> bool {
        matches!(self, NodeKind::Joint)
    }

    pub fn name(&self) -> &str {
        match self {
            NodeKind::Transform => "transform",
            NodeKind::Joint => "joint",
            NodeKind::Curve => "curve",
            NodeKind::Surface => "surface",
            NodeKind::Mesh => "mesh",
            NodeKind::Locator => "locator",
            NodeKind::Other(name) => name,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        match name {
            "transform" => NodeKind::Transform,
            "joint" => NodeKind::Joint,
            "curve" => NodeKind::Curve,
            "surface" => NodeKind::Surface,
            "mesh" => NodeKind::Mesh,
            "locator" => NodeKind::Locator,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

bitflags! {
    /// A set of transform channels.
    ///
    /// Used both for a node's lock state and for per-call skip flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Channels: u16 {
        const TRANSLATE_X = 1 << 0;
        const TRANSLATE_Y = 1 << 1;
        const TRANSLATE_Z = 1 << 2;
        const ROTATE_X = 1 << 3;
        const ROTATE_Y = 1 << 4;
        const ROTATE_Z = 1 << 5;
        const SCALE_X = 1 << 6;
        const SCALE_Y = 1 << 7;
        const SCALE_Z = 1 << 8;

        const TRANSLATE = Self::TRANSLATE_X.bits() | Self::TRANSLATE_Y.bits() | Self::TRANSLATE_Z.bits();
        const ROTATE = Self::ROTATE_X.bits() | Self::ROTATE_Y.bits() | Self::ROTATE_Z.bits();
        const SCALE = Self::SCALE_X.bits() | Self::SCALE_Y.bits() | Self::SCALE_Z.bits();
    }
}

/// A single scalar transform channel. Rotation channels hold radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::TranslateX,
        Channel::TranslateY,
        Channel::TranslateZ,
        Channel::RotateX,
        Channel::RotateY,
        Channel::RotateZ,
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
    ];

    pub const TRANSLATE: [Channel; 3] = [Channel::TranslateX, Channel::TranslateY, Channel::TranslateZ];
    pub const ROTATE: [Channel; 3] = [Channel::RotateX, Channel::RotateY, Channel::RotateZ];
    pub const SCALE: [Channel; 3] = [Channel::ScaleX, Channel::ScaleY, Channel::ScaleZ];

    /// The mask bit for this channel.
    pub fn flag(self) -> Channels {
        match self {
            Channel::TranslateX => Channels::TRANSLATE_X,
            Channel::TranslateY => Channels::TRANSLATE_Y,
            Channel::TranslateZ => Channels::TRANSLATE_Z,
            Channel::RotateX => Channels::ROTATE_X,
            Channel::RotateY => Channels::ROTATE_Y,
            Channel::RotateZ => Channels::ROTATE_Z,
            Channel::ScaleX => Channels::SCALE_X,
            Channel::ScaleY => Channels::SCALE_Y,
            Channel::ScaleZ => Channels::SCALE_Z,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::TranslateX => "translateX",
            Channel::TranslateY => "translateY",
            Channel::TranslateZ => "translateZ",
            Channel::RotateX => "rotateX",
            Channel::RotateY => "rotateY",
            Channel::RotateZ => "rotateZ",
            Channel::ScaleX => "scaleX",
            Channel::ScaleY => "scaleY",
            Channel::ScaleZ => "scaleZ",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel '{}'", s))
    }
}

impl Channels {
    /// Expands the mask into its individual channels.
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL
            .into_iter()
            .filter(move |channel| self.contains(channel.flag()))
    }
}

/// Rotate and scale pivots of a transform, in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivots {
    pub rotate_pivot: Vector3<f64>,
    pub rotate_pivot_translate: Vector3<f64>,
    pub scale_pivot: Vector3<f64>,
    pub scale_pivot_translate: Vector3<f64>,
}

impl Default for Pivots {
    fn default() -> Self {
        let zero = Vector3::new(0.0, 0.0, 0.0);
        Self {
            rotate_pivot: zero,
            rotate_pivot_translate: zero,
            scale_pivot: zero,
            scale_pivot_translate: zero,
        }
    }
}

/// Display attributes of a locator shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locator {
    pub local_position: Vector3<f64>,
    pub local_scale: Vector3<f64>,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            local_position: Vector3::new(0.0, 0.0, 0.0),
            local_scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// A node in the scene graph.
///
/// Every node has a slot for each attribute, but only the ones that match its
/// kind are reachable through the host traits: channels on transforms and
/// joints, points on curves, surfaces and meshes, locator data on locators.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    name: String,
    kind: NodeKind,

    // Hierarchy
    parent: Option<NodeId>,
    children: Vec<NodeId>,

    // Transform channels
    translate: Vector3<f64>,
    rotate: Vector3<f64>,
    scale: Vector3<f64>,
    rotation_order: RotationOrder,
    joint_orient: Vector3<f64>,
    pivots: Pivots,
    offset_matrix: Matrix4<f64>,
    locked: Channels,

    // Shape data
    points: Vec<Point3<f64>>,
    needs_update: bool,
    locator: Locator,
}

impl Node {
    /// Creates a node with identity channels.
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
            translate: Vector3::new(0.0, 0.0, 0.0),
            rotate: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation_order: RotationOrder::Xyz,
            joint_orient: Vector3::new(0.0, 0.0, 0.0),
            pivots: Pivots::default(),
            offset_matrix: Matrix4::identity(),
            locked: Channels::empty(),
            points: Vec::new(),
            needs_update: false,
            locator: Locator::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    // Hierarchy management

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&id| id != child);
    }

    // Getters and setters for transform channels

    pub fn translate(&self) -> Vector3<f64> {
        self.translate
    }

    pub fn set_translate(&mut self, translate: Vector3<f64>) {
        self.translate = translate;
    }

    /// Rotate channel values in radians, interpreted with [`Self::rotation_order`].
    pub fn rotate(&self) -> Vector3<f64> {
        self.rotate
    }

    pub fn set_rotate(&mut self, rotate: Vector3<f64>) {
        self.rotate = rotate;
    }

    pub fn euler_rotation(&self) -> EulerRotation {
        EulerRotation::from_vector(self.rotate, self.rotation_order)
    }

    pub fn scale(&self) -> Vector3<f64> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<f64>) {
        self.scale = scale;
    }

    pub fn rotation_order(&self) -> RotationOrder {
        self.rotation_order
    }

    /// Changes how the rotate channels are interpreted without touching their
    /// values.
    pub fn set_rotation_order(&mut self, order: RotationOrder) {
        self.rotation_order = order;
    }

    pub fn joint_orient(&self) -> Vector3<f64> {
        self.joint_orient
    }

    pub fn set_joint_orient(&mut self, joint_orient: Vector3<f64>) {
        self.joint_orient = joint_orient;
    }

    pub fn pivots(&self) -> Pivots {
        self.pivots
    }

    pub fn set_pivots(&mut self, pivots: Pivots) {
        self.pivots = pivots;
    }

    pub fn offset_matrix(&self) -> Matrix4<f64> {
        self.offset_matrix
    }

    pub fn set_offset_matrix(&mut self, matrix: Matrix4<f64>) {
        self.offset_matrix = matrix;
    }

    /// Reads one channel.
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::TranslateX => self.translate.x,
            Channel::TranslateY => self.translate.y,
            Channel::TranslateZ => self.translate.z,
            Channel::RotateX => self.rotate.x,
            Channel::RotateY => self.rotate.y,
            Channel::RotateZ => self.rotate.z,
            Channel::ScaleX => self.scale.x,
            Channel::ScaleY => self.scale.y,
            Channel::ScaleZ => self.scale.z,
        }
    }

    /// Writes one channel, ignoring its lock state.
    pub fn set_channel(&mut self, channel: Channel, value: f64) {
        let slot = match channel {
            Channel::TranslateX => &mut self.translate.x,
            Channel::TranslateY => &mut self.translate.y,
            Channel::TranslateZ => &mut self.translate.z,
            Channel::RotateX => &mut self.rotate.x,
            Channel::RotateY => &mut self.rotate.y,
            Channel::RotateZ => &mut self.rotate.z,
            Channel::ScaleX => &mut self.scale.x,
            Channel::ScaleY => &mut self.scale.y,
            Channel::ScaleZ => &mut self.scale.z,
        };
        *slot = value;
    }

    // Locks

    pub fn locked(&self) -> Channels {
        self.locked
    }

    pub fn is_locked(&self, channel: Channel) -> bool {
        self.locked.contains(channel.flag())
    }

    pub fn set_locked(&mut self, channels: Channels, locked: bool) {
        self.locked.set(channels, locked);
    }

    // Shape data

    /// Control points of a curve or surface, or vertices of a mesh.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<Point3<f64>>) {
        self.points = points;
    }

    /// True once control points changed and the shape has not been re-evaluated.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn set_needs_update(&mut self, needs_update: bool) {
        self.needs_update = needs_update;
    }

    pub fn locator(&self) -> Locator {
        self.locator
    }

    pub fn set_locator(&mut self, locator: Locator) {
        self.locator = locator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Node Creation
    // ========================================================================

    #[test]
    fn test_node_new_has_identity_channels() {
        let node = Node::new(NodeId::new(0, 0), "root", NodeKind::Transform);

        assert_eq!(node.name(), "root");
        assert_eq!(node.translate(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(node.rotate(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(node.scale(), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(node.rotation_order(), RotationOrder::Xyz);
        assert_eq!(node.offset_matrix(), Matrix4::identity());
        assert!(node.locked().is_empty());
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
    }

    // ========================================================================
    // Channels
    // ========================================================================

    #[test]
    fn test_channel_read_write() {
        let mut node = Node::new(NodeId::new(0, 0), "a", NodeKind::Transform);

        for (i, channel) in Channel::ALL.into_iter().enumerate() {
            node.set_channel(channel, i as f64);
        }

        assert_eq!(node.translate(), Vector3::new(0.0, 1.0, 2.0));
        assert_eq!(node.rotate(), Vector3::new(3.0, 4.0, 5.0));
        assert_eq!(node.scale(), Vector3::new(6.0, 7.0, 8.0));
        assert_eq!(node.channel(Channel::RotateY), 4.0);
    }

    #[test]
    fn test_channel_masks() {
        assert_eq!(
            Channels::TRANSLATE.channels().collect::<Vec<_>>(),
            Channel::TRANSLATE.to_vec()
        );
        assert_eq!(Channels::all().channels().count(), 9);
        assert!(Channels::SCALE.contains(Channel::ScaleY.flag()));
        assert!(!Channels::ROTATE.contains(Channel::ScaleY.flag()));
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!("rotateZ".parse::<Channel>().unwrap(), Channel::RotateZ);
        assert_eq!("SCALEX".parse::<Channel>().unwrap(), Channel::ScaleX);
        assert!("shearXY".parse::<Channel>().is_err());
    }

    #[test]
    fn test_locks() {
        let mut node = Node::new(NodeId::new(0, 0), "a", NodeKind::Joint);

        node.set_locked(Channels::TRANSLATE_Y | Channels::ROTATE, true);
        assert!(node.is_locked(Channel::TranslateY));
        assert!(node.is_locked(Channel::RotateZ));
        assert!(!node.is_locked(Channel::TranslateX));

        node.set_locked(Channels::ROTATE_Z, false);
        assert!(!node.is_locked(Channel::RotateZ));
    }

    // ========================================================================
    // Kinds
    // ========================================================================

    #[test]
    fn test_node_kind_names() {
        for kind in [
            NodeKind::Transform,
            NodeKind::Joint,
            NodeKind::Curve,
            NodeKind::Surface,
            NodeKind::Mesh,
            NodeKind::Locator,
            NodeKind::Other("camera".to_string()),
        ] {
            assert_eq!(NodeKind::from(kind.name()), kind);
        }
        assert!(NodeKind::Joint.is_transform());
        assert!(!NodeKind::Mesh.is_transform());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(3, 2).to_string(), "#3v2");
    }
}
