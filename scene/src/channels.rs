//! Channel-level reads and writes on transform nodes.
//!
//! Every write honours the node's lock state: a locked channel is left as it
//! is, silently. Writes that take a `skip` mask leave the masked channels
//! alone too.

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector3};
use log::debug;

use crate::common::{
    compose_rotation, compose_scale, compose_translation, decompose_matrix, matrix_from_slice,
    matrix_to_array, row_mul, transform_point, EulerRotation, RotationOrder, TransformComponents,
};
use crate::host::ChannelAccess;
use crate::node::{Channel, Channels, NodeId, Pivots};
use crate::TransformError;

/// Coordinate frame for translation reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    /// Relative to the parent, offset matrix included.
    #[default]
    Object,
    /// Relative to the scene root.
    World,
}

/// Inverts `matrix`, naming `node` in the error if it is singular.
pub(crate) fn invert(matrix: &Matrix4<f64>, node: NodeId) -> Result<Matrix4<f64>, TransformError> {
    matrix.invert().ok_or(TransformError::SingularMatrix(node))
}

/// Fails unless `node` carries transform channels. Returns whether it is a
/// joint.
pub(crate) fn require_transform<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<bool, TransformError> {
    let kind = host.kind(node)?;
    if kind.is_transform() {
        Ok(kind.is_joint())
    } else {
        Err(TransformError::NotATransform(node))
    }
}

fn read_channels<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
    channels: [Channel; 3],
) -> Result<Vector3<f64>, TransformError> {
    Ok(Vector3::new(
        host.channel(node, channels[0])?,
        host.channel(node, channels[1])?,
        host.channel(node, channels[2])?,
    ))
}

fn write_channels<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
    channels: [Channel; 3],
    value: Vector3<f64>,
    skip: Channels,
) -> Result<(), TransformError> {
    for (axis, channel) in channels.into_iter().enumerate() {
        if skip.contains(channel.flag()) {
            continue;
        }
        if host.is_locked(node, channel)? {
            debug!("{}.{} is locked, skipping", node, channel);
            continue;
        }
        host.set_channel(node, channel, value[axis])?;
    }
    Ok(())
}

// ============================================================================
// Translate
// ============================================================================

/// Reads the translation of `node`.
///
/// In world space this is the position row of the world matrix.
pub fn translation<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
    space: Space,
) -> Result<Vector3<f64>, TransformError> {
    match space {
        Space::Object => read_channels(host, node, Channel::TRANSLATE),
        Space::World => Ok(world_matrix(host, node)?.w.truncate()),
    }
}

/// Writes the translate channels of `node`.
///
/// A world-space value is first carried into the parent frame through the
/// inverse parent matrix.
pub fn set_translation<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
    translation: Vector3<f64>,
    space: Space,
    skip: Channels,
) -> Result<(), TransformError> {
    require_transform(host, node)?;

    let local = match space {
        Space::Object => translation,
        Space::World => {
            let inverse = invert(&parent_matrix(host, node)?, node)?;
            transform_point(Point3::from_vec(translation), &inverse).to_vec()
        }
    };

    write_channels(host, node, Channel::TRANSLATE, local, skip)
}

pub fn reset_translation<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
) -> Result<(), TransformError> {
    set_translation(host, node, Vector3::new(0.0, 0.0, 0.0), Space::Object, Channels::empty())
}

// ============================================================================
// Rotate
// ============================================================================

/// Reads the rotate channels in the node's own rotation order.
pub fn rotation<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<EulerRotation, TransformError> {
    let angles = read_channels(host, node, Channel::ROTATE)?;
    Ok(EulerRotation::from_vector(angles, host.rotation_order(node)?))
}

/// Writes the rotate channels, re-expressing `rotation` in the node's
/// rotation order first if needed.
pub fn set_rotation<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
    rotation: &EulerRotation,
    skip: Channels,
) -> Result<(), TransformError> {
    let order = host.rotation_order(node)?;
    let rotation = rotation.reorder(order);
    write_channels(host, node, Channel::ROTATE, rotation.to_vector(), skip)
}

pub fn reset_rotation<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
) -> Result<(), TransformError> {
    let order = host.rotation_order(node)?;
    set_rotation(host, node, &EulerRotation::identity(order), Channels::empty())
}

pub fn rotation_order<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<RotationOrder, TransformError> {
    host.rotation_order(node)
}

// ============================================================================
// Scale
// ============================================================================

pub fn scale<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<Vector3<f64>, TransformError> {
    read_channels(host, node, Channel::SCALE)
}

pub fn set_scale<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
    scale: Vector3<f64>,
    skip: Channels,
) -> Result<(), TransformError> {
    write_channels(host, node, Channel::SCALE, scale, skip)
}

pub fn reset_scale<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
) -> Result<(), TransformError> {
    set_scale(host, node, Vector3::new(1.0, 1.0, 1.0), Channels::empty())
}

// ============================================================================
// Joint orient and pivots
// ============================================================================

/// Joint orientation of `node`, always in XYZ order. Identity for non-joints.
pub fn joint_orient<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<EulerRotation, TransformError> {
    Ok(EulerRotation::from_vector(host.joint_orient(node)?, RotationOrder::Xyz))
}

/// Writes the joint orientation. A no-op on anything but a joint.
pub fn set_joint_orient<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
    orient: &EulerRotation,
) -> Result<(), TransformError> {
    if !require_transform(host, node)? {
        debug!("{} is not a joint, ignoring joint orient", node);
        return Ok(());
    }
    let orient = orient.reorder(RotationOrder::Xyz);
    host.set_joint_orient(node, orient.to_vector())
}

pub fn reset_joint_orient<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
) -> Result<(), TransformError> {
    set_joint_orient(host, node, &EulerRotation::identity(RotationOrder::Xyz))
}

/// Moves every pivot and pivot translate back to the origin.
pub fn reset_pivots<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
) -> Result<(), TransformError> {
    host.set_pivots(node, Pivots::default())
}

// ============================================================================
// Offset matrix
// ============================================================================

pub fn offset_matrix<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<Matrix4<f64>, TransformError> {
    Ok(matrix_from_slice(&host.offset_matrix(node)?)?)
}

pub fn set_offset_matrix<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
    matrix: &Matrix4<f64>,
) -> Result<(), TransformError> {
    host.set_offset_matrix(node, &matrix_to_array(matrix))
}

pub fn reset_offset_matrix<H: ChannelAccess + ?Sized>(
    host: &mut H,
    node: NodeId,
) -> Result<(), TransformError> {
    set_offset_matrix(host, node, &Matrix4::identity())
}

// ============================================================================
// Matrices
// ============================================================================

/// The node's local matrix built from its channels and pivots:
///
/// `Sp⁻¹ × S × Sp × Spt × Rp⁻¹ × R × JO × Rp × Rpt × T`
///
/// Nodes without transform channels contribute identity.
pub fn local_matrix<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<Matrix4<f64>, TransformError> {
    if !host.kind(node)?.is_transform() {
        return Ok(Matrix4::identity());
    }

    let pivots = host.pivots(node)?;
    let scale_pivot = compose_translation(pivots.scale_pivot);
    let rotate_pivot = compose_translation(pivots.rotate_pivot);

    let chain = [
        compose_translation(-pivots.scale_pivot),
        compose_scale(scale(host, node)?),
        scale_pivot,
        compose_translation(pivots.scale_pivot_translate),
        compose_translation(-pivots.rotate_pivot),
        compose_rotation(&rotation(host, node)?),
        compose_rotation(&joint_orient(host, node)?),
        rotate_pivot,
        compose_translation(pivots.rotate_pivot_translate),
        compose_translation(translation(host, node, Space::Object)?),
    ];

    Ok(chain
        .iter()
        .fold(Matrix4::identity(), |matrix, next| row_mul(&matrix, next)))
}

/// Everything between the node's local matrix and world space: its own
/// offset matrix followed by the parent's world matrix.
pub fn parent_matrix<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<Matrix4<f64>, TransformError> {
    let offset = if host.kind(node)?.is_transform() {
        offset_matrix(host, node)?
    } else {
        Matrix4::identity()
    };

    match host.parent(node)? {
        Some(parent) => Ok(row_mul(&offset, &world_matrix(host, parent)?)),
        None => Ok(offset),
    }
}

/// `local × offset × parentWorld`.
pub fn world_matrix<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
) -> Result<Matrix4<f64>, TransformError> {
    Ok(row_mul(&local_matrix(host, node)?, &parent_matrix(host, node)?))
}

/// Decomposes the node's local or world matrix in its own rotation order.
pub fn decompose_node<H: ChannelAccess + ?Sized>(
    host: &H,
    node: NodeId,
    space: Space,
) -> Result<TransformComponents, TransformError> {
    let order = host.rotation_order(node)?;
    let matrix = match space {
        Space::Object => local_matrix(host, node)?,
        Space::World => world_matrix(host, node)?,
    };
    Ok(decompose_matrix(&matrix, order))
}
