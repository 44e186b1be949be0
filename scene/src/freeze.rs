//! Freezing and unfreezing transforms.
//!
//! A frozen transform keeps its pose in its offset matrix and shows zeroed
//! translate and rotate channels. Scale is never stored in the offset matrix;
//! freezing it bakes it into the descendants instead (see
//! [`freeze_scale`](crate::scale_baker::freeze_scale)), which cannot be undone.

use log::debug;

use crate::channels::{
    invert, local_matrix, offset_matrix, require_transform, reset_offset_matrix, reset_rotation,
    reset_translation, scale, set_offset_matrix,
};
use crate::common::{compose_scale, is_identity, row_mul, EPSILON};
use crate::host::SceneHost;
use crate::node::NodeId;
use crate::pose::{apply_transform_matrix, ApplyOptions};
use crate::report::WarningSink;
use crate::scale_baker::freeze_scale;
use crate::TransformError;

/// Which channels [`freeze`] moves out of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeOptions {
    pub translate: bool,
    pub rotate: bool,
    pub scale: bool,
}

impl Default for FreezeOptions {
    fn default() -> Self {
        Self {
            translate: true,
            rotate: true,
            scale: true,
        }
    }
}

impl FreezeOptions {
    /// Translate and rotate only. Scale stays on the node.
    pub fn translate_rotate() -> Self {
        Self {
            scale: false,
            ..Self::default()
        }
    }
}

/// Moves the selected channels of `node` into its offset matrix.
///
/// Translate and rotate are zeroed and the offset matrix is extended so the
/// node keeps its world pose:
///
/// `newOffset = remaining⁻¹ × before × oldOffset`
///
/// where `before` is the local matrix ahead of the reset and `remaining` the
/// local matrix after it. With no pivots or joint orientation this is the
/// familiar `rotate × translate × oldOffset`.
///
/// Scale, if selected, is baked into the descendants first and then reset.
/// Unsupported descendants are reported to `sink`.
///
/// Returns `false` without touching anything when the local matrix is already
/// identity within [`EPSILON`].
pub fn freeze<H: SceneHost + ?Sized>(
    host: &mut H,
    node: NodeId,
    options: FreezeOptions,
    sink: &mut dyn WarningSink,
) -> Result<bool, TransformError> {
    require_transform(host, node)?;

    if is_identity(&local_matrix(host, node)?, EPSILON) {
        debug!("{} has already been frozen", node);
        return Ok(false);
    }

    if options.scale {
        let scale_matrix = compose_scale(scale(host, node)?);
        freeze_scale(host, node, &scale_matrix, sink)?;
    }

    let before = local_matrix(host, node)?;

    if options.translate {
        reset_translation(host, node)?;
    }
    if options.rotate {
        reset_rotation(host, node)?;
    }

    let remaining = invert(&local_matrix(host, node)?, node)?;
    let moved = row_mul(&remaining, &before);

    let offset = offset_matrix(host, node)?;
    let new_offset = if is_identity(&offset, EPSILON) {
        moved
    } else {
        row_mul(&moved, &offset)
    };

    set_offset_matrix(host, node, &new_offset)?;
    debug!("{} frozen into offset matrix {:?}", node, new_offset);
    Ok(true)
}

/// Moves the offset matrix of `node` back into its channels.
///
/// The full local matrix (scale included) is composed with the offset,
/// decomposed in the node's rotation order and written to translate, rotate
/// and scale, joint orientation divided out. The offset matrix is then reset
/// to identity. Scale baked into descendants by [`freeze`] stays baked.
///
/// Returns `false` without touching anything when the offset matrix is
/// already identity within [`EPSILON`].
pub fn unfreeze<H: SceneHost + ?Sized>(host: &mut H, node: NodeId) -> Result<bool, TransformError> {
    require_transform(host, node)?;

    let offset = offset_matrix(host, node)?;
    if is_identity(&offset, EPSILON) {
        debug!("{} has already been unfrozen", node);
        return Ok(false);
    }

    let local = local_matrix(host, node)?;
    let combined = if is_identity(&local, EPSILON) {
        offset
    } else {
        row_mul(&local, &offset)
    };

    apply_transform_matrix(host, node, &combined, ApplyOptions::default())?;
    reset_offset_matrix(host, node)?;
    Ok(true)
}
