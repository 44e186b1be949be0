//! Pushing a transform's scale down into its descendants.

use cgmath::{EuclideanSpace, Matrix4, Point3, Vector3};
use log::debug;

use crate::channels::{
    offset_matrix, reset_scale, set_offset_matrix, set_translation, translation, Space,
};
use crate::common::{is_identity, transform_point, transform_vector, EPSILON};
use crate::host::SceneHost;
use crate::node::{Channels, NodeId, NodeKind, Pivots};
use crate::report::{Warning, WarningSink};
use crate::tree::descendants;
use crate::TransformError;

/// Bakes `scale_matrix` into every descendant of `root`, then resets the
/// scale channels of `root` to one.
///
/// Transforms get their translation, pivots and offset matrix position
/// scaled. Curves, surfaces and meshes get their points scaled, and locators
/// their local position and extent. Descendants of any other kind are
/// reported to `sink` and left alone.
///
/// The bake is exact for uniform scale. Under non-uniform scale a rotated
/// descendant picks up shear that its channels cannot represent. There is no
/// inverse operation.
pub fn freeze_scale<H: SceneHost + ?Sized>(
    host: &mut H,
    root: NodeId,
    scale_matrix: &Matrix4<f64>,
    sink: &mut dyn WarningSink,
) -> Result<(), TransformError> {
    for node in descendants(host, root, |_| true)? {
        match bake_node(host, node, scale_matrix) {
            Ok(()) => {}
            Err(error @ TransformError::UnsupportedGeometryKind { .. }) => {
                sink.warn(Warning::new(node, error));
            }
            Err(error) => return Err(error),
        }
    }

    reset_scale(host, root)
}

fn bake_node<H: SceneHost + ?Sized>(
    host: &mut H,
    node: NodeId,
    scale_matrix: &Matrix4<f64>,
) -> Result<(), TransformError> {
    match host.kind(node)? {
        NodeKind::Transform | NodeKind::Joint => {
            let local = translation(host, node, Space::Object)?;
            let scaled = scale_position(local, scale_matrix);
            set_translation(host, node, scaled, Space::Object, Channels::empty())?;

            let pivots = host.pivots(node)?;
            host.set_pivots(
                node,
                Pivots {
                    rotate_pivot: scale_position(pivots.rotate_pivot, scale_matrix),
                    rotate_pivot_translate: scale_position(pivots.rotate_pivot_translate, scale_matrix),
                    scale_pivot: scale_position(pivots.scale_pivot, scale_matrix),
                    scale_pivot_translate: scale_position(pivots.scale_pivot_translate, scale_matrix),
                },
            )?;

            // A frozen descendant keeps its position in the offset matrix.
            let mut offset = offset_matrix(host, node)?;
            if !is_identity(&offset, EPSILON) {
                offset.w = scale_position(offset.w.truncate(), scale_matrix).extend(1.0);
                set_offset_matrix(host, node, &offset)?;
            }
        }
        NodeKind::Curve | NodeKind::Surface => {
            scale_points(host, node, scale_matrix)?;
            host.mark_geometry_dirty(node)?;
        }
        NodeKind::Mesh => {
            scale_points(host, node, scale_matrix)?;
        }
        NodeKind::Locator => {
            let mut locator = host.locator(node)?;
            locator.local_position = transform_vector(locator.local_position, scale_matrix);
            locator.local_scale = transform_vector(locator.local_scale, scale_matrix);
            host.set_locator(node, locator)?;
        }
        kind @ NodeKind::Other(_) => {
            return Err(TransformError::UnsupportedGeometryKind { node, kind });
        }
    }

    debug!("Baked scale into {}", node);
    Ok(())
}

fn scale_position(position: Vector3<f64>, scale_matrix: &Matrix4<f64>) -> Vector3<f64> {
    transform_point(Point3::from_vec(position), scale_matrix).to_vec()
}

fn scale_points<H: SceneHost + ?Sized>(
    host: &mut H,
    node: NodeId,
    scale_matrix: &Matrix4<f64>,
) -> Result<(), TransformError> {
    let points: Vec<Point3<f64>> = host
        .points(node)?
        .into_iter()
        .map(|point| transform_point(point, scale_matrix))
        .collect();
    host.set_points(node, &points)
}
