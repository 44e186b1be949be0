//! Moving whole poses onto nodes.

use cgmath::Matrix4;
use log::debug;

use crate::channels::{
    invert, joint_orient, local_matrix, parent_matrix, require_transform, set_rotation,
    set_scale, set_translation, translation, world_matrix, Space,
};
use crate::common::{compose_rotation, decompose_matrix, rotation_from_matrix, row_mul};
use crate::host::SceneHost;
use crate::node::{Channels, NodeId};
use crate::snapshot::Snapshot;
use crate::TransformError;

/// Options for [`apply_transform_matrix`] and [`copy_transform`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Channels to leave untouched.
    pub skip: Channels,
    /// Keep every transform below the node at its current world pose.
    pub preserve_children: bool,
}

impl ApplyOptions {
    pub fn preserve_children() -> Self {
        Self {
            preserve_children: true,
            ..Self::default()
        }
    }

    pub fn with_skip(mut self, skip: Channels) -> Self {
        self.skip = skip;
        self
    }
}

/// Writes `matrix` into the channels of `node` as its new local matrix.
///
/// The matrix is decomposed in the node's rotation order. On joints the joint
/// orientation is divided out of the rotation first, since only the rotate
/// channels are writable. The translate channel is solved last so that the
/// node's pivots and pivot translates land the local matrix on `matrix`.
///
/// # Arguments
/// * `host` - Scene to edit
/// * `node` - Transform or joint receiving the matrix
/// * `matrix` - New local matrix
/// * `options` - Skip mask and child preservation
pub fn apply_transform_matrix<H: SceneHost + ?Sized>(
    host: &mut H,
    node: NodeId,
    matrix: &Matrix4<f64>,
    options: ApplyOptions,
) -> Result<(), TransformError> {
    let is_joint = require_transform(host, node)?;

    let snapshot = if options.preserve_children {
        Some(Snapshot::capture(host, node)?)
    } else {
        None
    };

    let order = host.rotation_order(node)?;
    let mut components = decompose_matrix(matrix, order);

    if is_joint {
        let orient = compose_rotation(&joint_orient(host, node)?);
        let rotation = row_mul(
            &compose_rotation(&components.rotation),
            &invert(&orient, node)?,
        );
        components.rotation = rotation_from_matrix(&rotation, order);
    }

    set_rotation(host, node, &components.rotation, options.skip)?;
    set_scale(host, node, components.scale, options.skip)?;

    // Translate comes last in the local chain, so whatever the pivots add on
    // top of it is the chain's position minus the current translate channel.
    let pivot_offset =
        local_matrix(host, node)?.w.truncate() - translation(host, node, Space::Object)?;
    components.translation -= pivot_offset;
    set_translation(host, node, components.translation, Space::Object, options.skip)?;

    debug!("{} <- {}", node, components);

    if let Some(snapshot) = snapshot {
        snapshot.restore(host)?;
    }

    Ok(())
}

/// Applies a world-space matrix to `node` by carrying it through the inverse
/// of the node's current parent matrix.
pub fn apply_world_matrix<H: SceneHost + ?Sized>(
    host: &mut H,
    node: NodeId,
    world: &Matrix4<f64>,
    options: ApplyOptions,
) -> Result<(), TransformError> {
    let parent_inverse = invert(&parent_matrix(host, node)?, node)?;
    apply_transform_matrix(host, node, &row_mul(world, &parent_inverse), options)
}

/// Moves `target` to the world pose of `source`.
///
/// The source pose includes its pivots and joint orientation.
pub fn copy_transform<H: SceneHost + ?Sized>(
    host: &mut H,
    source: NodeId,
    target: NodeId,
    options: ApplyOptions,
) -> Result<(), TransformError> {
    require_transform(host, source)?;

    let world = world_matrix(host, source)?;
    debug!("Composed world matrix of {}: {:?}", source, world);

    apply_world_matrix(host, target, &world, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{local_matrix, scale, set_joint_orient, translation};
    use crate::common::{approx_eq, compose_translation, EulerRotation, RotationOrder, TransformComponents};
    use crate::node::{NodeKind, Pivots};
    use crate::Scene;
    use cgmath::{InnerSpace, Vector3};

    const TEST_EPSILON: f64 = 1e-9;

    fn components(t: [f64; 3], r: [f64; 3], s: [f64; 3], order: RotationOrder) -> TransformComponents {
        TransformComponents {
            translation: Vector3::from(t),
            rotation: EulerRotation::new(r[0], r[1], r[2], order),
            scale: Vector3::from(s),
        }
    }

    #[test]
    fn test_apply_matrix_writes_channels() {
        let mut scene = Scene::new();
        let node = scene.add_transform(None, "node").unwrap();
        scene.get_node_mut(node).unwrap().set_rotation_order(RotationOrder::Yzx);

        let matrix = components([1.0, 2.0, 3.0], [0.2, 0.4, -0.6], [1.0, 2.0, 0.5], RotationOrder::Yzx)
            .to_matrix();
        apply_transform_matrix(&mut scene, node, &matrix, ApplyOptions::default()).unwrap();

        assert!(approx_eq(&local_matrix(&scene, node).unwrap(), &matrix, TEST_EPSILON));
    }

    #[test]
    fn test_apply_matrix_on_joint_removes_orient() {
        let mut scene = Scene::new();
        let joint = scene.add_joint(None, "joint").unwrap();
        set_joint_orient(
            &mut scene,
            joint,
            &EulerRotation::new(0.0, 0.5, 0.0, RotationOrder::Xyz),
        )
        .unwrap();

        let matrix = components([0.0, 1.0, 0.0], [0.3, 0.1, 0.2], [1.0, 1.0, 1.0], RotationOrder::Xyz)
            .to_matrix();
        apply_transform_matrix(&mut scene, joint, &matrix, ApplyOptions::default()).unwrap();

        // rotate × jointOrient reproduces the requested rotation.
        assert!(approx_eq(&local_matrix(&scene, joint).unwrap(), &matrix, TEST_EPSILON));
        let rotate = scene.get_node(joint).unwrap().rotate();
        assert!((rotate - Vector3::new(0.3, 0.1, 0.2)).magnitude() > 1e-3);
    }

    #[test]
    fn test_apply_matrix_solves_translate_around_pivots() {
        let mut scene = Scene::new();
        let node = scene.add_transform(None, "node").unwrap();
        scene.get_node_mut(node).unwrap().set_pivots(Pivots {
            rotate_pivot: Vector3::new(1.0, 0.0, 0.0),
            rotate_pivot_translate: Vector3::new(0.0, 0.5, 0.0),
            scale_pivot: Vector3::new(0.0, 2.0, 0.0),
            scale_pivot_translate: Vector3::new(0.0, 0.0, -1.0),
        });

        let matrix = components([3.0, -1.0, 2.0], [0.4, 0.0, 0.5], [2.0, 2.0, 2.0], RotationOrder::Xyz)
            .to_matrix();
        apply_transform_matrix(&mut scene, node, &matrix, ApplyOptions::default()).unwrap();

        assert!(approx_eq(&local_matrix(&scene, node).unwrap(), &matrix, TEST_EPSILON));
        assert!((scale(&scene, node).unwrap() - Vector3::new(2.0, 2.0, 2.0)).magnitude() < TEST_EPSILON);
        assert!((translation(&scene, node, Space::Object).unwrap() - Vector3::new(3.0, -1.0, 2.0)).magnitude() > 1e-3);
    }

    #[test]
    fn test_apply_matrix_honours_skip() {
        let mut scene = Scene::new();
        let node = scene.add_transform(None, "node").unwrap();

        let matrix = components([1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [2.0, 2.0, 2.0], RotationOrder::Xyz)
            .to_matrix();
        let options = ApplyOptions::default().with_skip(Channels::TRANSLATE_Z | Channels::SCALE);
        apply_transform_matrix(&mut scene, node, &matrix, options).unwrap();

        assert_eq!(translation(&scene, node, Space::Object).unwrap(), Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(scale(&scene, node).unwrap(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_apply_matrix_rejects_shapes() {
        let mut scene = Scene::new();
        let mesh = scene.add_shape(None, "mesh", NodeKind::Mesh).unwrap();

        assert_eq!(
            apply_transform_matrix(&mut scene, mesh, &compose_translation(Vector3::unit_x()), ApplyOptions::default()),
            Err(TransformError::NotATransform(mesh))
        );
    }

    #[test]
    fn test_apply_matrix_preserves_children() {
        let mut scene = Scene::new();
        let parent = scene.add_transform(None, "parent").unwrap();
        let child = scene.add_transform(Some(parent), "child").unwrap();
        apply_transform_matrix(
            &mut scene,
            child,
            &compose_translation(Vector3::new(0.0, 1.0, 0.0)),
            ApplyOptions::default(),
        )
        .unwrap();
        let before = world_matrix(&scene, child).unwrap();

        let matrix = components([5.0, 0.0, 0.0], [0.0, 0.7, 0.0], [1.0, 1.0, 1.0], RotationOrder::Xyz)
            .to_matrix();
        apply_transform_matrix(&mut scene, parent, &matrix, ApplyOptions::preserve_children()).unwrap();

        assert!(approx_eq(&world_matrix(&scene, child).unwrap(), &before, TEST_EPSILON));
    }

    #[test]
    fn test_copy_transform_matches_world_pose() {
        let mut scene = Scene::new();
        let a_parent = scene.add_transform(None, "aParent").unwrap();
        let source = scene.add_joint(Some(a_parent), "source").unwrap();
        let b_parent = scene.add_transform(None, "bParent").unwrap();
        let target = scene.add_transform(Some(b_parent), "target").unwrap();

        let a_matrix = components([1.0, 0.0, 2.0], [0.3, 0.0, 0.0], [1.0, 1.0, 1.0], RotationOrder::Xyz).to_matrix();
        let b_matrix = components([0.0, -3.0, 0.0], [0.0, 0.0, 0.8], [2.0, 2.0, 2.0], RotationOrder::Zxy).to_matrix();
        apply_transform_matrix(&mut scene, a_parent, &a_matrix, ApplyOptions::default()).unwrap();
        apply_transform_matrix(&mut scene, b_parent, &b_matrix, ApplyOptions::default()).unwrap();

        let source_matrix = components([0.0, 4.0, 1.0], [0.1, 0.2, 0.3], [1.0, 1.0, 1.0], RotationOrder::Xyz)
            .to_matrix();
        apply_transform_matrix(&mut scene, source, &source_matrix, ApplyOptions::default()).unwrap();
        set_joint_orient(&mut scene, source, &EulerRotation::new(0.0, 0.0, 0.4, RotationOrder::Xyz)).unwrap();
        scene.get_node_mut(source).unwrap().set_pivots(Pivots {
            rotate_pivot: Vector3::new(0.5, 0.0, 0.0),
            ..Pivots::default()
        });

        copy_transform(&mut scene, source, target, ApplyOptions::default()).unwrap();

        assert!(approx_eq(
            &world_matrix(&scene, target).unwrap(),
            &world_matrix(&scene, source).unwrap(),
            1e-8
        ));
    }

    #[test]
    fn test_copy_transform_dead_source() {
        let mut scene = Scene::new();
        let source = scene.add_transform(None, "source").unwrap();
        let target = scene.add_transform(None, "target").unwrap();
        scene.remove_node(source).unwrap();

        assert_eq!(
            copy_transform(&mut scene, source, target, ApplyOptions::default()),
            Err(TransformError::InvalidHandle(source))
        );
    }
}
