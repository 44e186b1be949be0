//! Capture and restore of descendant world poses.

use cgmath::Matrix4;
use log::debug;

use crate::channels::{invert, parent_matrix, world_matrix};
use crate::common::row_mul;
use crate::host::SceneHost;
use crate::node::{NodeId, NodeKind};
use crate::pose::{apply_transform_matrix, ApplyOptions};
use crate::tree::descendants;
use crate::TransformError;

/// World matrices of every transform below a node, recorded at one instant.
///
/// Entries are stored parents first, so restoring them in order always sees
/// an already-restored parent.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<(NodeId, Matrix4<f64>)>,
}

impl Snapshot {
    /// Records the world matrix of each transform descendant of `root`.
    /// `root` itself is not recorded.
    pub fn capture<H: SceneHost + ?Sized>(host: &H, root: NodeId) -> Result<Self, TransformError> {
        let entries = descendants(host, root, NodeKind::is_transform)?
            .into_iter()
            .map(|node| Ok((node, world_matrix(host, node)?)))
            .collect::<Result<Vec<_>, TransformError>>()?;

        debug!("Captured {} transforms below {}", entries.len(), root);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(NodeId, Matrix4<f64>)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Puts every recorded node back at its captured world pose, relative to
    /// whatever its parent chain looks like now.
    ///
    /// Nodes that no longer exist are skipped. Returns how many nodes were
    /// written.
    pub fn restore<H: SceneHost + ?Sized>(&self, host: &mut H) -> Result<usize, TransformError> {
        let mut restored = 0;

        for (node, world) in &self.entries {
            if !host.is_alive(*node) {
                debug!("{} no longer exists, skipping restore", node);
                continue;
            }

            let parent_inverse = invert(&parent_matrix(host, *node)?, *node)?;
            let local = row_mul(world, &parent_inverse);
            apply_transform_matrix(host, *node, &local, ApplyOptions::default())?;
            restored += 1;
        }

        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{
        local_matrix, set_offset_matrix, set_rotation, set_scale, set_translation, Space,
    };
    use crate::common::{approx_eq, compose_translation, EulerRotation, RotationOrder};
    use crate::node::{Channels, Pivots};
    use crate::Scene;
    use cgmath::Vector3;

    const TEST_EPSILON: f64 = 1e-9;

    fn posed_chain() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.add_transform(None, "root").unwrap();
        let a = scene.add_transform(Some(root), "a").unwrap();
        let b = scene.add_joint(Some(a), "b").unwrap();

        for (node, t, r) in [
            (root, Vector3::new(1.0, 2.0, 3.0), EulerRotation::new(0.1, 0.2, 0.3, RotationOrder::Xyz)),
            (a, Vector3::new(0.0, 4.0, 0.0), EulerRotation::new(0.5, 0.0, -0.4, RotationOrder::Xyz)),
            (b, Vector3::new(2.0, 0.0, 1.0), EulerRotation::new(0.0, 0.9, 0.0, RotationOrder::Xyz)),
        ] {
            set_translation(&mut scene, node, t, Space::Object, Channels::empty()).unwrap();
            set_rotation(&mut scene, node, &r, Channels::empty()).unwrap();
        }
        (scene, root, a, b)
    }

    #[test]
    fn test_capture_is_parents_first() {
        let (scene, root, a, b) = posed_chain();
        let snapshot = Snapshot::capture(&scene, root).unwrap();

        let nodes: Vec<NodeId> = snapshot.entries().iter().map(|(node, _)| *node).collect();
        assert_eq!(nodes, vec![a, b]);
    }

    #[test]
    fn test_restore_without_change_is_stable() {
        let (mut scene, root, a, b) = posed_chain();
        let before_a = local_matrix(&scene, a).unwrap();
        let before_b = local_matrix(&scene, b).unwrap();

        let snapshot = Snapshot::capture(&scene, root).unwrap();
        assert_eq!(snapshot.restore(&mut scene).unwrap(), 2);

        assert!(approx_eq(&local_matrix(&scene, a).unwrap(), &before_a, TEST_EPSILON));
        assert!(approx_eq(&local_matrix(&scene, b).unwrap(), &before_b, TEST_EPSILON));
    }

    #[test]
    fn test_restore_after_ancestor_edit() {
        let (mut scene, root, a, b) = posed_chain();
        let world_a = world_matrix(&scene, a).unwrap();
        let world_b = world_matrix(&scene, b).unwrap();

        let snapshot = Snapshot::capture(&scene, root).unwrap();
        set_translation(&mut scene, root, Vector3::new(-5.0, 0.0, 2.0), Space::Object, Channels::empty())
            .unwrap();
        set_scale(&mut scene, root, Vector3::new(3.0, 3.0, 3.0), Channels::empty()).unwrap();
        snapshot.restore(&mut scene).unwrap();

        assert!(approx_eq(&world_matrix(&scene, a).unwrap(), &world_a, 1e-8));
        assert!(approx_eq(&world_matrix(&scene, b).unwrap(), &world_b, 1e-8));
    }

    #[test]
    fn test_restore_skips_removed_nodes() {
        let (mut scene, root, _, b) = posed_chain();
        let snapshot = Snapshot::capture(&scene, root).unwrap();

        scene.remove_node(b).unwrap();
        assert_eq!(snapshot.restore(&mut scene).unwrap(), 1);
    }

    #[test]
    fn test_restore_keeps_pivoted_and_frozen_nodes() {
        let (mut scene, root, a, b) = posed_chain();
        scene.get_node_mut(b).unwrap().set_pivots(Pivots {
            rotate_pivot: Vector3::new(1.0, 0.0, 0.0),
            scale_pivot: Vector3::new(0.0, 0.5, 0.0),
            ..Pivots::default()
        });
        set_scale(&mut scene, b, Vector3::new(1.5, 1.5, 1.5), Channels::empty()).unwrap();
        set_offset_matrix(&mut scene, a, &compose_translation(Vector3::new(0.0, 0.0, 3.0))).unwrap();
        let before_a = local_matrix(&scene, a).unwrap();
        let before_b = local_matrix(&scene, b).unwrap();
        let world_b = world_matrix(&scene, b).unwrap();

        let snapshot = Snapshot::capture(&scene, root).unwrap();
        snapshot.restore(&mut scene).unwrap();

        assert!(approx_eq(&local_matrix(&scene, a).unwrap(), &before_a, TEST_EPSILON));
        assert!(approx_eq(&local_matrix(&scene, b).unwrap(), &before_b, TEST_EPSILON));
        assert!(approx_eq(&world_matrix(&scene, b).unwrap(), &world_b, TEST_EPSILON));
    }

    #[test]
    fn test_restore_pivoted_node_after_ancestor_edit() {
        let mut scene = Scene::new();
        let root = scene.add_transform(None, "root").unwrap();
        let child = scene.add_transform(Some(root), "child").unwrap();
        scene.get_node_mut(child).unwrap().set_pivots(Pivots {
            rotate_pivot: Vector3::new(1.0, 0.0, 0.0),
            ..Pivots::default()
        });
        set_rotation(
            &mut scene,
            child,
            &EulerRotation::new(0.0, 0.0, 0.5, RotationOrder::Xyz),
            Channels::empty(),
        )
        .unwrap();
        let world = world_matrix(&scene, child).unwrap();

        let snapshot = Snapshot::capture(&scene, root).unwrap();
        set_rotation(
            &mut scene,
            root,
            &EulerRotation::new(0.3, 0.0, 0.0, RotationOrder::Xyz),
            Channels::empty(),
        )
        .unwrap();
        snapshot.restore(&mut scene).unwrap();

        assert!(approx_eq(&world_matrix(&scene, child).unwrap(), &world, 1e-8));
    }
}
