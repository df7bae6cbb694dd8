use glam::{Mat4, Vec3};
use soundroom_shared::math;

use crate::scene::{NodeId, SceneGraph};

/// Compute world transform matrices for every node in the scene.
///
/// Walks down from the root composing parent * local. Detached subtrees
/// (models still waiting to be attached) are computed relative to identity
/// so their cached matrices are never stale garbage.
pub fn compute_world_transforms(scene: &mut SceneGraph) {
    let mut visited = vec![false; scene.len()];
    let root = scene.root();
    walk(scene, root, Mat4::IDENTITY, &mut visited);

    let orphans: Vec<NodeId> = scene
        .ids()
        .filter(|id| !visited[id.index()] && scene.node(*id).parent().is_none())
        .collect();
    for id in orphans {
        walk(scene, id, Mat4::IDENTITY, &mut visited);
    }
}

fn walk(scene: &mut SceneGraph, start: NodeId, parent_world: Mat4, visited: &mut [bool]) {
    let mut stack = vec![(start, parent_world)];
    while let Some((id, parent)) = stack.pop() {
        let t = scene.node(id).transform;
        let world = parent * math::compose(t.position, t.rotation, t.scale);
        scene.node_mut(id).world_transform = world;
        visited[id.index()] = true;
        for child in scene.children(id) {
            stack.push((*child, world));
        }
    }
}

/// Orient `id` so its +Z axis points at the world-space `target`.
///
/// Uses the node's cached world position, so call after
/// [`compute_world_transforms`] when the parent chain has moved.
pub fn look_at(scene: &mut SceneGraph, id: NodeId, target: Vec3) {
    let eye = scene.node(id).transform.position;
    let parent_world = scene
        .node(id)
        .parent()
        .map(|p| scene.node(p).world_transform)
        .unwrap_or(Mat4::IDENTITY);
    let (_, parent_rot, _) = parent_world.to_scale_rotation_translation();
    let world_eye = parent_world.transform_point3(eye);

    let world_rot = math::look_at_rotation(world_eye, target, Vec3::Y);
    scene.node_mut(id).transform.rotation = (parent_rot.inverse() * world_rot).normalize();
}
