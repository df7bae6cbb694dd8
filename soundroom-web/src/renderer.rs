use std::sync::atomic::{AtomicU64, Ordering};

use crate::scene::{NodeId, SceneGraph};

static NEXT_ENVIRONMENT: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a prefiltered environment map owned by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentMap {
    pub handle: u64,
    /// Number of emissive meshes that contributed to the bake.
    pub light_count: usize,
}

impl EnvironmentMap {
    pub fn next(light_count: usize) -> Self {
        Self {
            handle: NEXT_ENVIRONMENT.fetch_add(1, Ordering::Relaxed),
            light_count,
        }
    }
}

/// The drawing surface. Actual rasterisation belongs to the platform.
pub trait RenderSurface {
    fn set_pixel_ratio(&mut self, ratio: f32);
    fn pixel_ratio(&self) -> f32;

    /// Resize the output in CSS pixels.
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);

    fn set_xr_enabled(&mut self, enabled: bool);
    fn xr_enabled(&self) -> bool;

    /// Prefilter a lighting scene into an environment map.
    fn bake_environment(&mut self, scene: &SceneGraph) -> EnvironmentMap;

    fn render(&mut self, scene: &SceneGraph, camera: NodeId);

    fn frames_rendered(&self) -> u64;
}

/// Surface that draws nothing and records what it was asked to do.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    xr_enabled: bool,
    frames: u64,
    pub last_camera: Option<NodeId>,
    pub last_visible_nodes: usize,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
            xr_enabled: false,
            frames: 0,
            last_camera: None,
            last_visible_nodes: 0,
        }
    }

    /// Drawing-buffer size: CSS size times pixel ratio.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).floor() as u32,
            (self.height as f32 * self.pixel_ratio).floor() as u32,
        )
    }
}

impl RenderSurface for HeadlessSurface {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 {
            self.pixel_ratio = ratio;
        }
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_xr_enabled(&mut self, enabled: bool) {
        self.xr_enabled = enabled;
    }

    fn xr_enabled(&self) -> bool {
        self.xr_enabled
    }

    fn bake_environment(&mut self, scene: &SceneGraph) -> EnvironmentMap {
        EnvironmentMap::next(count_emissive(scene))
    }

    fn render(&mut self, scene: &SceneGraph, camera: NodeId) {
        self.frames += 1;
        self.last_camera = Some(camera);
        self.last_visible_nodes = count_visible(scene);
    }

    fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

/// Meshes with a positive emissive intensity anywhere under the root.
pub fn count_emissive(scene: &SceneGraph) -> usize {
    scene
        .descendants(scene.root())
        .into_iter()
        .filter(|id| match &scene.node(*id).kind {
            crate::scene::NodeKind::Mesh(mesh) => mesh.emissive_intensity > 0.0,
            _ => false,
        })
        .count()
}

/// Nodes reachable from the root through visible ancestors.
pub fn count_visible(scene: &SceneGraph) -> usize {
    let mut count = 0;
    let mut stack = vec![scene.root()];
    while let Some(id) = stack.pop() {
        if !scene.node(id).visible {
            continue;
        }
        count += 1;
        stack.extend_from_slice(scene.children(id));
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;

    #[test]
    fn test_hidden_subtrees_are_not_visible() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let grip = scene.spawn("grip", NodeKind::ControllerGrip);
        let model = scene.spawn("model", NodeKind::ControllerModel);
        scene.add(root, grip);
        scene.add(grip, model);
        assert_eq!(count_visible(&scene), 3);

        scene.set_visible(grip, false);
        assert_eq!(count_visible(&scene), 1);
    }

    #[test]
    fn test_headless_records_frames() {
        let scene = SceneGraph::new();
        let mut surface = HeadlessSurface::new(800, 600);
        surface.set_pixel_ratio(2.0);
        assert_eq!(surface.drawing_buffer_size(), (1600, 1200));
        surface.render(&scene, scene.root());
        surface.render(&scene, scene.root());
        assert_eq!(surface.frames_rendered(), 2);
        assert_eq!(surface.last_camera, Some(scene.root()));
    }

    #[test]
    fn test_environment_handles_are_unique() {
        let a = EnvironmentMap::next(0);
        let b = EnvironmentMap::next(0);
        assert_ne!(a.handle, b.handle);
    }
}
