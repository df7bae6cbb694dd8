use glam::{Mat4, Vec3};
use soundroom_shared::math;

use crate::scene::{NodeId, SceneGraph};

/// Perspective camera parameters. Lives inside a `NodeKind::Camera` node.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the projection after changing fov, aspect or clip planes.
    pub fn update_projection_matrix(&mut self) {
        self.projection = math::perspective(self.fov, self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}

/// Orbit-style camera controls for desktop debugging outside a session.
///
/// The camera circles `target` on a sphere; dragging changes azimuth and
/// polar angle, scrolling changes the radius.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
}

const MIN_POLAR: f32 = 1e-3;
const MAX_POLAR: f32 = std::f32::consts::PI - 1e-3;

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enabled: true,
            min_distance: 0.1,
            max_distance: 50.0,
            rotate_speed: 0.005,
        }
    }

    /// Point the camera at the target from wherever it currently is.
    pub fn update(&self, scene: &mut SceneGraph, camera: NodeId) {
        let eye = scene.node(camera).transform.position;
        scene.node_mut(camera).transform.rotation =
            math::camera_look_rotation(eye, self.target, Vec3::Y);
    }

    /// Orbit by a pointer drag of (`dx`, `dy`) pixels.
    pub fn rotate(&self, scene: &mut SceneGraph, camera: NodeId, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        let offset = scene.node(camera).transform.position - self.target;
        let radius = offset.length();
        if radius < 1e-6 {
            return;
        }
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth -= dx * self.rotate_speed;
        polar = (polar - dy * self.rotate_speed).clamp(MIN_POLAR, MAX_POLAR);

        scene.node_mut(camera).transform.position = self.target + spherical(radius, polar, azimuth);
        self.update(scene, camera);
    }

    /// Move toward (`factor` < 1) or away from (`factor` > 1) the target.
    pub fn dolly(&self, scene: &mut SceneGraph, camera: NodeId, factor: f32) {
        if !self.enabled || !(factor > 0.0) {
            return;
        }
        let offset = scene.node(camera).transform.position - self.target;
        let radius = (offset.length() * factor).clamp(self.min_distance, self.max_distance);
        let Some(dir) = offset.try_normalize() else {
            return;
        };
        scene.node_mut(camera).transform.position = self.target + dir * radius;
        self.update(scene, camera);
    }
}

fn spherical(radius: f32, polar: f32, azimuth: f32) -> Vec3 {
    let sin_polar = polar.sin();
    Vec3::new(
        radius * sin_polar * azimuth.sin(),
        radius * polar.cos(),
        radius * sin_polar * azimuth.cos(),
    )
}
