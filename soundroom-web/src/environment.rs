use glam::Vec3;

use crate::assets::MeshInfo;
use crate::renderer::RenderSurface;
use crate::scene::{NodeKind, SceneGraph};

/// Room shell: position and scale of the inward-facing box.
const ROOM: (Vec3, Vec3) = (
    Vec3::new(-0.757, 13.219, 0.717),
    Vec3::new(31.713, 28.305, 28.591),
);

/// Emissive light panels: position, scale, intensity.
const LIGHTS: [(Vec3, Vec3, f32); 6] = [
    (Vec3::new(-16.116, 14.37, 8.208), Vec3::new(0.1, 2.425, 2.751), 50.0),
    (Vec3::new(-16.109, 18.021, -8.207), Vec3::new(0.1, 2.425, 2.751), 50.0),
    (Vec3::new(14.904, 12.198, -1.832), Vec3::new(0.15, 4.265, 6.331), 17.0),
    (Vec3::new(-0.462, 8.89, 14.52), Vec3::new(4.38, 5.441, 0.088), 43.0),
    (Vec3::new(3.235, 11.486, -12.541), Vec3::new(2.5, 2.0, 0.1), 20.0),
    (Vec3::new(0.0, 20.0, 0.0), Vec3::new(1.0, 0.1, 1.0), 100.0),
];

/// Generated interior used purely as an image-based lighting source.
pub struct RoomEnvironment;

impl RoomEnvironment {
    /// Build the lighting scene: one room box and six light panels.
    pub fn build() -> SceneGraph {
        let mut scene = SceneGraph::new();
        let root = scene.root();

        let room = scene.spawn(
            "room",
            NodeKind::Mesh(MeshInfo {
                primitives: 1,
                emissive_intensity: 0.0,
            }),
        );
        scene.node_mut(room).transform.position = ROOM.0;
        scene.node_mut(room).transform.scale = ROOM.1;
        scene.add(root, room);

        for (i, (position, scale, intensity)) in LIGHTS.iter().enumerate() {
            let light = scene.spawn(
                format!("light{}", i + 1),
                NodeKind::Mesh(MeshInfo {
                    primitives: 1,
                    emissive_intensity: *intensity,
                }),
            );
            scene.node_mut(light).transform.position = *position;
            scene.node_mut(light).transform.scale = *scale;
            scene.add(root, light);
        }

        scene
    }
}

/// Bake the room environment and install it as the scene's global illumination.
pub fn apply_room_environment(surface: &mut dyn RenderSurface, scene: &mut SceneGraph) {
    let room = RoomEnvironment::build();
    let map = surface.bake_environment(&room);
    log::debug!("Baked room environment #{} from {} lights", map.handle, map.light_count);
    scene.environment = Some(map);
}
