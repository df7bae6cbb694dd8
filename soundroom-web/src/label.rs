use glam::Vec3;
use soundroom_shared::{Anchor, LabelConfig};

use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Floating text rendered by the host's SDF text renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub font: String,
    pub font_size: f32,
    pub color: u32,
    pub anchor_x: Anchor,
    pub anchor_y: Anchor,
}

impl TextLabel {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            text: config.text.clone(),
            font: config.font.clone(),
            font_size: config.font_size,
            color: config.color,
            anchor_x: config.anchor_x,
            anchor_y: config.anchor_y,
        }
    }
}

/// Create the label node at its configured position and add it to the scene root.
pub fn add_label(scene: &mut SceneGraph, config: &LabelConfig) -> NodeId {
    let id = scene.spawn("label", NodeKind::TextLabel(TextLabel::from_config(config)));
    scene.set_position(id, Vec3::from_array(config.position));
    let root = scene.root();
    scene.add(root, id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundroom_shared::SceneConfig;

    #[test]
    fn test_label_placed_under_root() {
        let config = SceneConfig::labelled().label.unwrap();
        let mut scene = SceneGraph::new();
        let id = add_label(&mut scene, &config);

        assert_eq!(scene.node(id).parent(), Some(scene.root()));
        assert_eq!(scene.node(id).transform.position, Vec3::new(0.0, 0.67, -1.44));
        match &scene.node(id).kind {
            NodeKind::TextLabel(label) => {
                assert_eq!(label.font, "assets/SpaceMono-Bold.ttf");
                assert_eq!(label.font_size, 0.352);
                assert_eq!(label.anchor_x, Anchor::Center);
                assert_eq!(label.anchor_y, Anchor::Middle);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
