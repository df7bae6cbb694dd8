use std::fmt;
use std::str::FromStr;

use crate::gamepad::{GamepadSnapshot, GamepadWrapper};
use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Which hand an input source is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unsupported handedness '{other}'")),
        }
    }
}

/// Payload of a controller `connected` / `disconnected` event.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerEvent {
    /// Raw handedness string from the input source ("left", "right", "none").
    pub handedness: String,
    pub gamepad: GamepadSnapshot,
}

impl ControllerEvent {
    pub fn new(handedness: Handedness) -> Self {
        Self {
            handedness: handedness.as_str().to_string(),
            gamepad: GamepadSnapshot::default(),
        }
    }
}

/// Per-index controller placeholder: ray space, grip space and grip model.
///
/// Built once at startup under the player rig and hidden until a device
/// connects on that index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSlot {
    pub index: usize,
    pub ray: NodeId,
    pub grip: NodeId,
    pub model: NodeId,
}

impl ControllerSlot {
    pub fn build(index: usize, scene: &mut SceneGraph, player: NodeId) -> Self {
        let ray = scene.spawn(format!("controller{index}.ray"), NodeKind::ControllerRay);
        let grip = scene.spawn(format!("controller{index}.grip"), NodeKind::ControllerGrip);
        let model = scene.spawn(format!("controller{index}.model"), NodeKind::ControllerModel);
        scene.add(grip, model);
        scene.add(player, ray);
        scene.add(player, grip);

        scene.set_visible(ray, false);
        scene.set_visible(grip, false);

        Self {
            index,
            ray,
            grip,
            model,
        }
    }

    fn set_visible(&self, scene: &mut SceneGraph, visible: bool) {
        scene.set_visible(self.ray, visible);
        scene.set_visible(self.grip, visible);
    }
}

/// A connected controller.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub ray: NodeId,
    pub grip: NodeId,
    pub model: NodeId,
    pub gamepad: GamepadWrapper,
}

/// Controller state by hand. `None` means nothing is connected on that hand.
#[derive(Debug, Clone, Default)]
pub struct Controllers {
    pub left: Option<ControllerState>,
    pub right: Option<ControllerState>,
}

impl Controllers {
    pub fn get(&self, hand: Handedness) -> Option<&ControllerState> {
        self.entry(hand).as_ref()
    }

    pub fn get_mut(&mut self, hand: Handedness) -> Option<&mut ControllerState> {
        self.entry_mut(hand).as_mut()
    }

    pub fn is_connected(&self, hand: Handedness) -> bool {
        self.get(hand).is_some()
    }

    fn entry(&self, hand: Handedness) -> &Option<ControllerState> {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    fn entry_mut(&mut self, hand: Handedness) -> &mut Option<ControllerState> {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    /// Connected controllers, left first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handedness, &mut ControllerState)> {
        [(Handedness::Left, self.left.as_mut()), (Handedness::Right, self.right.as_mut())]
            .into_iter()
            .filter_map(|(hand, state)| state.map(|s| (hand, s)))
    }

    /// Handle `connected` on a slot: show its nodes and record the hand's state.
    ///
    /// Returns the hand that was recorded, or `None` if the event's
    /// handedness is not left/right (the nodes are still shown).
    pub fn connect(
        &mut self,
        slot: &ControllerSlot,
        scene: &mut SceneGraph,
        event: &ControllerEvent,
    ) -> Option<Handedness> {
        slot.set_visible(scene, true);

        let hand = match event.handedness.parse::<Handedness>() {
            Ok(hand) => hand,
            Err(e) => {
                log::warn!("Controller {} connected: {e}", slot.index);
                return None;
            }
        };

        log::info!("Controller {} connected ({hand})", slot.index);
        *self.entry_mut(hand) = Some(ControllerState {
            ray: slot.ray,
            grip: slot.grip,
            model: slot.model,
            gamepad: GamepadWrapper::new(event.gamepad.clone()),
        });
        Some(hand)
    }

    /// Handle `disconnected` on a slot: hide its nodes and clear only that hand.
    pub fn disconnect(
        &mut self,
        slot: &ControllerSlot,
        scene: &mut SceneGraph,
        event: &ControllerEvent,
    ) -> Option<Handedness> {
        slot.set_visible(scene, false);

        let hand = match event.handedness.parse::<Handedness>() {
            Ok(hand) => hand,
            Err(e) => {
                log::warn!("Controller {} disconnected: {e}", slot.index);
                return None;
            }
        };

        log::info!("Controller {} disconnected ({hand})", slot.index);
        *self.entry_mut(hand) = None;
        Some(hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (SceneGraph, [ControllerSlot; 2]) {
        let mut scene = SceneGraph::new();
        let player = scene.spawn("player", NodeKind::Group);
        let root = scene.root();
        scene.add(root, player);
        let slots = [
            ControllerSlot::build(0, &mut scene, player),
            ControllerSlot::build(1, &mut scene, player),
        ];
        (scene, slots)
    }

    #[test]
    fn test_slots_start_hidden_under_player() {
        let (scene, slots) = rig();
        let player = scene.find_by_name("player").unwrap();
        assert_eq!(scene.child_count(player), 4);
        for slot in &slots {
            assert!(!scene.node(slot.ray).visible);
            assert!(!scene.node(slot.grip).visible);
            assert_eq!(scene.node(slot.model).parent(), Some(slot.grip));
        }
    }

    #[test]
    fn test_connect_records_hand_and_shows_nodes() {
        let (mut scene, slots) = rig();
        let mut controllers = Controllers::default();
        let hand = controllers.connect(&slots[1], &mut scene, &ControllerEvent::new(Handedness::Right));
        assert_eq!(hand, Some(Handedness::Right));
        assert!(scene.node(slots[1].grip).visible);
        assert!(scene.node(slots[1].ray).visible);
        assert_eq!(controllers.get(Handedness::Right).unwrap().grip, slots[1].grip);
        assert!(controllers.left.is_none());
    }

    #[test]
    fn test_disconnect_clears_only_that_hand() {
        let (mut scene, slots) = rig();
        let mut controllers = Controllers::default();
        controllers.connect(&slots[0], &mut scene, &ControllerEvent::new(Handedness::Left));
        controllers.connect(&slots[1], &mut scene, &ControllerEvent::new(Handedness::Right));

        controllers.disconnect(&slots[0], &mut scene, &ControllerEvent::new(Handedness::Left));
        assert!(controllers.left.is_none());
        assert!(controllers.is_connected(Handedness::Right));
        assert!(!scene.node(slots[0].grip).visible);
        assert!(scene.node(slots[1].grip).visible);
    }

    #[test]
    fn test_unknown_handedness_is_ignored() {
        let (mut scene, slots) = rig();
        let mut controllers = Controllers::default();
        let event = ControllerEvent {
            handedness: "none".into(),
            gamepad: GamepadSnapshot::default(),
        };
        assert_eq!(controllers.connect(&slots[0], &mut scene, &event), None);
        assert!(controllers.left.is_none() && controllers.right.is_none());
    }

    #[test]
    fn test_iter_mut_visits_connected_only() {
        let (mut scene, slots) = rig();
        let mut controllers = Controllers::default();
        controllers.connect(&slots[1], &mut scene, &ControllerEvent::new(Handedness::Right));
        let hands: Vec<Handedness> = controllers.iter_mut().map(|(h, _)| h).collect();
        assert_eq!(hands, vec![Handedness::Right]);
    }
}
