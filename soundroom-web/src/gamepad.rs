use glam::Vec2;

/// Raw state of one gamepad button as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ButtonSnapshot {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

/// Raw gamepad state for one controller at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub buttons: Vec<ButtonSnapshot>,
    pub axes: Vec<f32>,
}

/// Standard `xr-standard` button layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrButton {
    Trigger,
    Squeeze,
    Touchpad,
    Thumbstick,
    /// A on the right hand, X on the left.
    ButtonPrimary,
    /// B on the right hand, Y on the left.
    ButtonSecondary,
}

impl XrButton {
    pub fn index(self) -> usize {
        match self {
            Self::Trigger => 0,
            Self::Squeeze => 1,
            Self::Touchpad => 2,
            Self::Thumbstick => 3,
            Self::ButtonPrimary => 4,
            Self::ButtonSecondary => 5,
        }
    }
}

/// Standard `xr-standard` axis layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrAxis {
    TouchpadX,
    TouchpadY,
    ThumbstickX,
    ThumbstickY,
}

impl XrAxis {
    pub fn index(self) -> usize {
        match self {
            Self::TouchpadX => 0,
            Self::TouchpadY => 1,
            Self::ThumbstickX => 2,
            Self::ThumbstickY => 3,
        }
    }
}

/// Frame-latched view over a controller's gamepad.
///
/// The platform writes the live state with [`GamepadWrapper::set_source`]
/// whenever it changes; [`GamepadWrapper::update`] is called once per frame
/// and latches it, so "down"/"up" edges are stable for the whole frame.
#[derive(Debug, Clone, Default)]
pub struct GamepadWrapper {
    source: GamepadSnapshot,
    current: GamepadSnapshot,
    previous: GamepadSnapshot,
}

impl GamepadWrapper {
    pub fn new(source: GamepadSnapshot) -> Self {
        Self {
            source,
            current: GamepadSnapshot::default(),
            previous: GamepadSnapshot::default(),
        }
    }

    pub fn set_source(&mut self, source: GamepadSnapshot) {
        self.source = source;
    }

    /// Latch the live state for this frame.
    pub fn update(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.source.clone());
    }

    pub fn button(&self, button: XrButton) -> bool {
        pressed(&self.current, button)
    }

    /// Pressed this frame but not the previous one.
    pub fn button_down(&self, button: XrButton) -> bool {
        pressed(&self.current, button) && !pressed(&self.previous, button)
    }

    /// Released this frame.
    pub fn button_up(&self, button: XrButton) -> bool {
        !pressed(&self.current, button) && pressed(&self.previous, button)
    }

    pub fn button_value(&self, button: XrButton) -> f32 {
        self.current
            .buttons
            .get(button.index())
            .map(|b| b.value)
            .unwrap_or(0.0)
    }

    pub fn touched(&self, button: XrButton) -> bool {
        self.current
            .buttons
            .get(button.index())
            .map(|b| b.touched)
            .unwrap_or(false)
    }

    pub fn axis(&self, axis: XrAxis) -> f32 {
        self.current.axes.get(axis.index()).copied().unwrap_or(0.0)
    }

    pub fn thumbstick(&self) -> Vec2 {
        Vec2::new(self.axis(XrAxis::ThumbstickX), self.axis(XrAxis::ThumbstickY))
    }
}

fn pressed(snapshot: &GamepadSnapshot, button: XrButton) -> bool {
    snapshot
        .buttons
        .get(button.index())
        .map(|b| b.pressed)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_trigger(pressed: bool) -> GamepadSnapshot {
        let mut snapshot = GamepadSnapshot {
            buttons: vec![ButtonSnapshot::default(); 6],
            axes: vec![0.0, 0.0, 0.5, -1.0],
        };
        snapshot.buttons[0] = ButtonSnapshot {
            pressed,
            touched: pressed,
            value: if pressed { 1.0 } else { 0.0 },
        };
        snapshot
    }

    #[test]
    fn test_nothing_latched_before_first_update() {
        let pad = GamepadWrapper::new(with_trigger(true));
        assert!(!pad.button(XrButton::Trigger));
    }

    #[test]
    fn test_button_edges() {
        let mut pad = GamepadWrapper::new(with_trigger(false));
        pad.update();
        assert!(!pad.button_down(XrButton::Trigger));

        pad.set_source(with_trigger(true));
        pad.update();
        assert!(pad.button_down(XrButton::Trigger));
        assert!(pad.button(XrButton::Trigger));
        assert_eq!(pad.button_value(XrButton::Trigger), 1.0);

        pad.update();
        assert!(pad.button(XrButton::Trigger));
        assert!(!pad.button_down(XrButton::Trigger));

        pad.set_source(with_trigger(false));
        pad.update();
        assert!(pad.button_up(XrButton::Trigger));
        assert!(!pad.button(XrButton::Trigger));
    }

    #[test]
    fn test_axes_and_missing_inputs() {
        let mut pad = GamepadWrapper::new(with_trigger(false));
        pad.update();
        assert_eq!(pad.thumbstick(), Vec2::new(0.5, -1.0));

        let mut empty = GamepadWrapper::default();
        empty.update();
        assert_eq!(empty.axis(XrAxis::ThumbstickY), 0.0);
        assert!(!empty.button(XrButton::ButtonSecondary));
        assert!(!empty.touched(XrButton::Squeeze));
    }
}
