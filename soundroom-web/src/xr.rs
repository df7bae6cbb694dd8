use glam::{Quat, Vec3};

use crate::controllers::{ControllerEvent, Handedness};

/// Session modes a device can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Inline,
    ImmersiveVr,
    ImmersiveAr,
}

/// Static description of an emulated headset.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub controller_profile: &'static str,
    pub session_modes: &'static [SessionMode],
}

impl DeviceProfile {
    pub fn meta_quest_3() -> Self {
        Self {
            name: "Meta Quest 3",
            controller_profile: "meta-quest-touch-plus",
            session_modes: &[SessionMode::Inline, SessionMode::ImmersiveVr, SessionMode::ImmersiveAr],
        }
    }

    pub fn supports(&self, mode: SessionMode) -> bool {
        self.session_modes.contains(&mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerPose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Resting controller orientation: held slightly tilted forward.
const DEFAULT_CONTROLLER_ORIENTATION: Quat = Quat::from_xyzw(
    0.14766305685043335,
    0.02471366710960865,
    -0.0037767395842820406,
    0.9887216687202454,
);

pub const DEFAULT_LEFT_POSE: ControllerPose = ControllerPose {
    position: Vec3::new(-0.15649, 1.43474, -0.38368),
    orientation: DEFAULT_CONTROLLER_ORIENTATION,
};

pub const DEFAULT_RIGHT_POSE: ControllerPose = ControllerPose {
    position: Vec3::new(0.15649, 1.43474, -0.38368),
    orientation: DEFAULT_CONTROLLER_ORIENTATION,
};

/// Vertical field of view the emulated headset renders with.
pub const EMULATED_FOVY_DEG: f32 = 75.0;

/// Software stand-in for a headset, used when the platform has no native
/// immersive support.
///
/// While a session is active it reports both controllers as connected
/// at their configured poses.
#[derive(Debug, Clone)]
pub struct EmulatedDevice {
    pub profile: DeviceProfile,
    /// Vertical field of view in radians.
    pub fovy: f32,
    /// Inter-pupillary distance in metres. Zero renders both eyes identically.
    pub ipd: f32,
    pub dev_ui: bool,
    left: ControllerPose,
    right: ControllerPose,
    installed: bool,
    session_active: bool,
}

impl EmulatedDevice {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            fovy: std::f32::consts::FRAC_PI_2,
            ipd: 0.063,
            dev_ui: false,
            left: ControllerPose {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            },
            right: ControllerPose {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            },
            installed: false,
            session_active: false,
        }
    }

    /// Make this device the active session provider.
    pub fn install_runtime(&mut self) {
        self.installed = true;
        log::info!("Installed emulated XR runtime ({})", self.profile.name);
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn controller_pose(&self, hand: Handedness) -> ControllerPose {
        match hand {
            Handedness::Left => self.left,
            Handedness::Right => self.right,
        }
    }

    pub fn set_controller_pose(&mut self, hand: Handedness, pose: ControllerPose) {
        match hand {
            Handedness::Left => self.left = pose,
            Handedness::Right => self.right = pose,
        }
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    /// Begin a session; yields a `connected` event per controller as (slot index, event).
    pub fn start_session(&mut self) -> Vec<(usize, ControllerEvent)> {
        if self.session_active {
            return Vec::new();
        }
        self.session_active = true;
        Self::controller_events()
    }

    /// End the session; yields a `disconnected` event per controller.
    pub fn end_session(&mut self) -> Vec<(usize, ControllerEvent)> {
        if !self.session_active {
            return Vec::new();
        }
        self.session_active = false;
        Self::controller_events()
    }

    fn controller_events() -> Vec<(usize, ControllerEvent)> {
        vec![
            (0, ControllerEvent::new(Handedness::Left)),
            (1, ControllerEvent::new(Handedness::Right)),
        ]
    }
}

/// Where immersive sessions come from.
#[derive(Debug, Clone)]
pub enum XrRuntime {
    /// The platform's own WebXR implementation.
    Native,
    /// No native support; the emulated device stands in.
    Emulated(EmulatedDevice),
    /// No native support and emulation disabled.
    Unavailable,
}

impl XrRuntime {
    pub fn supports_immersive(&self) -> bool {
        match self {
            Self::Native => true,
            Self::Emulated(device) => device.profile.supports(SessionMode::ImmersiveVr),
            Self::Unavailable => false,
        }
    }

    pub fn emulated(&self) -> Option<&EmulatedDevice> {
        match self {
            Self::Emulated(device) => Some(device),
            _ => None,
        }
    }

    pub fn emulated_mut(&mut self) -> Option<&mut EmulatedDevice> {
        match self {
            Self::Emulated(device) => Some(device),
            _ => None,
        }
    }
}

/// Pick the runtime from the capability check, falling back to an emulated
/// Quest 3 with a 75° field of view, zero IPD and default controller poses.
pub fn select_runtime(native_supported: bool, allow_emulation: bool) -> XrRuntime {
    if native_supported {
        log::info!("Native immersive-vr support detected");
        return XrRuntime::Native;
    }
    if !allow_emulation {
        log::warn!("No immersive-vr support and emulation is disabled");
        return XrRuntime::Unavailable;
    }

    let mut device = EmulatedDevice::new(DeviceProfile::meta_quest_3());
    device.install_runtime();
    device.fovy = EMULATED_FOVY_DEG.to_radians();
    device.ipd = 0.0;
    device.set_controller_pose(Handedness::Right, DEFAULT_RIGHT_POSE);
    device.set_controller_pose(Handedness::Left, DEFAULT_LEFT_POSE);
    device.dev_ui = true;
    XrRuntime::Emulated(device)
}
