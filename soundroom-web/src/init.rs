use glam::Vec3;

use crate::assets::{AssetEvent, AssetQueue, AssetRequest};
use crate::audio;
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::controllers::{ControllerEvent, ControllerSlot, Controllers, Handedness};
use crate::environment;
use crate::gamepad::GamepadSnapshot;
use crate::renderer::RenderSurface;
use crate::scene::{NodeId, NodeKind, SceneGraph};
use crate::session::{SessionButton, SessionRequest};
use crate::transform;
use crate::xr::{self, XrRuntime};

pub const BACKGROUND_COLOR: u32 = 0x808080;
pub const CAMERA_FOV: f32 = 50.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
pub const CAMERA_START: Vec3 = Vec3::new(0.0, 1.6, 3.0);
pub const ORBIT_TARGET: Vec3 = Vec3::new(0.0, 1.6, 0.0);

/// What the page tells us about itself at startup.
#[derive(Debug, Clone, Copy)]
pub struct HostEnvironment {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    /// Result of the immersive-vr capability check.
    pub native_xr_supported: bool,
    /// Install the emulated device when native support is missing.
    pub allow_emulation: bool,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            pixel_ratio: 1.0,
            native_xr_supported: false,
            allow_emulation: true,
        }
    }
}

/// References handed to scene setup and to the per-frame hook.
pub struct Globals {
    pub scene: SceneGraph,
    pub camera: NodeId,
    pub renderer: Box<dyn RenderSurface>,
    pub player: NodeId,
    pub controllers: Controllers,
}

/// Handles a scene setup returns for later use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneHandles {
    pub speaker_groups: Vec<NodeId>,
    pub label: Option<NodeId>,
}

/// A swappable scene population routine.
///
/// `setup` runs exactly once, synchronously, before the first frame. Any
/// loads it queues complete later through `asset_event`, in any order.
pub trait SceneSetup {
    fn setup(&mut self, globals: &mut Globals, assets: &mut AssetQueue) -> SceneHandles;

    fn asset_event(&mut self, _event: AssetEvent, _globals: &mut Globals) {}

    /// A user gesture has unlocked audio playback.
    fn resume_audio(&mut self, _globals: &mut Globals) {}
}

/// Setup that adds nothing.
#[derive(Debug, Default)]
pub struct NoScene;

impl SceneSetup for NoScene {
    fn setup(&mut self, _globals: &mut Globals, _assets: &mut AssetQueue) -> SceneHandles {
        SceneHandles::default()
    }
}

impl<F> SceneSetup for F
where
    F: FnMut(&mut Globals, &mut AssetQueue) -> SceneHandles,
{
    fn setup(&mut self, globals: &mut Globals, assets: &mut AssetQueue) -> SceneHandles {
        self(globals, assets)
    }
}

/// Per-frame hook: `(delta_seconds, elapsed_seconds, globals)`.
pub type FrameFn = fn(f32, f32, &mut Globals);

/// The default per-frame hook: does nothing.
pub fn no_frame(_delta: f32, _elapsed: f32, _globals: &mut Globals) {}

/// Frame timer driven by the host's animation timestamps (milliseconds).
#[derive(Debug, Clone, Default)]
pub struct Clock {
    start: Option<f64>,
    last: Option<f64>,
}

impl Clock {
    /// Returns `(delta, elapsed)` in seconds. The first tick has zero delta.
    pub fn tick(&mut self, timestamp_ms: f64) -> (f32, f32) {
        let start = *self.start.get_or_insert(timestamp_ms);
        let delta = match self.last {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last = Some(timestamp_ms);
        (delta as f32, ((timestamp_ms - start) / 1000.0).max(0.0) as f32)
    }
}

/// The running experience: shared state plus the setup and frame callbacks.
pub struct App<S: SceneSetup, F: FnMut(f32, f32, &mut Globals)> {
    globals: Globals,
    setup: S,
    on_frame: F,
    handles: SceneHandles,
    assets: AssetQueue,
    slots: [ControllerSlot; 2],
    orbit: OrbitControls,
    runtime: XrRuntime,
    session_button: SessionButton,
    session_active: bool,
    clock: Clock,
}

/// Build renderer, camera, player rig and controller slots, then run `setup` once.
pub fn init<S, F>(host: HostEnvironment, mut renderer: Box<dyn RenderSurface>, mut setup: S, on_frame: F) -> App<S, F>
where
    S: SceneSetup,
    F: FnMut(f32, f32, &mut Globals),
{
    let runtime = xr::select_runtime(host.native_xr_supported, host.allow_emulation);

    let mut scene = SceneGraph::new();
    scene.background = soundroom_shared::math::hex_to_rgb(BACKGROUND_COLOR);

    let aspect = host.width as f32 / host.height.max(1) as f32;
    let camera = scene.spawn(
        "camera",
        NodeKind::Camera(PerspectiveCamera::new(CAMERA_FOV, aspect, CAMERA_NEAR, CAMERA_FAR)),
    );
    scene.set_position(camera, CAMERA_START);

    let orbit = OrbitControls::new(ORBIT_TARGET);
    orbit.update(&mut scene, camera);

    renderer.set_pixel_ratio(host.pixel_ratio);
    renderer.set_size(host.width, host.height);
    renderer.set_xr_enabled(true);

    environment::apply_room_environment(renderer.as_mut(), &mut scene);

    let player = scene.spawn("player", NodeKind::Group);
    let root = scene.root();
    scene.add(root, player);
    scene.add(player, camera);

    let slots = [
        ControllerSlot::build(0, &mut scene, player),
        ControllerSlot::build(1, &mut scene, player),
    ];

    let mut globals = Globals {
        scene,
        camera,
        renderer,
        player,
        controllers: Controllers::default(),
    };

    let mut assets = AssetQueue::new();
    let handles = setup.setup(&mut globals, &mut assets);

    let session_button = SessionButton::new(runtime.supports_immersive());
    log::info!(
        "Initialized {}x{} scene with {} speaker(s); session button: {}",
        host.width,
        host.height,
        handles.speaker_groups.len(),
        session_button.label()
    );

    App {
        globals,
        setup,
        on_frame,
        handles,
        assets,
        slots,
        orbit,
        runtime,
        session_button,
        session_active: false,
        clock: Clock::default(),
    }
}

/// [`init`] with an empty scene and no per-frame hook.
pub fn init_default(host: HostEnvironment, renderer: Box<dyn RenderSurface>) -> App<NoScene, FrameFn> {
    init(host, renderer, NoScene, no_frame as FrameFn)
}

impl<S: SceneSetup, F: FnMut(f32, f32, &mut Globals)> App<S, F> {
    /// One iteration of the animation loop.
    pub fn frame(&mut self, timestamp_ms: f64) {
        let (delta, elapsed) = self.clock.tick(timestamp_ms);

        for (_, controller) in self.globals.controllers.iter_mut() {
            controller.gamepad.update();
        }
        if self.session_active {
            self.sync_emulated_poses();
        }

        (self.on_frame)(delta, elapsed, &mut self.globals);

        transform::compute_world_transforms(&mut self.globals.scene);
        audio::update_spatial_gains(&mut self.globals.scene);

        let Globals {
            scene,
            camera,
            renderer,
            ..
        } = &mut self.globals;
        renderer.render(scene, *camera);
    }

    /// Match camera aspect and surface size to the new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        let camera = self.globals.camera;
        if let Some(cam) = self.globals.scene.camera_mut(camera) {
            cam.aspect = width as f32 / height.max(1) as f32;
            cam.update_projection_matrix();
        }
        self.globals.renderer.set_size(width, height);
        log::debug!("Resized to {width}x{height}");
    }

    /// Requests queued since the last call, for the host to fetch.
    pub fn take_requests(&mut self) -> Vec<AssetRequest> {
        self.assets.drain_requests()
    }

    /// Hand a load result (or progress) back to the scene setup.
    pub fn deliver(&mut self, event: AssetEvent) {
        if self.assets.complete(&event).is_none() {
            log::debug!("Asset event for unknown request #{}", event.id.0);
        }
        self.setup.asset_event(event, &mut self.globals);
    }

    pub fn controller_connected(&mut self, slot: usize, event: &ControllerEvent) {
        let Some(slot) = self.slots.get(slot).copied() else {
            log::warn!("Controller event for unknown slot {slot}");
            return;
        };
        let Globals {
            scene, controllers, ..
        } = &mut self.globals;
        controllers.connect(&slot, scene, event);
    }

    pub fn controller_disconnected(&mut self, slot: usize, event: &ControllerEvent) {
        let Some(slot) = self.slots.get(slot).copied() else {
            log::warn!("Controller event for unknown slot {slot}");
            return;
        };
        let Globals {
            scene, controllers, ..
        } = &mut self.globals;
        controllers.disconnect(&slot, scene, event);
    }

    /// Push the live gamepad state for a hand; latched on the next frame.
    pub fn set_gamepad(&mut self, hand: Handedness, snapshot: GamepadSnapshot) {
        match self.globals.controllers.get_mut(hand) {
            Some(controller) => controller.gamepad.set_source(snapshot),
            None => log::debug!("Gamepad update for disconnected {hand} controller"),
        }
    }

    /// Press the session button.
    ///
    /// With the emulated runtime the session starts or ends immediately, its
    /// controllers connect or disconnect, and nothing is returned. With the
    /// native runtime the returned request must be carried out by the host,
    /// which then calls [`session_started`](Self::session_started) /
    /// [`session_ended`](Self::session_ended).
    pub fn click_session_button(&mut self) -> Option<SessionRequest> {
        let request = self.session_button.click()?;
        if self.runtime.emulated().is_none() {
            return Some(request);
        }
        match request {
            SessionRequest::Start => self.session_started(),
            SessionRequest::End => self.session_ended(),
        }
        None
    }

    pub fn session_started(&mut self) {
        if self.session_active {
            return;
        }
        self.session_active = true;
        self.session_button.session_started();
        log::info!("Immersive session started");

        let events = self
            .runtime
            .emulated_mut()
            .map(|device| device.start_session())
            .unwrap_or_default();
        for (slot, event) in events {
            self.controller_connected(slot, &event);
        }
        self.sync_emulated_poses();
    }

    pub fn session_ended(&mut self) {
        if !self.session_active {
            return;
        }
        self.session_active = false;
        self.session_button.session_ended();
        log::info!("Immersive session ended");

        let events = self
            .runtime
            .emulated_mut()
            .map(|device| device.end_session())
            .unwrap_or_default();
        for (slot, event) in events {
            self.controller_disconnected(slot, &event);
        }
    }

    fn sync_emulated_poses(&mut self) {
        let Some(device) = self.runtime.emulated() else {
            return;
        };
        for hand in [Handedness::Left, Handedness::Right] {
            let Some(controller) = self.globals.controllers.get(hand) else {
                continue;
            };
            let pose = device.controller_pose(hand);
            let (ray, grip) = (controller.ray, controller.grip);
            for node in [ray, grip] {
                let t = &mut self.globals.scene.node_mut(node).transform;
                t.position = pose.position;
                t.rotation = pose.orientation;
            }
        }
    }

    /// A user gesture happened; lets gesture-gated audio start.
    pub fn resume_audio(&mut self) {
        self.setup.resume_audio(&mut self.globals);
    }

    /// Desktop orbit drag, ignored while in a session.
    pub fn orbit_drag(&mut self, dx: f32, dy: f32) {
        if !self.session_active {
            let camera = self.globals.camera;
            self.orbit.rotate(&mut self.globals.scene, camera, dx, dy);
        }
    }

    /// Desktop orbit zoom, ignored while in a session.
    pub fn orbit_zoom(&mut self, factor: f32) {
        if !self.session_active {
            let camera = self.globals.camera;
            self.orbit.dolly(&mut self.globals.scene, camera, factor);
        }
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Globals {
        &mut self.globals
    }

    pub fn scene_setup(&self) -> &S {
        &self.setup
    }

    pub fn scene_setup_mut(&mut self) -> &mut S {
        &mut self.setup
    }

    pub fn handles(&self) -> &SceneHandles {
        &self.handles
    }

    pub fn slots(&self) -> &[ControllerSlot; 2] {
        &self.slots
    }

    pub fn runtime(&self) -> &XrRuntime {
        &self.runtime
    }

    pub fn session_button(&self) -> &SessionButton {
        &self.session_button
    }

    /// True when the emulated device asks for its debug overlay.
    pub fn dev_ui_enabled(&self) -> bool {
        self.runtime.emulated().is_some_and(|device| device.dev_ui)
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn assets_in_flight(&self) -> usize {
        self.assets.in_flight()
    }
}
