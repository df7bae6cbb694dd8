use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlProgressElement};

use soundroom_shared::SceneConfig;

use crate::assets::{AssetEvent, AssetPayload, LoadError, ModelAsset, RequestId};
use crate::audio::AudioBuffer;
use crate::controllers::{ControllerEvent, Handedness};
use crate::gamepad::{ButtonSnapshot, GamepadSnapshot};
use crate::init::{init, no_frame, App, FrameFn, HostEnvironment};
use crate::renderer::{count_emissive, count_visible, EnvironmentMap, RenderSurface};
use crate::room::RoomScene;
use crate::scene::{NodeId, SceneGraph};
use crate::session::{ButtonElement, ButtonHost, SessionRequest};

const MODAL_ID: &str = "loading-modal";
const PROGRESS_ID: &str = "loading-progress";
const MESSAGE_ID: &str = "loading-message";

/// Render surface backed by the page canvas. Drawing itself is done by the
/// host's WebGL renderer from the exported scene state.
struct CanvasSurface {
    canvas: HtmlCanvasElement,
    width: u32,
    height: u32,
    pixel_ratio: f32,
    xr_enabled: bool,
    frames: u64,
}

impl CanvasSurface {
    fn new(canvas: HtmlCanvasElement) -> Self {
        let (width, height) = (canvas.client_width().max(1) as u32, canvas.client_height().max(1) as u32);
        Self {
            canvas,
            width,
            height,
            pixel_ratio: 1.0,
            xr_enabled: false,
            frames: 0,
        }
    }

    fn sync_drawing_buffer(&self) {
        self.canvas.set_width((self.width as f32 * self.pixel_ratio).floor() as u32);
        self.canvas.set_height((self.height as f32 * self.pixel_ratio).floor() as u32);
    }
}

impl RenderSurface for CanvasSurface {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 {
            self.pixel_ratio = ratio;
            self.sync_drawing_buffer();
        }
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.sync_drawing_buffer();
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

    fn render(&mut self, scene: &SceneGraph, _camera: NodeId) {
        self.frames += 1;
        log::trace!("frame {} ({} visible nodes)", self.frames, count_visible(scene));
    }

    fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .ok_or("No window")?
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))
}

impl ButtonElement for Element {
    fn set_label(&self, label: &str) {
        self.set_text_content(Some(label));
    }
}

impl ButtonHost for Document {
    type Element = Element;

    fn find(&self, id: &str) -> Option<Element> {
        self.get_element_by_id(id)
    }

    fn append_button(&self, id: &str) -> Result<Element, String> {
        let body = self.body().ok_or("Document has no body")?;
        let button = self.create_element("button").map_err(|e| format!("{e:?}"))?;
        button.set_id(id);
        body.append_child(&button).map_err(|e| format!("{e:?}"))?;
        Ok(button)
    }
}

fn controller_event(raw: &str) -> ControllerEvent {
    ControllerEvent {
        handedness: raw.to_string(),
        gamepad: GamepadSnapshot::default(),
    }
}

/// The running SoundRoom page, driven from JavaScript.
#[wasm_bindgen]
pub struct WebApp {
    app: App<RoomScene, FrameFn>,
    document: Document,
}

/// Build the experience on `canvas_id` from a TOML scene manifest.
///
/// An empty manifest selects the default two-speaker scene. The session
/// button is appended to the page as `#vr-button` if the page lacks one;
/// the host forwards its clicks to [`WebApp::click_session_button`].
#[wasm_bindgen]
pub fn create_app(canvas_id: &str, manifest: &str, native_xr_supported: bool) -> Result<WebApp, JsValue> {
    let document = document()?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or("Canvas not found")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| "Element is not a canvas")?;

    let config = if manifest.trim().is_empty() {
        SceneConfig::two_speakers()
    } else {
        SceneConfig::from_toml_str(manifest).map_err(|e| JsValue::from_str(&format!("Invalid manifest: {e}")))?
    };

    let window = web_sys::window().ok_or("No window")?;
    let host = HostEnvironment {
        width: window.inner_width()?.as_f64().unwrap_or(1280.0) as u32,
        height: window.inner_height()?.as_f64().unwrap_or(720.0) as u32,
        pixel_ratio: window.device_pixel_ratio() as f32,
        native_xr_supported,
        allow_emulation: true,
    };

    let surface = CanvasSurface::new(canvas);
    let app = init(host, Box::new(surface), RoomScene::new(config), no_frame as FrameFn);
    let web = WebApp { app, document };
    web.sync_dom();
    Ok(web)
}

#[wasm_bindgen]
impl WebApp {
    /// One animation-loop tick. `timestamp` is the rAF time in milliseconds.
    pub fn frame(&mut self, timestamp: f64) {
        self.app.frame(timestamp);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.app.resize(width, height);
    }

    /// Pending loads as `[id, kind, url]` triples.
    pub fn take_requests(&mut self) -> js_sys::Array {
        self.app
            .take_requests()
            .into_iter()
            .map(|request| {
                let entry = js_sys::Array::new();
                entry.push(&JsValue::from_f64(request.id.0 as f64));
                entry.push(&JsValue::from_str(request.kind.label()));
                entry.push(&JsValue::from_str(&request.url));
                JsValue::from(entry)
            })
            .collect()
    }

    pub fn load_progress(&mut self, id: u64, loaded: u64, total: Option<u64>) {
        self.deliver(id, AssetPayload::Progress { loaded, total });
    }

    /// A binary glTF has been fetched.
    pub fn model_loaded(&mut self, id: u64, bytes: &[u8]) {
        let payload = match ModelAsset::from_gltf_bytes(bytes) {
            Ok(model) => AssetPayload::Model(model),
            Err(e) => AssetPayload::Failed(e),
        };
        self.deliver(id, payload);
    }

    /// An audio file has been decoded by the page's audio context.
    pub fn audio_loaded(&mut self, id: u64, duration: f32, sample_rate: u32, channels: u16) {
        let buffer = AudioBuffer {
            duration,
            sample_rate,
            channels,
        };
        self.deliver(id, AssetPayload::Audio(buffer));
    }

    /// `status` is the HTTP status, or 0 when the request never got a response.
    pub fn load_failed(&mut self, id: u64, url: String, status: u16, message: String) {
        let error = match status {
            0 => LoadError::Network(message),
            404 => LoadError::NotFound(url),
            status => LoadError::Http { status, url },
        };
        self.deliver(id, AssetPayload::Failed(error));
    }

    pub fn controller_connected(&mut self, slot: usize, handedness: &str) {
        self.app.controller_connected(slot, &controller_event(handedness));
    }

    pub fn controller_disconnected(&mut self, slot: usize, handedness: &str) {
        self.app.controller_disconnected(slot, &controller_event(handedness));
    }

    /// Latest gamepad state: pressed flags and values per button, then axes.
    pub fn set_gamepad(&mut self, handedness: &str, pressed: Vec<u8>, values: Vec<f32>, axes: Vec<f32>) {
        let Ok(hand) = handedness.parse::<Handedness>() else {
            return;
        };
        let buttons = pressed
            .iter()
            .zip(values.iter().chain(std::iter::repeat(&0.0)))
            .map(|(&p, &value)| ButtonSnapshot {
                pressed: p != 0,
                touched: p != 0 || value > 0.0,
                value,
            })
            .collect();
        self.app.set_gamepad(hand, GamepadSnapshot { buttons, axes });
    }

    /// Returns "start" or "end" when the host must drive a native session,
    /// undefined when nothing is left to do (including emulated sessions).
    pub fn click_session_button(&mut self) -> Option<String> {
        let request = self.app.click_session_button();
        self.sync_dom();
        request.map(|r| match r {
            SessionRequest::Start => "start".to_string(),
            SessionRequest::End => "end".to_string(),
        })
    }

    /// Whether the host should show the emulated device's debug overlay.
    pub fn dev_ui_enabled(&self) -> bool {
        self.app.dev_ui_enabled()
    }

    pub fn session_started(&mut self) {
        self.app.session_started();
        self.sync_dom();
    }

    pub fn session_ended(&mut self) {
        self.app.session_ended();
        self.sync_dom();
    }

    pub fn resume_audio(&mut self) {
        self.app.resume_audio();
    }

    pub fn orbit_drag(&mut self, dx: f32, dy: f32) {
        self.app.orbit_drag(dx, dy);
    }

    pub fn orbit_zoom(&mut self, factor: f32) {
        self.app.orbit_zoom(factor);
    }

    pub fn close_modal(&mut self) {
        self.app.scene_setup_mut().close_modal();
        self.sync_dom();
    }

    pub fn speaker_count(&self) -> usize {
        self.app.scene_setup().speaker_count()
    }

    /// Current effective gain of a speaker's source, 0 if it is not playing.
    pub fn speaker_gain(&self, index: usize) -> f32 {
        self.app
            .scene_setup()
            .speaker_sound(index, &self.app.globals().scene)
            .map_or(0.0, |sound| sound.gain)
    }

    fn deliver(&mut self, id: u64, payload: AssetPayload) {
        self.app.deliver(AssetEvent::new(RequestId(id), payload));
        self.sync_dom();
    }

    fn sync_dom(&self) {
        if let Err(e) = self.app.session_button().mount(&self.document) {
            log::warn!("Failed to show the session button: {e}");
        }

        let Some(modal) = self.app.scene_setup().modal() else {
            return;
        };
        if let Some(element) = self.document.get_element_by_id(MODAL_ID) {
            let result = if modal.is_visible() {
                element.remove_attribute("hidden")
            } else {
                element.set_attribute("hidden", "")
            };
            if let Err(e) = result {
                log::warn!("Failed to toggle loading modal: {e:?}");
            }
        }
        if let Some(progress) = self
            .document
            .get_element_by_id(PROGRESS_ID)
            .and_then(|e| e.dyn_into::<HtmlProgressElement>().ok())
        {
            progress.set_value(modal.progress_percent() as f64);
        }
        if let (Some(message), Some(error)) = (self.document.get_element_by_id(MESSAGE_ID), modal.error()) {
            message.set_text_content(Some(error));
        }
    }
}
