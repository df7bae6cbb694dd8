//! SoundRoom WebXR runtime
//!
//! Builds the shared scene (camera, player rig, controller slots, room
//! lighting), runs a swappable scene setup once, and drives the per-frame
//! loop. Speakers load their model and audio independently and start
//! playing spatialised audio once both are in.

pub mod assets;
pub mod audio;
pub mod camera;
pub mod controllers;
pub mod environment;
pub mod gamepad;
pub mod init;
pub mod label;
pub mod loading_modal;
pub mod renderer;
pub mod room;
pub mod scene;
pub mod session;
pub mod speaker;
pub mod transform;
pub mod xr;

#[cfg(target_arch = "wasm32")]
mod web;

pub use assets::{AssetEvent, AssetKind, AssetPayload, AssetQueue, AssetRequest, LoadError, ModelAsset, RequestId};
pub use audio::{AudioBuffer, PositionalAudio};
pub use controllers::{ControllerEvent, Handedness};
pub use init::{init, init_default, App, Globals, HostEnvironment, SceneHandles, SceneSetup};
pub use renderer::{HeadlessSurface, RenderSurface};
pub use room::RoomScene;
pub use scene::{NodeId, NodeKind, SceneGraph};
pub use speaker::SpeakerStage;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // a second init (hot reload) keeps the existing logger
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("SoundRoom runtime initialized");
}
