use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use soundroom_shared::SceneConfig;
use soundroom_web::init::{no_frame, FrameFn};
use soundroom_web::room::EnvironmentState;
use soundroom_web::{
    init, App, AssetEvent, AssetKind, AssetPayload, AssetRequest, AudioBuffer, HeadlessSurface,
    HostEnvironment, LoadError, ModelAsset, RoomScene,
};

use crate::project::ProjectContext;

/// Simulated frame interval in milliseconds (60 Hz).
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Decoding is the browser's job; files only need to exist.
const OPAQUE_AUDIO: AudioBuffer = AudioBuffer {
    duration: 0.0,
    sample_rate: 48000,
    channels: 2,
};

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub started_at: String,
    pub frames: u32,
    pub events_delivered: usize,
    pub environment: String,
    pub root_children: usize,
    pub modal: Option<String>,
    pub speakers: Vec<SpeakerReport>,
}

#[derive(Debug, Serialize)]
pub struct SpeakerReport {
    pub index: usize,
    pub stage: String,
    pub group_children: usize,
    pub gain: f32,
}

pub async fn run(ctx: ProjectContext, assets: PathBuf, frames: u32) -> anyhow::Result<()> {
    let assets = if assets.is_absolute() {
        assets
    } else {
        ctx.project_root.join(assets)
    };
    println!("Simulating {} for {frames} frames (assets: {})", ctx.manifest_path.display(), assets.display());

    let report = simulate(ctx.config, &assets, frames).await;
    print!("{}", toml::to_string_pretty(&report)?);
    Ok(())
}

/// Run the room headlessly, answering one pending asset request per frame.
pub async fn simulate(config: SceneConfig, assets: &Path, frames: u32) -> SimulationReport {
    let started_at = Local::now().to_rfc3339();
    let mut app: App<RoomScene, FrameFn> = init(
        HostEnvironment::default(),
        Box::new(HeadlessSurface::new(1280, 720)),
        RoomScene::new(config),
        no_frame as FrameFn,
    );

    let mut pending: VecDeque<AssetRequest> = VecDeque::new();
    let mut events_delivered = 0;
    for frame in 0..frames {
        pending.extend(app.take_requests());
        if let Some(request) = pending.pop_front() {
            let payload = resolve(assets, &request).await;
            app.deliver(AssetEvent::new(request.id, payload));
            events_delivered += 1;
        }
        app.frame(frame as f64 * FRAME_MS);
    }

    report(&app, started_at, frames, events_delivered)
}

/// Map an asset URL onto the local directory and load it.
pub async fn resolve(assets: &Path, request: &AssetRequest) -> AssetPayload {
    let path = assets.join(request.url.trim_start_matches('/'));
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} not found at {}", request.url, path.display());
            return AssetPayload::Failed(LoadError::NotFound(request.url.clone()));
        }
        Err(e) => return AssetPayload::Failed(LoadError::Network(e.to_string())),
    };
    log::debug!("Loaded {} ({} bytes)", request.url, bytes.len());

    match request.kind {
        AssetKind::Model => match ModelAsset::from_gltf_bytes(&bytes) {
            Ok(model) => AssetPayload::Model(model),
            Err(e) => AssetPayload::Failed(e),
        },
        AssetKind::Audio => AssetPayload::Audio(OPAQUE_AUDIO),
    }
}

fn report(app: &App<RoomScene, FrameFn>, started_at: String, frames: u32, events_delivered: usize) -> SimulationReport {
    let room = app.scene_setup();
    let scene = &app.globals().scene;

    let environment = match room.environment() {
        EnvironmentState::NotRequested => "not requested".to_string(),
        EnvironmentState::Loading(_) => "loading".to_string(),
        EnvironmentState::Loaded(_) => "loaded".to_string(),
        EnvironmentState::Failed(e) => format!("failed: {e}"),
    };

    let speakers = (0..room.speaker_count())
        .map(|index| SpeakerReport {
            index,
            stage: room
                .speaker_stage(index)
                .map(|s| format!("{s:?}"))
                .unwrap_or_default(),
            group_children: room.speaker_group(index).map_or(0, |g| scene.child_count(g)),
            gain: room.speaker_sound(index, scene).map_or(0.0, |s| s.gain),
        })
        .collect();

    SimulationReport {
        started_at,
        frames,
        events_delivered,
        environment,
        root_children: scene.child_count(scene.root()),
        modal: room.modal().map(|m| match m.error() {
            Some(error) => error.to_string(),
            None if m.is_visible() => format!("{:.0}%", m.progress_percent()),
            None => "hidden".to_string(),
        }),
        speakers,
    }
}
