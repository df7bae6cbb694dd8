use soundroom_shared::SceneConfig;

use crate::assets::{AssetEvent, AssetKind, AssetPayload, AssetQueue, LoadError, ModelAsset, RequestId};
use crate::audio::PositionalAudio;
use crate::init::{Globals, SceneHandles, SceneSetup};
use crate::label;
use crate::loading_modal::LoadingModal;
use crate::scene::{NodeId, NodeKind, SceneGraph};
use crate::speaker::{Speaker, SpeakerStage};

/// Where the room model is in its (single) load.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentState {
    NotRequested,
    Loading(RequestId),
    Loaded(NodeId),
    Failed(LoadError),
}

/// The configurable room scene: environment model, speakers, optional label
/// and loading modal, all selected by a [`SceneConfig`].
///
/// All state lives on the instance; nothing is shared between scenes.
#[derive(Debug)]
pub struct RoomScene {
    config: SceneConfig,
    environment: EnvironmentState,
    listener: Option<NodeId>,
    speakers: Vec<Speaker>,
    label: Option<NodeId>,
    modal: Option<LoadingModal>,
    audio_unlocked: bool,
}

impl RoomScene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            environment: EnvironmentState::NotRequested,
            listener: None,
            speakers: Vec::new(),
            label: None,
            modal: None,
            audio_unlocked: false,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn environment(&self) -> &EnvironmentState {
        &self.environment
    }

    pub fn listener(&self) -> Option<NodeId> {
        self.listener
    }

    pub fn speaker_count(&self) -> usize {
        self.speakers.len()
    }

    pub fn speaker_group(&self, index: usize) -> Option<NodeId> {
        self.speakers.get(index).map(Speaker::group)
    }

    pub fn speaker_stage(&self, index: usize) -> Option<SpeakerStage> {
        self.speakers.get(index).map(Speaker::stage)
    }

    /// The speaker's audio source as it currently is; `None` until its model loads.
    pub fn speaker_sound<'a>(&self, index: usize, scene: &'a SceneGraph) -> Option<&'a PositionalAudio> {
        let id = self.speakers.get(index)?.sound()?;
        scene.positional_audio(id)
    }

    pub fn label(&self) -> Option<NodeId> {
        self.label
    }

    pub fn modal(&self) -> Option<&LoadingModal> {
        self.modal.as_ref()
    }

    /// The modal's close button.
    pub fn close_modal(&mut self) {
        if let Some(modal) = &mut self.modal {
            modal.close();
        }
    }

    fn on_environment_event(&mut self, payload: AssetPayload, scene: &mut SceneGraph) {
        match payload {
            AssetPayload::Progress { loaded, total } => {
                if let Some(modal) = &mut self.modal {
                    modal.on_progress(loaded, total);
                }
            }
            AssetPayload::Model(model) => self.place_environment(&model, scene),
            AssetPayload::Failed(error) => {
                log::warn!("Failed to load {}: {error}", self.config.environment.url);
                if let Some(modal) = &mut self.modal {
                    modal.on_error();
                }
                self.environment = EnvironmentState::Failed(error);
            }
            AssetPayload::Audio(_) => {
                log::warn!("Environment request answered with audio; ignoring");
            }
        }
    }

    fn place_environment(&mut self, model: &ModelAsset, scene: &mut SceneGraph) {
        let node = scene.instantiate(model);
        scene.set_uniform_scale(node, self.config.environment.scale);
        let root = scene.root();
        scene.add(root, node);
        self.environment = EnvironmentState::Loaded(node);
        if let Some(modal) = &mut self.modal {
            modal.on_complete();
        }
        log::info!("Environment {} loaded", self.config.environment.url);
    }
}

impl SceneSetup for RoomScene {
    fn setup(&mut self, globals: &mut Globals, assets: &mut AssetQueue) -> SceneHandles {
        let scene = &mut globals.scene;

        let env_request = assets.request(AssetKind::Model, self.config.environment.url.clone());
        self.environment = EnvironmentState::Loading(env_request);
        if self.config.loading_modal {
            let mut modal = LoadingModal::new();
            modal.show();
            self.modal = Some(modal);
        }

        let listener = scene.spawn("audio_listener", NodeKind::AudioListener);
        scene.add(globals.camera, listener);
        self.listener = Some(listener);

        self.speakers = self
            .config
            .speakers
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, config)| {
                let mut speaker = Speaker::new(i, config, scene);
                speaker.request_assets(assets);
                speaker
            })
            .collect();

        self.label = self.config.label.as_ref().map(|config| label::add_label(scene, config));

        SceneHandles {
            speaker_groups: self.speakers.iter().map(Speaker::group).collect(),
            label: self.label,
        }
    }

    fn asset_event(&mut self, event: AssetEvent, globals: &mut Globals) {
        let scene = &mut globals.scene;

        if self.environment == EnvironmentState::Loading(event.id) {
            self.on_environment_event(event.payload, scene);
            return;
        }

        let Some(listener) = self.listener else {
            return;
        };
        let autoplay = self.config.autoplay;
        let unlocked = self.audio_unlocked;
        let Some(speaker) = self.speakers.iter_mut().find(|s| s.owns(event.id)) else {
            log::debug!("Unclaimed asset event #{}", event.id.0);
            return;
        };

        match event.payload {
            AssetPayload::Progress { .. } => {}
            AssetPayload::Model(model) => speaker.on_model(&model, scene, listener, autoplay, unlocked),
            AssetPayload::Audio(buffer) => speaker.on_audio(buffer, scene, autoplay, unlocked),
            AssetPayload::Failed(error) => speaker.on_failed(event.id, error),
        }
    }

    fn resume_audio(&mut self, globals: &mut Globals) {
        self.audio_unlocked = true;
        for speaker in &mut self.speakers {
            speaker.resume(&mut globals.scene);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetRequest, MeshInfo, ModelNode};
    use crate::audio::AudioBuffer;
    use crate::init::{init, no_frame, App, FrameFn, HostEnvironment};
    use crate::renderer::HeadlessSurface;
    use soundroom_shared::{AutoplayPolicy, DistanceModel};

    type RoomApp = App<RoomScene, FrameFn>;

    const BUFFER: AudioBuffer = AudioBuffer {
        duration: 30.0,
        sample_rate: 48000,
        channels: 2,
    };

    fn start(config: SceneConfig) -> (RoomApp, Vec<AssetRequest>) {
        let mut app: RoomApp = init(
            HostEnvironment::default(),
            Box::new(HeadlessSurface::new(1280, 720)),
            RoomScene::new(config),
            no_frame as FrameFn,
        );
        let requests = app.take_requests();
        (app, requests)
    }

    fn room_model() -> ModelAsset {
        ModelAsset {
            root: ModelNode::group("Room")
                .with_child(ModelNode::mesh("Floor", MeshInfo::default()))
                .with_child(ModelNode::mesh("Walls", MeshInfo::default())),
        }
    }

    fn speaker_model() -> ModelAsset {
        ModelAsset {
            root: ModelNode::group("Scene").with_child(ModelNode::mesh("Speaker", MeshInfo::default())),
        }
    }

    fn find(requests: &[AssetRequest], url: &str) -> RequestId {
        requests.iter().find(|r| r.url == url).map(|r| r.id).unwrap()
    }

    fn root_children(app: &RoomApp) -> usize {
        let scene = &app.globals().scene;
        scene.child_count(scene.root())
    }

    #[test]
    fn test_setup_returns_before_loads_and_accessors_are_empty() {
        let (app, requests) = start(SceneConfig::single_speaker());
        let room = app.scene_setup();
        let scene = &app.globals().scene;

        assert_eq!(requests.len(), 3);
        assert_eq!(app.handles().speaker_groups.len(), 1);
        assert!(scene.is_attached(app.handles().speaker_groups[0]));
        assert!(room.speaker_sound(0, scene).is_none());
        assert!(room.speaker_sound(5, scene).is_none());
        assert_eq!(room.speaker_stage(0), Some(SpeakerStage::Unloaded));
        assert!(matches!(room.environment(), EnvironmentState::Loading(_)));

        let listener = room.listener().unwrap();
        assert_eq!(scene.node(listener).parent(), Some(app.globals().camera));
    }

    #[test]
    fn test_frames_render_with_nothing_loaded() {
        let (mut app, _) = start(SceneConfig::two_speakers());
        for i in 0..5 {
            app.frame(i as f64 * 16.0);
        }
        assert_eq!(app.globals().renderer.frames_rendered(), 5);
    }

    #[test]
    fn test_environment_adds_exactly_one_root_node() {
        let (mut app, requests) = start(SceneConfig::single_speaker());
        let before = root_children(&app);
        let env = find(&requests, "/models/stylised_room.glb");
        app.deliver(AssetEvent::new(env, AssetPayload::Model(room_model())));

        assert_eq!(root_children(&app), before + 1);
        let EnvironmentState::Loaded(node) = *app.scene_setup().environment() else {
            panic!("environment not loaded");
        };
        let scene = &app.globals().scene;
        assert_eq!(scene.node(node).parent(), Some(scene.root()));
        assert_eq!(scene.node(node).transform.scale, glam::Vec3::ONE);
    }

    #[test]
    fn test_environment_failure_leaves_scene_and_shows_error() {
        let (mut app, requests) = start(SceneConfig::with_loading_modal());
        assert!(app.scene_setup().modal().unwrap().is_visible());
        let before = root_children(&app);
        let env = find(&requests, "/models/stylised_room.glb");

        app.deliver(AssetEvent::new(env, AssetPayload::Progress { loaded: 512, total: Some(1024) }));
        assert_eq!(app.scene_setup().modal().unwrap().progress_percent(), 50.0);

        app.deliver(AssetEvent::new(
            env,
            AssetPayload::Failed(LoadError::Http {
                status: 404,
                url: "/models/stylised_room.glb".into(),
            }),
        ));
        assert_eq!(root_children(&app), before);
        let modal = app.scene_setup().modal().unwrap();
        assert!(modal.is_visible());
        assert!(modal.error().is_some());
        assert!(matches!(app.scene_setup().environment(), EnvironmentState::Failed(_)));
    }

    #[test]
    fn test_modal_hides_on_environment_load() {
        let (mut app, requests) = start(SceneConfig::with_loading_modal());
        let env = find(&requests, "/models/stylised_room.glb");
        app.deliver(AssetEvent::new(env, AssetPayload::Model(room_model())));
        assert!(!app.scene_setup().modal().unwrap().is_visible());
    }

    #[test]
    fn test_audio_first_then_visual_is_configured() {
        let (mut app, requests) = start(SceneConfig::single_speaker());
        app.deliver(AssetEvent::new(find(&requests, "/audio1.ogg"), AssetPayload::Audio(BUFFER)));
        assert!(app.scene_setup().speaker_sound(0, &app.globals().scene).is_none());
        app.frame(0.0);

        app.deliver(AssetEvent::new(
            find(&requests, "/models/speaker.glb"),
            AssetPayload::Model(speaker_model()),
        ));
        let sound = app.scene_setup().speaker_sound(0, &app.globals().scene).unwrap();
        assert_eq!(sound.ref_distance, 0.3);
        assert_eq!(sound.rolloff_factor, 1.0);
        assert_eq!(sound.distance_model, DistanceModel::Inverse);
        assert!(sound.looping);
        assert!(sound.is_playing());
        assert_eq!(app.scene_setup().speaker_stage(0), Some(SpeakerStage::Playing));
    }

    #[test]
    fn test_two_speakers_fail_independently() {
        let (mut app, requests) = start(SceneConfig::two_speakers());
        // both speakers share the model URL; requests are issued per speaker in order
        let models: Vec<RequestId> = requests
            .iter()
            .filter(|r| r.kind == AssetKind::Model && r.url == "/models/speaker.glb")
            .map(|r| r.id)
            .collect();
        assert_eq!(models.len(), 2);

        app.deliver(AssetEvent::new(models[0], AssetPayload::Failed(LoadError::Network("reset".into()))));
        app.deliver(AssetEvent::new(models[1], AssetPayload::Model(speaker_model())));
        app.deliver(AssetEvent::new(find(&requests, "/audio2.ogg"), AssetPayload::Audio(BUFFER)));
        app.deliver(AssetEvent::new(find(&requests, "/audio1.ogg"), AssetPayload::Audio(BUFFER)));

        let room = app.scene_setup();
        assert_eq!(room.speaker_stage(0), Some(SpeakerStage::Failed));
        assert_eq!(room.speaker_stage(1), Some(SpeakerStage::Playing));
        let scene = &app.globals().scene;
        assert_eq!(scene.child_count(room.speaker_group(0).unwrap()), 0);
        assert_eq!(scene.child_count(room.speaker_group(1).unwrap()), 1);
    }

    #[test]
    fn test_two_speakers_face_the_centre() {
        let (app, _) = start(SceneConfig::two_speakers());
        let scene = &app.globals().scene;
        for i in 0..2 {
            let group = app.scene_setup().speaker_group(i).unwrap();
            let t = scene.node(group).transform;
            let forward = t.rotation * glam::Vec3::Z;
            let expected = (glam::Vec3::new(0.0, 1.6, 0.0) - t.position).normalize();
            assert!((forward - expected).length() < 1e-4);
        }
    }

    #[test]
    fn test_label_added_with_config() {
        let (app, _) = start(SceneConfig::labelled());
        let label = app.handles().label.unwrap();
        let scene = &app.globals().scene;
        assert_eq!(scene.node(label).parent(), Some(scene.root()));
        match &scene.node(label).kind {
            NodeKind::TextLabel(text) => {
                assert_eq!(text.text, "Follow the sound");
                assert_eq!(text.color, 0xffa276);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_gesture_gated_audio_starts_on_resume() {
        let mut config = SceneConfig::single_speaker();
        config.autoplay = AutoplayPolicy::AfterUserGesture;
        let (mut app, requests) = start(config);
        app.deliver(AssetEvent::new(
            find(&requests, "/models/speaker.glb"),
            AssetPayload::Model(speaker_model()),
        ));
        app.deliver(AssetEvent::new(find(&requests, "/audio1.ogg"), AssetPayload::Audio(BUFFER)));
        assert_eq!(app.scene_setup().speaker_stage(0), Some(SpeakerStage::Configured));

        app.resume_audio();
        assert_eq!(app.scene_setup().speaker_stage(0), Some(SpeakerStage::Playing));
    }

    #[test]
    fn test_resume_before_load_lets_audio_autostart() {
        let mut config = SceneConfig::single_speaker();
        config.autoplay = AutoplayPolicy::AfterUserGesture;
        let (mut app, requests) = start(config);
        app.resume_audio();
        app.deliver(AssetEvent::new(find(&requests, "/audio1.ogg"), AssetPayload::Audio(BUFFER)));
        app.deliver(AssetEvent::new(
            find(&requests, "/models/speaker.glb"),
            AssetPayload::Model(speaker_model()),
        ));
        assert_eq!(app.scene_setup().speaker_stage(0), Some(SpeakerStage::Playing));
    }

    #[test]
    fn test_playing_speaker_is_audible_after_frame() {
        let (mut app, requests) = start(SceneConfig::single_speaker());
        app.deliver(AssetEvent::new(
            find(&requests, "/models/speaker.glb"),
            AssetPayload::Model(speaker_model()),
        ));
        app.deliver(AssetEvent::new(find(&requests, "/audio1.ogg"), AssetPayload::Audio(BUFFER)));
        app.frame(0.0);

        let sound = app.scene_setup().speaker_sound(0, &app.globals().scene).unwrap();
        assert!(sound.gain > 0.0 && sound.gain < 1.0, "gain={}", sound.gain);
    }
}
