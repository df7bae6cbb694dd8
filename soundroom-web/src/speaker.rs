use glam::Vec3;
use soundroom_shared::{AutoplayPolicy, SpeakerConfig};

use crate::assets::{AssetKind, AssetQueue, LoadError, ModelAsset, RequestId};
use crate::audio::{AudioBuffer, PositionalAudio};
use crate::scene::{NodeId, NodeKind, SceneGraph};
use crate::transform;

/// Load progress of one speaker.
///
/// ```text
/// Unloaded ──model──▶ VisualReady ──audio──▶ Configured ──play──▶ Playing
///     │                                          ▲
///     └──audio──▶ AudioReady ──────model─────────┘
/// ```
///
/// `Failed` is terminal and only entered when the visual cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerStage {
    /// Group is in the scene; model and audio requests are in flight.
    Unloaded,
    /// Model attached and audio source created; no buffer yet.
    VisualReady,
    /// Buffer arrived first and is held until the model exists.
    AudioReady,
    /// Buffer set and settings applied; waiting for autoplay permission.
    Configured,
    Playing,
    Failed,
}

/// One speaker: a positioned group holding a model whose first child emits sound.
#[derive(Debug)]
pub struct Speaker {
    pub index: usize,
    config: SpeakerConfig,
    group: NodeId,
    model_request: Option<RequestId>,
    audio_request: Option<RequestId>,
    model: Option<NodeId>,
    mesh: Option<NodeId>,
    sound: Option<NodeId>,
    held_buffer: Option<AudioBuffer>,
    audio_error: Option<LoadError>,
    stage: SpeakerStage,
}

impl Speaker {
    /// Create the group at its configured pose and add it to the scene right away.
    pub fn new(index: usize, config: SpeakerConfig, scene: &mut SceneGraph) -> Self {
        let group = scene.spawn(format!("speaker{index}"), NodeKind::Group);
        scene.set_position(group, Vec3::from_array(config.position));
        let root = scene.root();
        scene.add(root, group);
        if let Some(target) = config.look_at {
            transform::look_at(scene, group, Vec3::from_array(target));
        }

        Self {
            index,
            config,
            group,
            model_request: None,
            audio_request: None,
            model: None,
            mesh: None,
            sound: None,
            held_buffer: None,
            audio_error: None,
            stage: SpeakerStage::Unloaded,
        }
    }

    /// Queue the model and audio fetches. They complete independently.
    pub fn request_assets(&mut self, assets: &mut AssetQueue) {
        self.model_request = Some(assets.request(AssetKind::Model, self.config.model_url.clone()));
        self.audio_request = Some(assets.request(AssetKind::Audio, self.config.audio_url.clone()));
    }

    pub fn owns(&self, id: RequestId) -> bool {
        self.model_request == Some(id) || self.audio_request == Some(id)
    }

    pub fn is_model_request(&self, id: RequestId) -> bool {
        self.model_request == Some(id)
    }

    pub fn group(&self) -> NodeId {
        self.group
    }

    pub fn stage(&self) -> SpeakerStage {
        self.stage
    }

    /// The audio source node, once the model has loaded.
    pub fn sound(&self) -> Option<NodeId> {
        self.sound
    }

    pub fn mesh(&self) -> Option<NodeId> {
        self.mesh
    }

    pub fn audio_error(&self) -> Option<&LoadError> {
        self.audio_error.as_ref()
    }

    /// Model arrived: scale it, bind a source to its first child, attach to the group.
    pub fn on_model(
        &mut self,
        model: &ModelAsset,
        scene: &mut SceneGraph,
        listener: NodeId,
        autoplay: AutoplayPolicy,
        unlocked: bool,
    ) {
        if !matches!(self.stage, SpeakerStage::Unloaded | SpeakerStage::AudioReady) {
            log::warn!("Speaker {}: ignoring duplicate model load", self.index);
            return;
        }

        if model.root.children.is_empty() {
            log::warn!("Speaker {}: model {} has no children", self.index, self.config.model_url);
            self.held_buffer = None;
            self.stage = SpeakerStage::Failed;
            return;
        }

        let root = scene.instantiate(model);
        scene.set_uniform_scale(root, self.config.model_scale);
        let Some(&mesh) = scene.children(root).first() else {
            return;
        };

        let sound = scene.spawn(
            format!("speaker{}.sound", self.index),
            NodeKind::PositionalAudio(PositionalAudio::new(listener)),
        );
        scene.add(mesh, sound);
        scene.add(self.group, root);

        self.model = Some(root);
        self.mesh = Some(mesh);
        self.sound = Some(sound);

        match self.held_buffer.take() {
            Some(buffer) => self.configure(buffer, scene, autoplay, unlocked),
            None => self.stage = SpeakerStage::VisualReady,
        }
        log::info!("Speaker {} model ready ({:?})", self.index, self.stage);
    }

    /// Audio arrived: configure now if the source exists, otherwise hold it.
    pub fn on_audio(
        &mut self,
        buffer: AudioBuffer,
        scene: &mut SceneGraph,
        autoplay: AutoplayPolicy,
        unlocked: bool,
    ) {
        match self.stage {
            SpeakerStage::Unloaded => {
                self.held_buffer = Some(buffer);
                self.stage = SpeakerStage::AudioReady;
            }
            SpeakerStage::VisualReady => self.configure(buffer, scene, autoplay, unlocked),
            SpeakerStage::Failed => {
                log::debug!("Speaker {}: audio loaded after visual failure", self.index);
            }
            _ => log::warn!("Speaker {}: ignoring duplicate audio load", self.index),
        }
    }

    pub fn on_failed(&mut self, id: RequestId, error: LoadError) {
        if self.is_model_request(id) {
            log::warn!("Speaker {}: model failed: {error}", self.index);
            self.held_buffer = None;
            self.stage = SpeakerStage::Failed;
        } else {
            log::warn!("Speaker {}: audio failed: {error}", self.index);
            self.audio_error = Some(error);
        }
    }

    /// Start a configured speaker after the user has unlocked audio.
    pub fn resume(&mut self, scene: &mut SceneGraph) {
        if self.stage == SpeakerStage::Configured {
            self.start(scene);
        }
    }

    fn configure(
        &mut self,
        buffer: AudioBuffer,
        scene: &mut SceneGraph,
        autoplay: AutoplayPolicy,
        unlocked: bool,
    ) {
        let Some(audio) = self.sound.and_then(|id| scene.positional_audio_mut(id)) else {
            return;
        };
        audio.set_buffer(buffer);
        audio.apply(&self.config.audio);
        self.stage = SpeakerStage::Configured;

        if autoplay == AutoplayPolicy::OnLoad || unlocked {
            self.start(scene);
        }
    }

    fn start(&mut self, scene: &mut SceneGraph) {
        if let Some(audio) = self.sound.and_then(|id| scene.positional_audio_mut(id)) {
            if audio.play() {
                self.stage = SpeakerStage::Playing;
                log::info!("Speaker {} playing {}", self.index, self.config.audio_url);
            }
        }
    }
}
