use glam::Vec3;
use soundroom_shared::{AudioSettings, DistanceModel};

use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Decoded audio clip metadata. Sample data stays with the platform decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioBuffer {
    pub duration: f32,
    pub sample_rate: u32,
    pub channels: u16,
}

/// A positional audio emitter attached to a scene node.
///
/// Perceived loudness depends on the distance between this node and its
/// listener node, using WebAudio panner semantics.
#[derive(Debug, Clone)]
pub struct PositionalAudio {
    pub listener: NodeId,
    buffer: Option<AudioBuffer>,
    pub ref_distance: f32,
    pub rolloff_factor: f32,
    pub max_distance: f32,
    pub distance_model: DistanceModel,
    pub looping: bool,
    pub volume: f32,
    playing: bool,
    /// Effective gain from the last spatial update (volume * attenuation).
    pub gain: f32,
}

impl PositionalAudio {
    /// A new silent source with panner defaults.
    pub fn new(listener: NodeId) -> Self {
        Self {
            listener,
            buffer: None,
            ref_distance: 1.0,
            rolloff_factor: 1.0,
            max_distance: 10000.0,
            distance_model: DistanceModel::Inverse,
            looping: false,
            volume: 1.0,
            playing: false,
            gain: 0.0,
        }
    }

    pub fn set_buffer(&mut self, buffer: AudioBuffer) {
        self.buffer = Some(buffer);
    }

    pub fn buffer(&self) -> Option<&AudioBuffer> {
        self.buffer.as_ref()
    }

    /// Apply distance, rolloff, model, loop and volume in one go.
    pub fn apply(&mut self, settings: &AudioSettings) {
        self.ref_distance = settings.ref_distance;
        self.rolloff_factor = settings.rolloff_factor;
        self.max_distance = settings.max_distance;
        self.distance_model = settings.distance_model;
        self.looping = settings.looping;
        self.volume = settings.volume;
    }

    /// Start playback. Without a buffer there is nothing to play.
    pub fn play(&mut self) -> bool {
        if self.buffer.is_none() {
            log::warn!("PositionalAudio: play() called before a buffer was set");
            return false;
        }
        if self.playing {
            log::warn!("PositionalAudio: audio is already playing");
            return true;
        }
        self.playing = true;
        true
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.gain = 0.0;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Distance attenuation for this source's parameters.
    pub fn attenuation(&self, distance: f32) -> f32 {
        distance_gain(
            self.distance_model,
            distance,
            self.ref_distance,
            self.max_distance,
            self.rolloff_factor,
        )
    }
}

/// WebAudio `PannerNode` distance gain.
pub fn distance_gain(
    model: DistanceModel,
    distance: f32,
    ref_distance: f32,
    max_distance: f32,
    rolloff: f32,
) -> f32 {
    let distance = distance.max(0.0);
    match model {
        DistanceModel::Linear => {
            if max_distance <= ref_distance {
                return 1.0;
            }
            let d = distance.clamp(ref_distance, max_distance);
            1.0 - rolloff.clamp(0.0, 1.0) * (d - ref_distance) / (max_distance - ref_distance)
        }
        DistanceModel::Inverse => {
            let d = distance.max(ref_distance);
            let denom = ref_distance + rolloff * (d - ref_distance);
            if denom <= 0.0 {
                1.0
            } else {
                ref_distance / denom
            }
        }
        DistanceModel::Exponential => {
            if ref_distance <= 0.0 {
                return 1.0;
            }
            let d = distance.max(ref_distance);
            (d / ref_distance).powf(-rolloff)
        }
    }
}

/// Recompute every positional source's effective gain from world positions.
///
/// World transforms must be current. Sources whose listener node is not a
/// listener, or that are not playing, get zero gain.
pub fn update_spatial_gains(scene: &mut SceneGraph) {
    let sources: Vec<NodeId> = scene
        .ids()
        .filter(|id| matches!(scene.node(*id).kind, NodeKind::PositionalAudio(_)))
        .collect();

    for id in sources {
        let source_pos = scene.world_position(id);
        let Some(audio) = scene.positional_audio(id) else {
            continue;
        };
        let listener = audio.listener;
        let listener_ok = matches!(
            scene.get(listener).map(|n| &n.kind),
            Some(NodeKind::AudioListener)
        );
        let listener_pos = if listener_ok {
            scene.world_position(listener)
        } else {
            Vec3::ZERO
        };
        let audible = listener_ok && scene.is_attached(id);

        if let Some(audio) = scene.positional_audio_mut(id) {
            audio.gain = if audio.is_playing() && audible {
                audio.volume * audio.attenuation(source_pos.distance(listener_pos))
            } else {
                0.0
            };
        }
    }
}
