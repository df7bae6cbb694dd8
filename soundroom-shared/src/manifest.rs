use serde::{Deserialize, Serialize};

/// Errors raised while reading or validating a scene manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid manifest: {0}")]
    Invalid(String),
}

/// How distance attenuates a positional audio source (WebAudio panner models).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceModel {
    Linear,
    #[default]
    Inverse,
    Exponential,
}

/// When a configured speaker starts playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoplayPolicy {
    /// Start as soon as both the model and the audio buffer are available.
    #[default]
    OnLoad,
    /// Wait for an explicit user gesture (`resume_audio`) before starting.
    AfterUserGesture,
}

/// Text anchor alignment, horizontal or vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Left,
    #[default]
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

/// Positional audio parameters applied once a speaker's buffer is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default = "default_ref_distance")]
    pub ref_distance: f32,
    #[serde(default = "default_rolloff")]
    pub rolloff_factor: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default)]
    pub distance_model: DistanceModel,
    #[serde(default = "default_true")]
    pub looping: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            ref_distance: default_ref_distance(),
            rolloff_factor: default_rolloff(),
            max_distance: default_max_distance(),
            distance_model: DistanceModel::Inverse,
            looping: true,
            volume: default_volume(),
        }
    }
}

/// The static room model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub url: String,
    #[serde(default = "default_unit_scale")]
    pub scale: f32,
}

/// One speaker: where it stands, what it looks like, what it plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerConfig {
    pub position: [f32; 3],
    #[serde(default)]
    pub look_at: Option<[f32; 3]>,
    #[serde(default = "default_speaker_model")]
    pub model_url: String,
    #[serde(default = "default_speaker_scale")]
    pub model_scale: f32,
    pub audio_url: String,
    #[serde(default)]
    pub audio: AudioSettings,
}

/// A floating text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub text: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_label_color")]
    pub color: u32,
    #[serde(default)]
    pub anchor_x: Anchor,
    #[serde(default = "default_anchor_y")]
    pub anchor_y: Anchor,
    pub position: [f32; 3],
}

/// Selects which room scene to build.
///
/// Every scene loads one environment model; the rest (speaker count,
/// label, loading modal, autoplay) varies per manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub speakers: Vec<SpeakerConfig>,
    #[serde(default)]
    pub label: Option<LabelConfig>,
    #[serde(default)]
    pub loading_modal: bool,
    #[serde(default)]
    pub autoplay: AutoplayPolicy,
}

fn default_ref_distance() -> f32 {
    0.3
}
fn default_rolloff() -> f32 {
    1.0
}
fn default_max_distance() -> f32 {
    10000.0
}
fn default_volume() -> f32 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_unit_scale() -> f32 {
    1.0
}
fn default_speaker_model() -> String {
    "/models/speaker.glb".to_string()
}
fn default_speaker_scale() -> f32 {
    0.25
}
fn default_font() -> String {
    "assets/SpaceMono-Bold.ttf".to_string()
}
fn default_font_size() -> f32 {
    0.352
}
fn default_label_color() -> u32 {
    0xffa276
}
fn default_anchor_y() -> Anchor {
    Anchor::Middle
}

pub const ROOM_MODEL_URL: &str = "/models/stylised_room.glb";

impl SceneConfig {
    /// The room with a single looping speaker on the left wall.
    pub fn single_speaker() -> Self {
        Self {
            environment: EnvironmentConfig {
                url: ROOM_MODEL_URL.to_string(),
                scale: 1.0,
            },
            speakers: vec![SpeakerConfig {
                position: [-8.0, 1.8, 1.2],
                look_at: None,
                model_url: default_speaker_model(),
                model_scale: default_speaker_scale(),
                audio_url: "/audio1.ogg".to_string(),
                audio: AudioSettings::default(),
            }],
            label: None,
            loading_modal: false,
            autoplay: AutoplayPolicy::OnLoad,
        }
    }

    /// Two speakers on opposite sides of the room, each facing the centre.
    pub fn two_speakers() -> Self {
        let centre = [0.0, 1.6, 0.0];
        let mut config = Self::single_speaker();
        config.speakers = vec![
            SpeakerConfig {
                position: [-8.0, 1.8, 1.2],
                look_at: Some(centre),
                model_url: default_speaker_model(),
                model_scale: default_speaker_scale(),
                audio_url: "/audio1.ogg".to_string(),
                audio: AudioSettings::default(),
            },
            SpeakerConfig {
                position: [6.0, 1.8, -3.0],
                look_at: Some(centre),
                model_url: default_speaker_model(),
                model_scale: default_speaker_scale(),
                audio_url: "/audio2.ogg".to_string(),
                audio: AudioSettings::default(),
            },
        ];
        config
    }

    /// Single speaker plus a floating instruction label.
    pub fn labelled() -> Self {
        let mut config = Self::single_speaker();
        config.label = Some(LabelConfig {
            text: "Follow the sound".to_string(),
            font: default_font(),
            font_size: default_font_size(),
            color: default_label_color(),
            anchor_x: Anchor::Center,
            anchor_y: Anchor::Middle,
            position: [0.0, 0.67, -1.44],
        });
        config
    }

    /// Single speaker with the loading modal wired to the room load.
    pub fn with_loading_modal() -> Self {
        let mut config = Self::single_speaker();
        config.loading_modal = true;
        config
    }

    /// Look up a preset by its short name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "single" => Some(Self::single_speaker()),
            "two" => Some(Self::two_speakers()),
            "labelled" | "label" => Some(Self::labelled()),
            "modal" => Some(Self::with_loading_modal()),
            _ => None,
        }
    }

    /// Parse and validate a TOML manifest.
    pub fn from_toml_str(s: &str) -> Result<Self, ManifestError> {
        let config: SceneConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject manifests the runtime could never satisfy.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.environment.url.trim().is_empty() {
            return Err(ManifestError::Invalid("environment url is empty".into()));
        }
        check_scale("environment scale", self.environment.scale)?;

        for (i, speaker) in self.speakers.iter().enumerate() {
            if speaker.model_url.trim().is_empty() {
                return Err(ManifestError::Invalid(format!("speaker {i}: model_url is empty")));
            }
            if speaker.audio_url.trim().is_empty() {
                return Err(ManifestError::Invalid(format!("speaker {i}: audio_url is empty")));
            }
            check_scale(&format!("speaker {i} model_scale"), speaker.model_scale)?;
            if let Some(target) = speaker.look_at {
                if target == speaker.position {
                    return Err(ManifestError::Invalid(format!(
                        "speaker {i}: look_at target equals its position"
                    )));
                }
            }

            let audio = &speaker.audio;
            if !(audio.ref_distance >= 0.0) || !(audio.rolloff_factor >= 0.0) {
                return Err(ManifestError::Invalid(format!(
                    "speaker {i}: ref_distance and rolloff_factor must be non-negative"
                )));
            }
            if !(audio.volume >= 0.0) {
                return Err(ManifestError::Invalid(format!("speaker {i}: volume must be non-negative")));
            }
            if audio.distance_model == DistanceModel::Linear && audio.max_distance <= audio.ref_distance {
                return Err(ManifestError::Invalid(format!(
                    "speaker {i}: linear model needs max_distance > ref_distance"
                )));
            }
        }

        if let Some(label) = &self.label {
            if !(label.font_size > 0.0) {
                return Err(ManifestError::Invalid("label font_size must be positive".into()));
            }
        }

        Ok(())
    }
}

fn check_scale(what: &str, scale: f32) -> Result<(), ManifestError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ManifestError::Invalid(format!("{what} must be a positive number, got {scale}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for name in ["single", "two", "labelled", "modal"] {
            let config = SceneConfig::preset(name).unwrap();
            config.validate().unwrap();
        }
        assert!(SceneConfig::preset("nope").is_none());
    }

    #[test]
    fn test_minimal_manifest_uses_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
            [environment]
            url = "/models/stylised_room.glb"

            [[speakers]]
            position = [-8.0, 1.8, 1.2]
            audio_url = "/audio1.ogg"
            "#,
        )
        .unwrap();

        assert_eq!(config.environment.scale, 1.0);
        assert_eq!(config.speakers.len(), 1);
        let speaker = &config.speakers[0];
        assert_eq!(speaker.model_url, "/models/speaker.glb");
        assert_eq!(speaker.model_scale, 0.25);
        assert_eq!(speaker.audio.ref_distance, 0.3);
        assert_eq!(speaker.audio.rolloff_factor, 1.0);
        assert_eq!(speaker.audio.distance_model, DistanceModel::Inverse);
        assert!(speaker.audio.looping);
        assert_eq!(config.autoplay, AutoplayPolicy::OnLoad);
        assert!(!config.loading_modal);
        assert!(config.label.is_none());
    }

    #[test]
    fn test_manifest_roundtrips_through_toml() {
        let config = SceneConfig::labelled();
        let text = config.to_toml_string().unwrap();
        let parsed = SceneConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_autoplay_policy_parses_snake_case() {
        let config = SceneConfig::from_toml_str(
            r#"
            autoplay = "after_user_gesture"
            [environment]
            url = "room.glb"
            "#,
        )
        .unwrap();
        assert_eq!(config.autoplay, AutoplayPolicy::AfterUserGesture);
        assert!(config.speakers.is_empty());
    }

    #[test]
    fn test_empty_audio_url_rejected() {
        let mut config = SceneConfig::single_speaker();
        config.speakers[0].audio_url = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("audio_url"), "{err}");
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let mut config = SceneConfig::single_speaker();
        config.speakers[0].model_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = SceneConfig::single_speaker();
        config.environment.scale = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_look_at_own_position_rejected() {
        let mut config = SceneConfig::single_speaker();
        config.speakers[0].look_at = Some(config.speakers[0].position);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_linear_model_needs_range() {
        let mut config = SceneConfig::single_speaker();
        config.speakers[0].audio.distance_model = DistanceModel::Linear;
        config.speakers[0].audio.max_distance = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = SceneConfig::from_toml_str("environment = 3").unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }
}
