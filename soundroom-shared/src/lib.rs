//! Types shared between the SoundRoom runtime and the `srcli` tool.
//!
//! `manifest` describes which scene variant to build (speakers, label,
//! loading modal, autoplay); `math` holds the small amount of transform
//! math both sides need.

pub mod manifest;
pub mod math;

pub use manifest::{
    Anchor, AudioSettings, AutoplayPolicy, DistanceModel, EnvironmentConfig, LabelConfig,
    ManifestError, SceneConfig, SpeakerConfig,
};
