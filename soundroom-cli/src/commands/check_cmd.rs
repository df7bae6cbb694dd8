use std::fmt::Write;

use soundroom_shared::SceneConfig;

use crate::project::ProjectContext;

pub fn run(ctx: ProjectContext) -> anyhow::Result<()> {
    println!("{} is valid.", ctx.manifest_path.display());
    print!("{}", summarize(&ctx.config));
    Ok(())
}

/// Human-readable overview of what a scene will load.
pub fn summarize(config: &SceneConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Environment: {} (scale {})", config.environment.url, config.environment.scale);
    let _ = writeln!(out, "Speakers:    {}", config.speakers.len());
    for (i, speaker) in config.speakers.iter().enumerate() {
        let [x, y, z] = speaker.position;
        let _ = writeln!(
            out,
            "  [{i}] {} @ ({x}, {y}, {z}) model {} x{}, {:?} ref {} rolloff {}{}",
            speaker.audio_url,
            speaker.model_url,
            speaker.model_scale,
            speaker.audio.distance_model,
            speaker.audio.ref_distance,
            speaker.audio.rolloff_factor,
            if speaker.audio.looping { ", looping" } else { "" },
        );
    }
    if let Some(label) = &config.label {
        let _ = writeln!(out, "Label:       \"{}\"", label.text);
    }
    let _ = writeln!(out, "Loading modal: {}", if config.loading_modal { "yes" } else { "no" });
    let _ = writeln!(out, "Autoplay:    {:?}", config.autoplay);
    out
}
