use std::path::{Path, PathBuf};

use anyhow::Context;
use soundroom_shared::SceneConfig;

use crate::project::MANIFEST_FILE;

pub fn run(dir: PathBuf, preset: String) -> anyhow::Result<()> {
    let path = write_manifest(&dir, &preset)?;
    println!("Created {} from the '{preset}' preset.", path.display());
    println!("Place the referenced models and audio under {}/public, then run: srcli check", dir.display());
    Ok(())
}

/// Write a preset manifest into `dir`, refusing to overwrite an existing one.
pub fn write_manifest(dir: &Path, preset: &str) -> anyhow::Result<PathBuf> {
    let config = SceneConfig::preset(preset)
        .with_context(|| format!("Unknown preset: {preset}. Options: single, two, labelled, modal"))?;

    let path = dir.join(MANIFEST_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;
    std::fs::write(&path, config.to_toml_string()?)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}
