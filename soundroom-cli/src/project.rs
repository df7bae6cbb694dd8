use std::path::{Path, PathBuf};

use anyhow::Context;
use soundroom_shared::SceneConfig;

pub const MANIFEST_FILE: &str = "soundroom.toml";
pub const RUNTIME_CRATE: &str = "soundroom-web";

/// The resolved project context.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory holding the manifest
    pub project_root: PathBuf,
    pub manifest_path: PathBuf,
    pub config: SceneConfig,
}

impl ProjectContext {
    /// Read and validate the manifest at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
        let config = SceneConfig::from_toml_str(&content).with_context(|| format!("Invalid manifest {}", path.display()))?;
        let project_root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            project_root,
            manifest_path: path.to_path_buf(),
            config,
        })
    }
}

/// Use the explicit manifest if given, otherwise search from the current directory.
pub fn resolve_project(manifest: Option<&Path>) -> anyhow::Result<ProjectContext> {
    match manifest {
        Some(path) => ProjectContext::load(path),
        None => ProjectContext::load(&find_manifest_from(&std::env::current_dir()?)?),
    }
}

/// Find soundroom.toml starting from a specific directory, walking up.
pub fn find_manifest_from(start: &Path) -> anyhow::Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            anyhow::bail!(
                "Could not find a {MANIFEST_FILE}.\n\
                 Pass a manifest path, or create one with: srcli init <dir>"
            );
        }
    }
}

/// Locate the runtime crate directory from inside the workspace, walking up.
pub fn find_runtime_crate_from(start: &Path) -> anyhow::Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.file_name().is_some_and(|name| name == RUNTIME_CRATE) && dir.join("Cargo.toml").is_file() {
            return Ok(dir);
        }
        let candidate = dir.join(RUNTIME_CRATE);
        if candidate.join("Cargo.toml").is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            anyhow::bail!("Could not find the {RUNTIME_CRATE} crate. Run `srcli build` from within the SoundRoom workspace.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_manifest_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join(MANIFEST_FILE);
        std::fs::write(&manifest, SceneConfig::single_speaker().to_toml_string().unwrap()).unwrap();
        let nested = dir.path().join("src/scenes");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_manifest_from(&nested).unwrap(), manifest);
        let ctx = resolve_project(Some(&manifest)).unwrap();
        assert_eq!(ctx.project_root, dir.path());
        assert_eq!(ctx.config.speakers.len(), 1);
    }

    #[test]
    fn test_find_manifest_none() {
        let dir = tempfile::tempdir().unwrap();
        // Create a nested dir so pop() hits the tempdir root, not filesystem root
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        // an ancestor of the tempdir could still hold a manifest; only check the message path
        if let Err(e) = find_manifest_from(&nested) {
            assert!(e.to_string().contains(MANIFEST_FILE));
        }
    }

    #[test]
    fn test_find_runtime_crate_from_workspace_member() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join(RUNTIME_CRATE);
        std::fs::create_dir_all(&runtime).unwrap();
        std::fs::write(runtime.join("Cargo.toml"), "[package]").unwrap();
        let cli = dir.path().join("soundroom-cli/src");
        std::fs::create_dir_all(&cli).unwrap();

        assert_eq!(find_runtime_crate_from(&cli).unwrap(), runtime);
        assert_eq!(find_runtime_crate_from(&runtime).unwrap(), runtime);
    }

    #[test]
    fn test_invalid_manifest_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join(MANIFEST_FILE);
        std::fs::write(&manifest, "[environment]\nurl = \"\"\nscale = 1.0\n").unwrap();
        let err = ProjectContext::load(&manifest).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid manifest"));
    }
}
