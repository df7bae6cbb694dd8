use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "srcli",
    about = "SoundRoom scene tools",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a scene manifest and print a summary
    Check {
        /// Manifest path (defaults to the nearest soundroom.toml)
        manifest: Option<PathBuf>,
    },
    /// Write a new soundroom.toml from a preset
    Init {
        /// Directory to create the manifest in
        dir: PathBuf,
        /// Scene preset: single, two, labelled or modal
        #[arg(long, default_value = "two")]
        preset: String,
    },
    /// Run a scene headlessly against local asset files
    Simulate {
        /// Manifest path (defaults to the nearest soundroom.toml)
        manifest: Option<PathBuf>,
        /// Directory asset URLs are resolved against
        #[arg(long, default_value = "public")]
        assets: PathBuf,
        /// Number of frames to run
        #[arg(long, default_value_t = 120)]
        frames: u32,
    },
    /// Build the WebAssembly runtime with wasm-pack
    Build,
}
