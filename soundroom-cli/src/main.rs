mod cli;
mod commands;
mod project;

use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { manifest } => {
            let ctx = project::resolve_project(manifest.as_deref())?;
            commands::check_cmd::run(ctx)
        }
        Command::Init { dir, preset } => commands::init_cmd::run(dir, preset),
        Command::Simulate {
            manifest,
            assets,
            frames,
        } => {
            let ctx = project::resolve_project(manifest.as_deref())?;
            commands::simulate_cmd::run(ctx, assets, frames).await
        }
        Command::Build => commands::build_cmd::run().await,
    }
}
