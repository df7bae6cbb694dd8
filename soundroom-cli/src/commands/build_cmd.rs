use crate::project;

pub async fn run() -> anyhow::Result<()> {
    let wasm_pack = which::which("wasm-pack").map_err(|_| {
        anyhow::anyhow!("wasm-pack not found on PATH. Install it with: cargo install wasm-pack")
    })?;
    let cwd = project::find_runtime_crate_from(&std::env::current_dir()?)?;

    println!("Building WebAssembly runtime in {}...", cwd.display());
    log::debug!("Using {}", wasm_pack.display());

    let status = tokio::process::Command::new(&wasm_pack)
        .args(build_args())
        .current_dir(&cwd)
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .await?;

    if !status.success() {
        anyhow::bail!("wasm-pack exited with {status}");
    }
    println!("Output written to {}", cwd.join("pkg").display());
    Ok(())
}

fn build_args() -> [&'static str; 4] {
    ["build", "--target", "web", "--release"]
}
