//! Build automation tasks for Yoshi Land
//!
//! Usage:
//!   cargo xtask check-stages          # Validate every stage in assets/stages
//!   cargo xtask build-web             # Build WASM for web deployment
//!   cargo xtask package-native        # Build a native release with assets

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;
use yoshi_land::stage::{load_stage, save_stage};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for Yoshi Land")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate stage files (defaults to assets/stages/*.ron)
    CheckStages {
        paths: Vec<PathBuf>,
    },
    /// Build WASM for web deployment, with brotli-packed stages
    BuildWeb {
        /// Mark as dev build (adds DEV to the page title)
        #[arg(long)]
        dev: bool,
    },
    /// Build a native release for the host platform
    PackageNative,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckStages { paths } => check_stages(paths),
        Commands::BuildWeb { dev } => build_web(dev),
        Commands::PackageNative => package_native(),
    }
}

/// Get the project root directory
fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

/// Run a command and check for success
fn run_cmd(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().context("Failed to execute command")?;
    if !status.success() {
        anyhow::bail!("Command failed with status: {}", status);
    }
    Ok(())
}

/// Download a file from URL to destination
fn download_file(url: &str, dest: &Path) -> Result<()> {
    println!("Downloading {}...", url);
    run_cmd(
        Command::new("curl")
            .args(["-L", "-o"])
            .arg(dest)
            .arg(url),
    )
}

/// Stage files under assets/stages, sorted
fn stage_files(root: &Path) -> Result<Vec<PathBuf>> {
    let dir = root.join("assets/stages");
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().map(|ext| ext == "ron").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy assets, re-saving stages compressed and skipping the rest of assets/stages
fn copy_assets(root: &Path, dst: &Path) -> Result<()> {
    let stages_dst = dst.join("stages");
    std::fs::create_dir_all(&stages_dst)?;

    for path in stage_files(root)? {
        let stage = load_stage(&path).with_context(|| format!("loading {}", path.display()))?;
        let name = path.file_name().context("stage path has no file name")?;
        save_stage(&stage, stages_dst.join(name))
            .with_context(|| format!("packing {}", path.display()))?;
    }
    std::fs::copy(
        root.join("assets/stages/manifest.txt"),
        stages_dst.join("manifest.txt"),
    )
    .context("stage manifest missing (run a cargo build first)")?;
    Ok(())
}

fn check_stages(paths: Vec<PathBuf>) -> Result<()> {
    let paths = if paths.is_empty() {
        stage_files(&project_root()?)?
    } else {
        paths
    };

    let mut failed = 0;
    for path in &paths {
        match load_stage(path) {
            Ok(stage) => println!(
                "ok    {} '{}' {}x{} tiles @ {}px{}",
                path.display(),
                stage.name,
                stage.width(),
                stage.height(),
                stage.tile_size(),
                if stage.physics().is_some() { " (custom physics)" } else { "" },
            ),
            Err(e) => {
                println!("FAIL  {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} stages failed validation", failed, paths.len());
    }
    println!("{} stages ok", paths.len());
    Ok(())
}

/// Build WASM for web deployment
fn build_web(dev: bool) -> Result<()> {
    let root = project_root()?;
    let dist = root.join("dist/web");

    check_stages(Vec::new())?;

    println!("Building WASM...");
    run_cmd(
        Command::new("cargo")
            .current_dir(&root)
            .args(["build", "--release", "--target", "wasm32-unknown-unknown", "--bin", "yoshi-land"]),
    )?;

    // Clean and create dist folder
    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    println!("Copying files to dist/web...");
    std::fs::copy(
        root.join("target/wasm32-unknown-unknown/release/yoshi-land.wasm"),
        dist.join("yoshi-land.wasm"),
    )?;
    std::fs::copy(root.join("web/index.html"), dist.join("index.html"))?;

    // Download macroquad JS bundle
    let mq_js = dist.join("mq_js_bundle.js");
    if !mq_js.exists() {
        download_file(
            "https://raw.githubusercontent.com/not-fl3/macroquad/v0.4.14/js/mq_js_bundle.js",
            &mq_js,
        )?;
    }

    copy_assets(&root, &dist.join("assets"))?;

    if dev {
        println!("Applying DEV build modifications...");
        let index_path = dist.join("index.html");
        let index = std::fs::read_to_string(&index_path)?;
        let index = index.replace("<title>Yoshi Land", "<title>[DEV] Yoshi Land");
        std::fs::write(&index_path, index)?;
    }

    println!("Web build complete: dist/web/");
    Ok(())
}

/// Native release for the host platform
fn package_native() -> Result<()> {
    let root = project_root()?;
    let platform = if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    };
    let dist = root.join(format!("dist/native/{}", platform));

    println!("Building native release for {}...", platform);

    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    run_cmd(
        Command::new("cargo")
            .current_dir(&root)
            .args(["build", "--release", "--bin", "yoshi-land"]),
    )?;

    let binary_name = if platform == "windows" { "yoshi-land.exe" } else { "yoshi-land" };
    std::fs::copy(
        root.join(format!("target/release/{}", binary_name)),
        dist.join(binary_name),
    )?;

    copy_assets(&root, &dist.join("assets"))?;

    println!("Native build complete: dist/native/{}/", platform);
    Ok(())
}
