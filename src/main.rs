//! Yoshi Land demo
//!
//! Runs the player around the bundled stages.
//! - Arrows / WASD: move, crouch, look up
//! - Space / Z: jump
//! - R: respawn
//! - Tab: next stage

use macroquad::prelude::*;
use yoshi_land::runtime::{Intent, StageRuntime};
use yoshi_land::stage::{load_stage_from_bytes, load_stage_from_str, Stage};
use yoshi_land::VERSION;

const STAGES_DIR: &str = "assets/stages";

/// Used when no stage file can be loaded
const BUILTIN_STAGE: &str = include_str!("../assets/stages/01-meadow.ron");

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Yoshi Land v{}", VERSION),
        window_width: 960,
        window_height: 540,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Stage file names from the manifest written by build.rs
async fn load_stage_list() -> Vec<String> {
    let manifest = match load_string(&format!("{}/manifest.txt", STAGES_DIR)).await {
        Ok(s) => s,
        Err(e) => {
            log::warn!("failed to load stage manifest: {}", e);
            return Vec::new();
        }
    };

    manifest
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(".ron"))
        .map(str::to_string)
        .collect()
}

async fn load_stage_file(name: &str) -> Option<Stage> {
    let path = format!("{}/{}", STAGES_DIR, name);
    let bytes = match load_file(&path).await {
        Ok(b) => b,
        Err(e) => {
            log::warn!("failed to read {}: {}", path, e);
            return None;
        }
    };
    match load_stage_from_bytes(&bytes) {
        Ok(stage) => {
            log::info!("loaded stage '{}' from {}", stage.name, path);
            Some(stage)
        }
        Err(e) => {
            log::warn!("failed to load {}: {}", path, e);
            None
        }
    }
}

/// Stage `index` from the list, falling back to the built-in stage
async fn open_stage(stages: &[String], index: usize) -> Option<StageRuntime> {
    let stage = match stages.get(index) {
        Some(name) => load_stage_file(name).await,
        None => None,
    };
    let stage = match stage {
        Some(stage) => stage,
        None => match load_stage_from_str(BUILTIN_STAGE) {
            Ok(stage) => stage,
            Err(e) => {
                log::error!("built-in stage is invalid: {}", e);
                return None;
            }
        },
    };
    match StageRuntime::new(stage) {
        Ok(runtime) => Some(runtime),
        Err(e) => {
            log::error!("failed to start stage: {}", e);
            None
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let stages = load_stage_list().await;
    let mut current = 0;
    let Some(mut runtime) = open_stage(&stages, current).await else {
        return;
    };

    loop {
        if is_key_pressed(KeyCode::Tab) && stages.len() > 1 {
            current = (current + 1) % stages.len();
            if let Some(next) = open_stage(&stages, current).await {
                runtime = next;
            }
        }

        if is_key_pressed(KeyCode::R) {
            if let Err(e) = runtime.respawn() {
                log::error!("respawn failed: {}", e);
            }
        }

        if let Err(e) = runtime.update(Intent::from_keyboard(), get_frame_time()) {
            log::error!("update failed: {}", e);
        }

        runtime.draw();
        draw_text(
            "arrows/WASD move  space jump  R respawn  tab next stage",
            8.0,
            screen_height() - 10.0,
            18.0,
            Color::from_rgba(255, 255, 255, 180),
        );

        next_frame().await;
    }
}
