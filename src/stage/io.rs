//! Stage I/O
//!
//! Reading accepts plain RON text or brotli-compressed RON.
//! Writing always compresses.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use macroquad::math::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{cell_from_char, cell_to_char, Stage, SPRING_SIZE};
use crate::physics::PhysicsConfig;

/// Limits checked on every load
pub mod limits {
    pub const MAX_STAGE_CELLS: usize = 1024;
    pub const MIN_TILE_SIZE: i32 = 1;
    pub const MAX_TILE_SIZE: i32 = 256;
    pub const MAX_NAME_LEN: usize = 256;
    pub const MAX_SPRINGS: usize = 256;
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// On-disk layout of a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StageFile {
    name: String,
    tile_size: i32,
    width: usize,
    height: usize,
    spawn: (f32, f32),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    physics: Option<PhysicsConfig>,
    rows: Vec<String>,
    /// Top-left corners (px)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    springs: Vec<(i32, i32)>,
}

impl StageFile {
    fn from_stage(stage: &Stage) -> Self {
        let rows = (0..stage.height())
            .map(|row| {
                (0..stage.width())
                    .map(|col| cell_to_char(stage.tile(col, row)))
                    .collect()
            })
            .collect();
        let spawn = stage.spawn();
        Self {
            name: stage.name.clone(),
            tile_size: stage.tile_size(),
            width: stage.width(),
            height: stage.height(),
            spawn: (spawn.x, spawn.y),
            physics: stage.physics().cloned(),
            rows,
            springs: stage.springs().iter().map(|r| (r.x, r.y)).collect(),
        }
    }

    fn into_stage(self) -> Result<Stage, StageError> {
        validate_header(&self)?;

        let mut stage = Stage::new(self.name, self.tile_size, self.width, self.height);
        for (row, line) in self.rows.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                let cell = cell_from_char(c).ok_or_else(|| {
                    StageError::Validation(format!(
                        "row {} col {}: unknown tile character '{}'",
                        row, col, c
                    ))
                })?;
                stage.set_tile(col, row, cell);
            }
        }
        for &(x, y) in &self.springs {
            stage.add_spring(x, y);
        }
        stage.set_spawn(Vec2::new(self.spawn.0, self.spawn.1));
        stage.set_physics(self.physics);
        Ok(stage)
    }
}

fn validate_header(file: &StageFile) -> Result<(), StageError> {
    use limits::*;

    let fail = |msg: String| Err(StageError::Validation(msg));

    if file.name.len() > MAX_NAME_LEN {
        return fail(format!("name too long ({} > {})", file.name.len(), MAX_NAME_LEN));
    }
    if !(MIN_TILE_SIZE..=MAX_TILE_SIZE).contains(&file.tile_size) {
        return fail(format!(
            "tile_size {} outside {}..={}",
            file.tile_size, MIN_TILE_SIZE, MAX_TILE_SIZE
        ));
    }
    if file.width == 0 || file.height == 0 {
        return fail(format!("empty stage ({}x{})", file.width, file.height));
    }
    if file.width > MAX_STAGE_CELLS || file.height > MAX_STAGE_CELLS {
        return fail(format!(
            "stage too large ({}x{}, max {})",
            file.width, file.height, MAX_STAGE_CELLS
        ));
    }
    if file.rows.len() != file.height {
        return fail(format!("expected {} rows, found {}", file.height, file.rows.len()));
    }
    for (row, line) in file.rows.iter().enumerate() {
        let len = line.chars().count();
        if len != file.width {
            return fail(format!("row {}: expected {} cells, found {}", row, file.width, len));
        }
    }

    let (sx, sy) = file.spawn;
    let pixel_w = (file.width as i32 * file.tile_size) as f32;
    let pixel_h = (file.height as i32 * file.tile_size) as f32;
    if !sx.is_finite() || !sy.is_finite() {
        return fail(format!("spawn ({}, {}) is not finite", sx, sy));
    }
    if sx < 0.0 || sy < 0.0 || sx >= pixel_w || sy >= pixel_h {
        return fail(format!(
            "spawn ({}, {}) outside {}x{} world",
            sx, sy, pixel_w, pixel_h
        ));
    }

    if file.springs.len() > MAX_SPRINGS {
        return fail(format!("too many springs ({} > {})", file.springs.len(), MAX_SPRINGS));
    }
    let (world_w, world_h) = (pixel_w as i32, pixel_h as i32);
    for &(x, y) in &file.springs {
        if x < 0 || y < 0 || x > world_w - SPRING_SIZE || y > world_h - SPRING_SIZE {
            return fail(format!("spring at ({}, {}) outside {}x{} world", x, y, world_w, world_h));
        }
    }

    if let Some(physics) = &file.physics {
        physics
            .validate()
            .map_err(|e| StageError::Validation(format!("physics: {}", e)))?;
    }
    Ok(())
}

/// Check a stage against the load limits
pub fn validate_stage(stage: &Stage) -> Result<(), StageError> {
    validate_header(&StageFile::from_stage(stage))
}

/// Decode raw file contents, brotli or plain RON
fn decode(bytes: &[u8]) -> Result<String, StageError> {
    // RON text starts with '(' or whitespace, brotli is binary
    let is_plain_ron = bytes
        .first()
        .map(|&b| b == b'(' || b.is_ascii_whitespace())
        .unwrap_or(false);

    let text = if is_plain_ron {
        bytes.to_vec()
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            )
        })?;
        decompressed
    };

    String::from_utf8(text).map_err(|e| {
        StageError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("invalid UTF-8: {}", e),
        ))
    })
}

/// Load a stage from RON text (embedded stages and tests)
pub fn load_stage_from_str(s: &str) -> Result<Stage, StageError> {
    let file: StageFile = ron::from_str(s)?;
    file.into_stage()
}

/// Load a stage from file contents, compressed or not
pub fn load_stage_from_bytes(bytes: &[u8]) -> Result<Stage, StageError> {
    load_stage_from_str(&decode(bytes)?)
}

pub fn load_stage<P: AsRef<Path>>(path: P) -> Result<Stage, StageError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let stage = load_stage_from_bytes(&bytes).map_err(|e| {
        log::warn!("failed to load stage {}: {}", path.display(), e);
        e
    })?;
    log::info!(
        "loaded stage '{}' ({}x{} tiles) from {}",
        stage.name,
        stage.width(),
        stage.height(),
        path.display()
    );
    Ok(stage)
}

/// Serialize to pretty RON text
pub fn stage_to_ron_string(stage: &Stage) -> Result<String, StageError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());
    Ok(ron::ser::to_string_pretty(&StageFile::from_stage(stage), config)?)
}

/// Save a stage as brotli-compressed RON
pub fn save_stage<P: AsRef<Path>>(stage: &Stage, path: P) -> Result<(), StageError> {
    validate_stage(stage)?;
    let ron_string = stage_to_ron_string(stage)?;

    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(ron_string.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("brotli compression failed: {}", e),
        )
    })?;

    fs::write(path, compressed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::TileType;

    const SMALL: &str = r##"(
        name: "small",
        tile_size: 8,
        width: 3,
        height: 2,
        spawn: (4.0, 0.0),
        physics: Some((gravity: 0.25)),
        rows: [
            "..=",
            "#~%",
        ],
    )"##;

    #[test]
    fn test_parse_legend_and_physics() {
        let stage = load_stage_from_str(SMALL).unwrap();
        assert_eq!(stage.tile(0, 0), None);
        assert_eq!(stage.tile(2, 0), Some(TileType::PLATFORM));
        assert_eq!(stage.tile(0, 1), Some(TileType::BLOCKING));
        assert_eq!(stage.tile(1, 1), Some(TileType::PENETRABLE));
        assert!(stage.tile(2, 1).unwrap().is_penetrable());

        let physics = stage.physics_config();
        assert_eq!(physics.gravity, 0.25);
        assert_eq!(physics.max_fall_speed, PhysicsConfig::default().max_fall_speed);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let bad = SMALL.replace("\"#~%\"", "\"#~\"");
        assert!(matches!(load_stage_from_str(&bad), Err(StageError::Validation(_))));

        let bad = SMALL.replace("\"#~%\"", "\"#x%\"");
        assert!(matches!(load_stage_from_str(&bad), Err(StageError::Validation(_))));
    }

    #[test]
    fn test_rejects_bad_header() {
        let bad = SMALL.replace("tile_size: 8", "tile_size: 0");
        assert!(matches!(load_stage_from_str(&bad), Err(StageError::Validation(_))));

        let bad = SMALL.replace("spawn: (4.0, 0.0)", "spawn: (40.0, 0.0)");
        assert!(matches!(load_stage_from_str(&bad), Err(StageError::Validation(_))));

        let bad = SMALL.replace("gravity: 0.25", "gravity: -1.0");
        assert!(matches!(load_stage_from_str(&bad), Err(StageError::Validation(_))));

        assert!(matches!(load_stage_from_str("(nonsense"), Err(StageError::Parse(_))));
    }

    #[test]
    fn test_save_compresses_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.ron");

        let stage = load_stage_from_str(SMALL).unwrap();
        save_stage(&stage, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_ne!(bytes.first(), Some(&b'('));

        let reloaded = load_stage(&path).unwrap();
        assert_eq!(reloaded.name, "small");
        assert_eq!(reloaded.spawn(), Vec2::new(4.0, 0.0));
        assert_eq!(reloaded.tiles().count(), stage.tiles().count());
        assert_eq!(reloaded.physics(), stage.physics());
    }

    #[test]
    fn test_loads_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.ron");
        fs::write(&path, SMALL).unwrap();

        let stage = load_stage(&path).unwrap();
        assert_eq!(stage.width(), 3);
        assert_eq!(stage.pixel_height(), 16);
    }

    #[test]
    fn test_springs_load_and_survive_save() {
        let src = SMALL.replace("physics:", "springs: [(0, 0)],\n        physics:");
        let stage = load_stage_from_str(&src).unwrap();
        assert_eq!(stage.springs(), &[crate::physics::Rect::new(0, 0, 16, 16)][..]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("springs.ron");
        save_stage(&stage, &path).unwrap();
        assert_eq!(load_stage(&path).unwrap().springs(), stage.springs());

        // 16px spring does not fit at x = 16 in a 24px wide world
        let bad = SMALL.replace("physics:", "springs: [(16, 0)],\n        physics:");
        assert!(matches!(load_stage_from_str(&bad), Err(StageError::Validation(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_stage(dir.path().join("nope.ron")),
            Err(StageError::Io(_))
        ));
    }
}
