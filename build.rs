//! Build script to generate the stage manifest for WASM builds
//!
//! Scans assets/stages/ and writes manifest.txt listing every stage file,
//! since WASM can't enumerate directories at runtime.

use std::fs;
use std::io::Write;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=assets/stages");

    let stages_dir = Path::new("assets/stages");
    let manifest_path = stages_dir.join("manifest.txt");

    if !stages_dir.exists() {
        return;
    }

    let mut stages: Vec<_> = fs::read_dir(stages_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext.to_ascii_lowercase() == "ron")
                .unwrap_or(false)
        })
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();

    stages.sort();

    let mut manifest = String::new();
    for stage in stages {
        manifest.push_str(&stage);
        manifest.push('\n');
    }

    // Only rewrite on change so the rerun trigger doesn't loop
    if fs::read_to_string(&manifest_path).ok().as_deref() == Some(manifest.as_str()) {
        return;
    }
    let mut file = fs::File::create(&manifest_path).unwrap();
    file.write_all(manifest.as_bytes()).unwrap();
}
