pub mod config;
pub mod info;
pub mod render;
pub mod replay;
pub mod synth;

use std::path::PathBuf;

use airsketch_common::config::AppConfig;

/// Resolve a sketch path, falling back to the configured sketches directory
/// for relative paths that do not exist here.
pub fn resolve_sketch(path: PathBuf) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path;
    }
    let candidate = AppConfig::load().sketches_dir.join(&path);
    if candidate.exists() {
        candidate
    } else {
        path
    }
}
