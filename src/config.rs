//! Configuration loading and defaults.
//!
//! Configuration is a small TOML file; every field has a default so a missing
//! file or a partial file both work.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the SQLite file backing the durable cache tier.
    pub db_path: PathBuf,
    /// Width of one filmstrip cell in pixels.
    pub cell_width: u32,
    /// Height of one filmstrip cell in pixels.
    pub cell_height: u32,
    /// Gap between adjacent filmstrip cells in pixels.
    pub frame_gap: u32,
    /// Number of frames sampled for video and animated sources.
    pub frames_per_strip: usize,
    /// Maximum number of simultaneously active generation tasks.
    pub concurrency_limit: usize,
    /// Capacity of the in-memory cache tier, in entries.
    pub memory_capacity: usize,
    /// JPEG quality for normal preview output (0-100).
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./previews.db"),
            cell_width: 80,
            cell_height: 48,
            frame_gap: 2,
            frames_per_strip: 5,
            concurrency_limit: 10,
            memory_capacity: 500,
            jpeg_quality: 80,
        }
    }
}

/// Load configuration from a specific TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}

/// Load configuration from the given path, or from the first default
/// location that exists, or fall back to defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./mediastrip.toml", "~/.config/mediastrip/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}
