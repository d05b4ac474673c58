//! Configuration module for catalog-scout
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Candidate settings file locations, in lookup order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("scout.yml"),
        PathBuf::from("config/scout.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("catalog-scout/scout.yml"));
    }
    paths
}

/// Load settings from `SCOUT_SETTINGS_PATH`, the default paths, or defaults
pub fn load() -> Result<Settings> {
    let explicit = std::env::var("SCOUT_SETTINGS_PATH").ok().map(PathBuf::from);

    let found = explicit
        .into_iter()
        .chain(default_paths())
        .find(|p| p.exists());

    let mut settings = match found {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    Ok(settings)
}
