use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use locus_access::LocationAccessConfig;

pub fn default_config_path() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".locus")
        .join("config.toml"))
}

/// Loads the configuration from `--config` / `LOCUS_CONFIG`, else the default path.
pub fn load(path: Option<&Path>) -> Result<LocationAccessConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if !path.exists() {
        anyhow::bail!(
            "No configuration found at {}. Use --config or set LOCUS_CONFIG",
            path.display()
        );
    }
    LocationAccessConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
