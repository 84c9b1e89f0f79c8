use std::path::{Path, PathBuf};

use stegage_core::StegageConfig;

use crate::errors::CliError;

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

/// Load the configuration.
///
/// An explicit path must exist. A missing file at the default location means
/// defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<StegageConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::not_found(
                    format!("Config file not found: {}", path.display()),
                    "Hint: Check --config or STEGAGE_CONFIG.",
                )
                .into());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(StegageConfig::default());
            }
            path
        }
    };

    let config = read_config(&path)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn read_config(path: &Path) -> anyhow::Result<StegageConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: StegageConfig = toml::from_str(&contents).map_err(|e| {
        CliError::invalid_input(format!("Failed to parse config {}: {}", path.display(), e))
    })?;
    config
        .validate()
        .map_err(|e| CliError::invalid_input(format!("{} ({})", e, path.display())))?;
    Ok(config)
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("stegage"));
        }
    }
    Ok(home_dir()?.join(".config").join("stegage"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
