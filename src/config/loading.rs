//! Locating, creating and reading the configuration file.
//!
//! The directory comes from `--config DIR` when given, else `$XDG_CONFIG_HOME`, else the
//! platform config directory. A missing file at the resolved location is created from the
//! commented template; a missing file passed to [`load_from_path`] is an error.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// `--config DIR` for this process. Written once by `main` before anything loads.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Record the `--config` directory. Fails on a second call.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Config directory was already chosen for this run"))
}

/// The `--config` directory, or `None` for the default location.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().cloned().flatten()
}

/// Resolve the config path, writing the default file there first if needed.
pub fn load() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        super::builder::create_default_config(&path)?;
    }

    load_from_path(&path)
}

/// Read, parse and validate `path`.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let shown = private_path(path);

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("No config file at {shown}")
        }
        Err(e) => return Err(e).with_context(|| format!("Could not read {shown}")),
    };

    let config: Config =
        toml::from_str(&content).with_context(|| format!("{shown} is not valid TOML"))?;
    validate_config(&config).with_context(|| format!("Invalid setting in {shown}"))?;

    #[cfg(debug_assertions)]
    eprintln!("DEBUG: load_from_path() - loaded {shown}");

    Ok(config)
}

/// Full path of the config file for this run.
pub fn get_config_path() -> Result<PathBuf> {
    let dir = match get_custom_config_dir() {
        Some(custom) => custom,
        None => std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .context("No config directory: set XDG_CONFIG_HOME or pass --config")?
            .join(APP_DIR_NAME),
    };
    Ok(dir.join(CONFIG_FILE_NAME))
}
