//! Persistent state, following XDG Base Directory standards.
//!
//! The armed alarm is kept under `XDG_STATE_HOME` so it survives a restart, separate
//! from configuration. Each config directory gets its own namespace so two setups
//! started with different `--config` values never share an alarm.

pub mod store;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::common::constants::APP_DIR_NAME;

pub use store::{AlarmStore, PersistedAlarm};

/// Directory holding the saved alarm for the given `--config` directory.
///
/// Lives at `$XDG_STATE_HOME/sunrise-alarm/<namespace>`: `default` for the standard
/// config location, `custom_<first 16 hex of sha256(path)>` for anything else.
pub fn get_state_dir(config_dir: Option<&Path>) -> Result<PathBuf> {
    let state_home = std::env::var_os("XDG_STATE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::state_dir)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .context("No state directory: set XDG_STATE_HOME")?;

    let namespace = match config_dir {
        Some(dir) if !is_default_config_dir(dir) => custom_namespace(dir),
        _ => "default".to_string(),
    };

    Ok(state_home.join(APP_DIR_NAME).join(namespace))
}

fn is_default_config_dir(dir: &Path) -> bool {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .is_some_and(|base| base.join(APP_DIR_NAME) == dir)
}

fn custom_namespace(dir: &Path) -> String {
    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let digest = sha256::digest(resolved.to_string_lossy().as_bytes());
    format!("custom_{}", &digest[..16])
}
