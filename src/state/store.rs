//! Armed alarm persistence.
//!
//! One JSON file holds the target time and the silent flag. It is written when an alarm
//! is armed and removed when the alarm is cancelled or has fired. Writes go through a
//! temporary file and a rename so a crash never leaves half a record behind.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::get_state_dir;
use crate::common::constants::ALARM_STATE_FILE;
use crate::config::get_custom_config_dir;

/// The part of an alarm worth keeping across launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAlarm {
    pub target_time: DateTime<Local>,
    #[serde(default)]
    pub silent: bool,
}

impl PersistedAlarm {
    /// A saved alarm is only worth restoring while its target is still ahead.
    pub fn is_stale(&self, now: DateTime<Local>) -> bool {
        self.target_time <= now
    }
}

/// File-backed store for the single armed alarm.
#[derive(Debug, Clone)]
pub struct AlarmStore {
    path: PathBuf,
}

impl AlarmStore {
    /// Store rooted in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(ALARM_STATE_FILE),
        }
    }

    /// Store in the state directory for the active config directory.
    pub fn open_default() -> Result<Self> {
        let config_dir = get_custom_config_dir();
        let dir = get_state_dir(config_dir.as_deref())?;
        Ok(Self::in_dir(&dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, alarm: &PersistedAlarm) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(alarm).context("Failed to serialize alarm")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write alarm state to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move alarm state to {}", self.path.display()))?;

        #[cfg(debug_assertions)]
        eprintln!("DEBUG: AlarmStore::save() - {}", self.path.display());

        Ok(())
    }

    /// Read the saved alarm. A missing file is `None`; an unreadable one is discarded.
    pub fn load(&self) -> Result<Option<PersistedAlarm>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        match serde_json::from_str::<PersistedAlarm>(&content) {
            Ok(alarm) => Ok(Some(alarm)),
            Err(e) => {
                log_warning!("Discarding unreadable alarm state: {e}");
                let _ = fs::remove_file(&self.path);
                Ok(None)
            }
        }
    }

    /// Remove the saved alarm. Succeeds when there is nothing to remove.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}
