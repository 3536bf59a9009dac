//! Configuration system for the sunrise alarm.
//!
//! Settings live in `sunrise-alarm.toml` under `$XDG_CONFIG_HOME/sunrise-alarm/` (or the
//! directory given with `--config`). Every field is optional; absent fields fall back to
//! the defaults in `common::constants`. A commented default file is written on first load.
//!
//! ```toml
//! #[Backend]
//! backend = "auto"             # "auto", "backlight" or "terminal"
//!
//! #[Sunrise]
//! sunrise_window = 600         # Seconds of brightness ramp before the alarm (60-3600)
//! sunrise_tick = 5             # Seconds between sunrise updates (1-60)
//!
//! #[Inactivity]
//! inactivity_timeout = 30      # Idle seconds before the screen dims (5-600)
//! inactivity_tick = 1          # Seconds between inactivity checks (1-60)
//! dim_brightness = 0.01        # Brightness while dimmed (0.0-0.5)
//! brightness_epsilon = 0.01    # Smallest brightness change worth writing (0.0-0.1)
//!
//! #[Volume]
//! volume_start = 0.10          # Volume when the alarm starts (0.0-1.0)
//! volume_step = 0.05           # Volume added per interval (0.0-1.0)
//! volume_interval = 10         # Seconds per volume step (1-120)
//! volume_ramp_cap = 180        # Seconds after which the ramp stops (10-1800)
//! volume_stepped = false       # Step in whole intervals instead of continuously
//! volume_tick = 10             # Seconds between volume updates (1-60)
//!
//! #[Alarm]
//! silent = false               # Skip audio, keep the sunrise
//! max_days_ahead = 7           # Reject alarms further out than this (1-7)
//! background_grant_seconds = 30
//! ```

pub mod builder;
pub mod loading;
pub mod validation;

#[cfg(test)]
mod tests;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::common::constants::*;

// Re-export public API
pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Backend selection for brightness and audio output.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Use the sysfs backlight when one is writable, otherwise the terminal.
    Auto,
    /// Linux sysfs backlight (`/sys/class/backlight`).
    Backlight,
    /// Log-only output, used for simulation and hosts without a backlight.
    Terminal,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Auto => "auto",
            Backend::Backlight => "backlight",
            Backend::Terminal => "terminal",
        }
    }
}

/// Configuration structure for sunrise alarm settings.
///
/// Durations are whole seconds; brightness and volume values are fractions in `[0, 1]`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    pub backend: Option<Backend>,

    pub sunrise_window: Option<u64>,
    pub sunrise_tick: Option<u64>,

    pub inactivity_timeout: Option<u64>,
    pub inactivity_tick: Option<u64>,
    pub dim_brightness: Option<f64>,
    pub brightness_epsilon: Option<f64>,

    pub volume_start: Option<f64>,
    pub volume_step: Option<f64>,
    pub volume_interval: Option<u64>,
    pub volume_ramp_cap: Option<u64>,
    pub volume_stepped: Option<bool>,
    pub volume_tick: Option<u64>,

    pub silent: Option<bool>,
    pub max_days_ahead: Option<u32>,
    pub background_grant_seconds: Option<u64>,
}

impl Config {
    /// Get the configuration file path (see `loading::get_config_path`).
    pub fn get_config_path() -> Result<PathBuf> {
        loading::get_config_path()
    }

    /// Load configuration using automatic path detection.
    pub fn load() -> Result<Self> {
        loading::load()
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        loading::load_from_path(path)
    }

    /// Log the effective configuration, one indented line per setting.
    pub fn log_config(&self, resolved_path: Option<&std::path::Path>) {
        if let Some(path) = resolved_path {
            log_block_start!(
                "Loaded configuration from {}",
                crate::common::utils::private_path(path)
            );
        } else {
            log_block_start!("Using default configuration");
        }

        log_indented!(
            "Backend: {}",
            self.backend.unwrap_or(Backend::Auto).as_str()
        );
        log_indented!(
            "Sunrise window: {}s (tick {}s)",
            self.sunrise_window.unwrap_or(DEFAULT_SUNRISE_WINDOW),
            self.sunrise_tick.unwrap_or(DEFAULT_SUNRISE_TICK)
        );
        log_indented!(
            "Inactivity timeout: {}s (dim to {})",
            self.inactivity_timeout.unwrap_or(DEFAULT_INACTIVITY_TIMEOUT),
            crate::common::utils::percent(self.dim_brightness.unwrap_or(DEFAULT_DIM_BRIGHTNESS))
        );
        log_indented!(
            "Volume ramp: {} + {} every {}s, capped after {}s",
            crate::common::utils::percent(self.volume_start.unwrap_or(DEFAULT_VOLUME_START)),
            crate::common::utils::percent(self.volume_step.unwrap_or(DEFAULT_VOLUME_STEP)),
            self.volume_interval.unwrap_or(DEFAULT_VOLUME_INTERVAL),
            self.volume_ramp_cap.unwrap_or(DEFAULT_VOLUME_RAMP_CAP)
        );
        if self.silent.unwrap_or(DEFAULT_SILENT) {
            log_indented!("Silent alarm: audio disabled");
        }
    }
}
