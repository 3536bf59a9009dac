//! Application-wide constants: defaults, validation limits and exit codes.
//!
//! Defaults are used whenever a configuration field is absent. The limits bound what
//! `config::validation` accepts.

// # Sunrise ramp

/// Length of the pre-alarm sunrise window in seconds.
pub const DEFAULT_SUNRISE_WINDOW: u64 = 600;
pub const MINIMUM_SUNRISE_WINDOW: u64 = 60;
pub const MAXIMUM_SUNRISE_WINDOW: u64 = 3600;

// # Brightness

/// Writes closer than this to the last applied value are suppressed.
pub const DEFAULT_BRIGHTNESS_EPSILON: f64 = 0.01;
pub const MAXIMUM_BRIGHTNESS_EPSILON: f64 = 0.1;

/// Brightness used while the inactivity overlay is shown. Not zero, so the panel
/// stays on and keeps accepting touches.
pub const DEFAULT_DIM_BRIGHTNESS: f64 = 0.01;
pub const MAXIMUM_DIM_BRIGHTNESS: f64 = 0.5;

pub const FULL_BRIGHTNESS: f64 = 1.0;

// # Inactivity

/// Idle seconds before the dimming overlay is shown.
pub const DEFAULT_INACTIVITY_TIMEOUT: u64 = 30;
pub const MINIMUM_INACTIVITY_TIMEOUT: u64 = 5;
pub const MAXIMUM_INACTIVITY_TIMEOUT: u64 = 600;

// # Volume ramp

pub const DEFAULT_VOLUME_START: f64 = 0.10;
pub const DEFAULT_VOLUME_STEP: f64 = 0.05;
/// Seconds per volume step.
pub const DEFAULT_VOLUME_INTERVAL: u64 = 10;
pub const MINIMUM_VOLUME_INTERVAL: u64 = 1;
pub const MAXIMUM_VOLUME_INTERVAL: u64 = 120;
/// Seconds after which the volume ramp stops advancing.
pub const DEFAULT_VOLUME_RAMP_CAP: u64 = 180;
pub const MINIMUM_VOLUME_RAMP_CAP: u64 = 10;
pub const MAXIMUM_VOLUME_RAMP_CAP: u64 = 1800;
pub const DEFAULT_VOLUME_STEPPED: bool = false;

// # Tick cadences (seconds)

pub const DEFAULT_SUNRISE_TICK: u64 = 5;
pub const DEFAULT_VOLUME_TICK: u64 = 10;
pub const DEFAULT_INACTIVITY_TICK: u64 = 1;
pub const MINIMUM_TICK: u64 = 1;
pub const MAXIMUM_TICK: u64 = 60;

// # Arming

/// Alarms further out than this many days are rejected as clock corruption.
pub const DEFAULT_MAX_DAYS_AHEAD: u32 = 7;
pub const MINIMUM_MAX_DAYS_AHEAD: u32 = 1;
pub const MAXIMUM_MAX_DAYS_AHEAD: u32 = 7;
pub const DEFAULT_SILENT: bool = false;

// # Background execution

/// Lifetime of a background execution grant in seconds.
pub const DEFAULT_BACKGROUND_GRANT: u64 = 30;
pub const MAXIMUM_BACKGROUND_GRANT: u64 = 600;
pub const BACKGROUND_TASK_NAME: &str = "AlarmTimer";

// # Misc

pub const DEFAULT_BACKEND: &str = "auto";
pub const CONFIG_FILE_NAME: &str = "sunrise-alarm.toml";
pub const APP_DIR_NAME: &str = "sunrise-alarm";
pub const ALARM_STATE_FILE: &str = "alarm.json";
pub const BACKLIGHT_ROOT: &str = "/sys/class/backlight";

/// Polling granularity while waiting for signals in simulation mode.
pub const SIMULATION_POLL_MS: u64 = 10;

pub const EXIT_FAILURE: i32 = 1;

#[cfg(test)]
pub mod test_constants {
    pub const TEST_SUNRISE_WINDOW: u64 = 600;
    pub const TEST_INACTIVITY_TIMEOUT: u64 = 30;
    pub const TEST_VOLUME_INTERVAL: u64 = 10;
    pub const TEST_VOLUME_RAMP_CAP: u64 = 180;
}
