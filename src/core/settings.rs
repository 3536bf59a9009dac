//! Effective alarm settings: configuration with every default filled in.

use chrono::Duration;
use std::time::Duration as StdDuration;

use super::volume::VolumeSchedule;
use crate::common::constants::*;
use crate::config::Config;

/// Resolved timing and level parameters for the alarm core.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSettings {
    pub sunrise_window: Duration,
    pub inactivity_timeout: Duration,
    pub dim_brightness: f64,
    pub brightness_epsilon: f64,
    pub volume: VolumeSchedule,
    pub sunrise_tick: StdDuration,
    pub volume_tick: StdDuration,
    pub inactivity_tick: StdDuration,
    pub silent: bool,
    pub max_days_ahead: u32,
    pub background_grant: Duration,
}

impl AlarmSettings {
    pub fn from_config(config: &Config) -> Self {
        let seconds = |value: Option<u64>, default: u64| {
            Duration::seconds(value.unwrap_or(default) as i64)
        };

        Self {
            sunrise_window: seconds(config.sunrise_window, DEFAULT_SUNRISE_WINDOW),
            inactivity_timeout: seconds(config.inactivity_timeout, DEFAULT_INACTIVITY_TIMEOUT),
            dim_brightness: config.dim_brightness.unwrap_or(DEFAULT_DIM_BRIGHTNESS),
            brightness_epsilon: config
                .brightness_epsilon
                .unwrap_or(DEFAULT_BRIGHTNESS_EPSILON),
            volume: VolumeSchedule {
                start: config.volume_start.unwrap_or(DEFAULT_VOLUME_START),
                step: config.volume_step.unwrap_or(DEFAULT_VOLUME_STEP),
                interval: seconds(config.volume_interval, DEFAULT_VOLUME_INTERVAL),
                cap: seconds(config.volume_ramp_cap, DEFAULT_VOLUME_RAMP_CAP),
                stepped: config.volume_stepped.unwrap_or(DEFAULT_VOLUME_STEPPED),
            },
            sunrise_tick: StdDuration::from_secs(
                config.sunrise_tick.unwrap_or(DEFAULT_SUNRISE_TICK),
            ),
            volume_tick: StdDuration::from_secs(config.volume_tick.unwrap_or(DEFAULT_VOLUME_TICK)),
            inactivity_tick: StdDuration::from_secs(
                config.inactivity_tick.unwrap_or(DEFAULT_INACTIVITY_TICK),
            ),
            silent: config.silent.unwrap_or(DEFAULT_SILENT),
            max_days_ahead: config.max_days_ahead.unwrap_or(DEFAULT_MAX_DAYS_AHEAD),
            background_grant: seconds(config.background_grant_seconds, DEFAULT_BACKGROUND_GRANT),
        }
    }
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AlarmSettings::default();
        assert_eq!(settings.sunrise_window, Duration::seconds(600));
        assert_eq!(settings.inactivity_timeout, Duration::seconds(30));
        assert_eq!(settings.volume.interval, Duration::seconds(10));
        assert_eq!(settings.volume.cap, Duration::seconds(180));
        assert_eq!(settings.sunrise_tick, StdDuration::from_secs(5));
        assert_eq!(settings.inactivity_tick, StdDuration::from_secs(1));
        assert_eq!(settings.max_days_ahead, 7);
        assert!(!settings.silent);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config {
            sunrise_window: Some(900),
            volume_stepped: Some(true),
            silent: Some(true),
            ..Config::default()
        };
        let settings = AlarmSettings::from_config(&config);
        assert_eq!(settings.sunrise_window, Duration::seconds(900));
        assert!(settings.volume.stepped);
        assert!(settings.silent);
    }
}
