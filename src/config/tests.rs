use super::builder::default_config_content;
use super::validation::validate_config;
use super::*;
use crate::common::constants::test_constants::*;
use crate::common::constants::*;
use proptest::prelude::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn create_test_config(sunrise_window: Option<u64>, inactivity_timeout: Option<u64>) -> Config {
    Config {
        backend: Some(Backend::Terminal),
        sunrise_window,
        sunrise_tick: Some(DEFAULT_SUNRISE_TICK),
        inactivity_timeout,
        inactivity_tick: Some(DEFAULT_INACTIVITY_TICK),
        dim_brightness: Some(DEFAULT_DIM_BRIGHTNESS),
        brightness_epsilon: Some(DEFAULT_BRIGHTNESS_EPSILON),
        volume_start: Some(DEFAULT_VOLUME_START),
        volume_step: Some(DEFAULT_VOLUME_STEP),
        volume_interval: Some(TEST_VOLUME_INTERVAL),
        volume_ramp_cap: Some(TEST_VOLUME_RAMP_CAP),
        volume_stepped: Some(false),
        volume_tick: Some(DEFAULT_VOLUME_TICK),
        silent: Some(false),
        max_days_ahead: Some(DEFAULT_MAX_DAYS_AHEAD),
        background_grant_seconds: Some(DEFAULT_BACKGROUND_GRANT),
    }
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir
        .path()
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME);

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    if let Err(e) = &result {
        eprintln!("Config::load() failed: {:?}", e);
    }
    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.sunrise_window, Some(DEFAULT_SUNRISE_WINDOW));
    assert_eq!(config.backend, Some(Backend::Auto));
}

#[test]
fn test_default_config_content_parses_and_validates() {
    let content = default_config_content();
    let config: Config = toml::from_str(&content).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.sunrise_window, Some(TEST_SUNRISE_WINDOW));
    assert_eq!(config.inactivity_timeout, Some(TEST_INACTIVITY_TIMEOUT));
    assert_eq!(config.volume_start, Some(DEFAULT_VOLUME_START));
    assert_eq!(config.volume_step, Some(DEFAULT_VOLUME_STEP));
    assert_eq!(config.volume_stepped, Some(false));
    assert_eq!(config.max_days_ahead, Some(7));
}

#[test]
fn test_default_config_comments_are_aligned() {
    let content = default_config_content();
    let columns: Vec<usize> = content
        .lines()
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .filter_map(|line| line.find('#'))
        .collect();
    assert!(!columns.is_empty());
    assert!(columns.iter().all(|c| *c == columns[0]));
}

#[test]
fn test_load_from_path_missing_file_is_error() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("missing.toml");
    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_load_from_path_partial_config() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "sunrise_window = 900\nsilent = true\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.sunrise_window, Some(900));
    assert_eq!(config.silent, Some(true));
    assert_eq!(config.inactivity_timeout, None);
    assert_eq!(config.backend, None);
}

#[test]
fn test_load_from_path_rejects_invalid_values() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "volume_start = 1.5\n").unwrap();
    assert!(Config::load_from_path(&path).is_err());

    fs::write(&path, "backend = \"hyprland\"\n").unwrap();
    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_config_validation_basic() {
    let config = create_test_config(Some(TEST_SUNRISE_WINDOW), Some(TEST_INACTIVITY_TIMEOUT));
    assert!(validate_config(&config).is_ok());
    assert!(validate_config(&Config::default()).is_ok());
}

#[test]
fn test_config_validation_sunrise_window_limits() {
    let config = create_test_config(Some(MINIMUM_SUNRISE_WINDOW), None);
    assert!(validate_config(&config).is_ok());

    let config = create_test_config(Some(MINIMUM_SUNRISE_WINDOW - 1), None);
    assert!(validate_config(&config).is_err());

    let config = create_test_config(Some(MAXIMUM_SUNRISE_WINDOW + 1), None);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_inactivity_limits() {
    let config = create_test_config(None, Some(MINIMUM_INACTIVITY_TIMEOUT - 1));
    assert!(validate_config(&config).is_err());

    let config = create_test_config(None, Some(MAXIMUM_INACTIVITY_TIMEOUT));
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_tick_slower_than_window() {
    let mut config = create_test_config(Some(MINIMUM_SUNRISE_WINDOW), None);
    config.sunrise_tick = Some(MAXIMUM_TICK);
    assert!(validate_config(&config).is_err());

    config.sunrise_tick = Some(0);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_volume_interval_within_cap() {
    let mut config = create_test_config(None, None);
    config.volume_interval = Some(60);
    config.volume_ramp_cap = Some(30);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_max_days() {
    let mut config = create_test_config(None, None);
    config.max_days_ahead = Some(0);
    assert!(validate_config(&config).is_err());
    config.max_days_ahead = Some(8);
    assert!(validate_config(&config).is_err());
    config.max_days_ahead = Some(1);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_fractions() {
    let mut config = create_test_config(None, None);
    config.dim_brightness = Some(0.6);
    assert!(validate_config(&config).is_err());

    let mut config = create_test_config(None, None);
    config.volume_step = Some(-0.05);
    assert!(validate_config(&config).is_err());

    let mut config = create_test_config(None, None);
    config.brightness_epsilon = Some(0.0);
    assert!(validate_config(&config).is_ok());
}

proptest! {
    #[test]
    fn prop_in_range_windows_validate(window in MINIMUM_SUNRISE_WINDOW..=MAXIMUM_SUNRISE_WINDOW) {
        let config = create_test_config(Some(window), None);
        prop_assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn prop_volume_start_outside_unit_rejected(start in 1.0001f64..100.0) {
        let mut config = create_test_config(None, None);
        config.volume_start = Some(start);
        prop_assert!(validate_config(&config).is_err());
    }
}
