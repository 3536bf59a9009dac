//! Configuration validation functionality.
//!
//! Rejects values that would make the alarm misbehave: ramps too short to be visible,
//! volumes outside `[0, 1]`, tick cadences longer than the window they drive.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Validate every configured field against its allowed range.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_range(
        config.sunrise_window,
        MINIMUM_SUNRISE_WINDOW,
        MAXIMUM_SUNRISE_WINDOW,
        "sunrise_window",
        "seconds",
    )?;
    validate_range(
        config.inactivity_timeout,
        MINIMUM_INACTIVITY_TIMEOUT,
        MAXIMUM_INACTIVITY_TIMEOUT,
        "inactivity_timeout",
        "seconds",
    )?;
    validate_range(
        config.volume_interval,
        MINIMUM_VOLUME_INTERVAL,
        MAXIMUM_VOLUME_INTERVAL,
        "volume_interval",
        "seconds",
    )?;
    validate_range(
        config.volume_ramp_cap,
        MINIMUM_VOLUME_RAMP_CAP,
        MAXIMUM_VOLUME_RAMP_CAP,
        "volume_ramp_cap",
        "seconds",
    )?;
    validate_range(
        config.background_grant_seconds,
        1,
        MAXIMUM_BACKGROUND_GRANT,
        "background_grant_seconds",
        "seconds",
    )?;

    for (value, name) in [
        (config.sunrise_tick, "sunrise_tick"),
        (config.volume_tick, "volume_tick"),
        (config.inactivity_tick, "inactivity_tick"),
    ] {
        validate_range(value, MINIMUM_TICK, MAXIMUM_TICK, name, "seconds")?;
    }

    if let Some(days) = config.max_days_ahead
        && !(MINIMUM_MAX_DAYS_AHEAD..=MAXIMUM_MAX_DAYS_AHEAD).contains(&days)
    {
        anyhow::bail!(
            "max_days_ahead ({}) must be between {} and {} days",
            days,
            MINIMUM_MAX_DAYS_AHEAD,
            MAXIMUM_MAX_DAYS_AHEAD
        );
    }

    validate_fraction(config.dim_brightness, 0.0, MAXIMUM_DIM_BRIGHTNESS, "dim_brightness")?;
    validate_fraction(
        config.brightness_epsilon,
        0.0,
        MAXIMUM_BRIGHTNESS_EPSILON,
        "brightness_epsilon",
    )?;
    validate_fraction(config.volume_start, 0.0, 1.0, "volume_start")?;
    validate_fraction(config.volume_step, 0.0, 1.0, "volume_step")?;

    // A tick slower than the sunrise window would skip the ramp entirely
    let window = config.sunrise_window.unwrap_or(DEFAULT_SUNRISE_WINDOW);
    let tick = config.sunrise_tick.unwrap_or(DEFAULT_SUNRISE_TICK);
    if tick * 2 > window {
        anyhow::bail!(
            "sunrise_tick ({}s) must be at most half of sunrise_window ({}s)",
            tick,
            window
        );
    }

    let interval = config.volume_interval.unwrap_or(DEFAULT_VOLUME_INTERVAL);
    let cap = config.volume_ramp_cap.unwrap_or(DEFAULT_VOLUME_RAMP_CAP);
    if interval > cap {
        anyhow::bail!(
            "volume_interval ({}s) cannot exceed volume_ramp_cap ({}s)",
            interval,
            cap
        );
    }

    Ok(())
}

fn validate_range(value: Option<u64>, min: u64, max: u64, name: &str, unit: &str) -> Result<()> {
    if let Some(value) = value
        && !(min..=max).contains(&value)
    {
        anyhow::bail!(
            "{} ({} {}) must be between {} and {} {}",
            name,
            value,
            unit,
            min,
            max,
            unit
        );
    }
    Ok(())
}

fn validate_fraction(value: Option<f64>, min: f64, max: f64, name: &str) -> Result<()> {
    if let Some(value) = value
        && !(min..=max).contains(&value)
    {
        anyhow::bail!("{} ({}) must be between {} and {}", name, value, min, max);
    }
    Ok(())
}
