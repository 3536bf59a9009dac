//! Default configuration file creation.
//!
//! Writes a fully commented `sunrise-alarm.toml` with every setting at its default, the
//! comments aligned in one column.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Create a default config file at `path`, creating parent directories as needed.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = default_config_content();

    fs::write(path, content)
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));

    Ok(())
}

/// Render the default configuration text.
pub(crate) fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_section("Backend")
        .add_setting(
            "backend",
            &format!("\"{DEFAULT_BACKEND}\""),
            "\"auto\", \"backlight\" or \"terminal\"",
        )
        .add_section("Sunrise")
        .add_setting(
            "sunrise_window",
            &DEFAULT_SUNRISE_WINDOW.to_string(),
            &format!(
                "Seconds of brightness ramp before the alarm ({MINIMUM_SUNRISE_WINDOW}-{MAXIMUM_SUNRISE_WINDOW})"
            ),
        )
        .add_setting(
            "sunrise_tick",
            &DEFAULT_SUNRISE_TICK.to_string(),
            &format!("Seconds between sunrise updates ({MINIMUM_TICK}-{MAXIMUM_TICK})"),
        )
        .add_section("Inactivity")
        .add_setting(
            "inactivity_timeout",
            &DEFAULT_INACTIVITY_TIMEOUT.to_string(),
            &format!(
                "Idle seconds before the screen dims ({MINIMUM_INACTIVITY_TIMEOUT}-{MAXIMUM_INACTIVITY_TIMEOUT})"
            ),
        )
        .add_setting(
            "inactivity_tick",
            &DEFAULT_INACTIVITY_TICK.to_string(),
            &format!("Seconds between inactivity checks ({MINIMUM_TICK}-{MAXIMUM_TICK})"),
        )
        .add_setting(
            "dim_brightness",
            &format!("{DEFAULT_DIM_BRIGHTNESS:.2}"),
            &format!("Brightness while dimmed (0.0-{MAXIMUM_DIM_BRIGHTNESS})"),
        )
        .add_setting(
            "brightness_epsilon",
            &format!("{DEFAULT_BRIGHTNESS_EPSILON:.2}"),
            &format!("Smallest brightness change worth writing (0.0-{MAXIMUM_BRIGHTNESS_EPSILON})"),
        )
        .add_section("Volume")
        .add_setting(
            "volume_start",
            &format!("{DEFAULT_VOLUME_START:.2}"),
            "Volume when the alarm starts (0.0-1.0)",
        )
        .add_setting(
            "volume_step",
            &format!("{DEFAULT_VOLUME_STEP:.2}"),
            "Volume added per interval (0.0-1.0)",
        )
        .add_setting(
            "volume_interval",
            &DEFAULT_VOLUME_INTERVAL.to_string(),
            &format!(
                "Seconds per volume step ({MINIMUM_VOLUME_INTERVAL}-{MAXIMUM_VOLUME_INTERVAL})"
            ),
        )
        .add_setting(
            "volume_ramp_cap",
            &DEFAULT_VOLUME_RAMP_CAP.to_string(),
            &format!(
                "Seconds after which the ramp stops ({MINIMUM_VOLUME_RAMP_CAP}-{MAXIMUM_VOLUME_RAMP_CAP})"
            ),
        )
        .add_setting(
            "volume_stepped",
            &DEFAULT_VOLUME_STEPPED.to_string(),
            "Step in whole intervals instead of continuously",
        )
        .add_setting(
            "volume_tick",
            &DEFAULT_VOLUME_TICK.to_string(),
            &format!("Seconds between volume updates ({MINIMUM_TICK}-{MAXIMUM_TICK})"),
        )
        .add_section("Alarm")
        .add_setting(
            "silent",
            &DEFAULT_SILENT.to_string(),
            "Skip audio, keep the sunrise",
        )
        .add_setting(
            "max_days_ahead",
            &DEFAULT_MAX_DAYS_AHEAD.to_string(),
            &format!(
                "Reject alarms further out than this ({MINIMUM_MAX_DAYS_AHEAD}-{MAXIMUM_MAX_DAYS_AHEAD})"
            ),
        )
        .add_setting(
            "background_grant_seconds",
            &DEFAULT_BACKGROUND_GRANT.to_string(),
            &format!("Background execution grant length (1-{MAXIMUM_BACKGROUND_GRANT})"),
        )
        .build()
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // Widest setting line plus one space decides the comment column
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.push(String::new());
        result.join("\n")
    }
}
