//! Small shared helpers: unit clamping, ramp interpolation and human-readable durations.

use chrono::{DateTime, Local};
use std::path::Path;

/// Clamp a fraction into `[0, 1]`. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whether two fractions differ by less than `epsilon`.
pub fn within_epsilon(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Format the remaining time until `target` the way the alarm screen shows it.
///
/// - `"Alarm Active"` once the target has passed
/// - `"7 Hours, 1 Minute"` when at least an hour remains
/// - `"42 Minutes"` otherwise
pub fn format_time_until(target: DateTime<Local>, now: DateTime<Local>) -> String {
    let remaining = target.signed_duration_since(now);
    if remaining.num_seconds() <= 0 {
        return "Alarm Active".to_string();
    }

    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    let minute_text = if minutes == 1 { "Minute" } else { "Minutes" };

    if hours > 0 {
        let hour_text = if hours == 1 { "Hour" } else { "Hours" };
        format!("{hours} {hour_text}, {minutes} {minute_text}")
    } else {
        format!("{minutes} {minute_text}")
    }
}

/// Format a fraction as a whole percentage, e.g. `0.55` → `"55%"`.
pub fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// Replace the home directory prefix with `~` for log output.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}
