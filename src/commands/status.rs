//! Status command: show the saved alarm.
//!
//! Reads the alarm saved by the last run and prints its target along with the time
//! left, in the same wording as the alarm screen.

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::common::utils::format_time_until;
use crate::state::{AlarmStore, PersistedAlarm};

/// Handle `sunrise-alarm status`.
pub fn handle_status_command(debug_enabled: bool) -> Result<()> {
    let store = AlarmStore::open_default()?;
    if debug_enabled {
        log_debug!(
            "Reading {}",
            crate::common::utils::private_path(store.path())
        );
    }

    let saved = store.load()?;
    let now = crate::time::source::now();

    log_version!();
    for (index, line) in status_lines(saved.as_ref(), now).iter().enumerate() {
        if index == 0 {
            log_block_start!("{}", line);
        } else {
            log_indented!("{}", line);
        }
    }
    log_end!();
    Ok(())
}

/// Human-readable status for a saved alarm.
pub fn status_lines(saved: Option<&PersistedAlarm>, now: DateTime<Local>) -> Vec<String> {
    let Some(alarm) = saved else {
        return vec!["No alarm set".to_string()];
    };

    let mut lines = vec![
        format!(
            "Alarm set for {}",
            alarm.target_time.format("%a %Y-%m-%d %H:%M")
        ),
        format!("Time until alarm: {}", format_time_until(alarm.target_time, now)),
    ];
    if alarm.silent {
        lines.push("Silent: sunrise only".to_string());
    }
    if alarm.is_stale(now) {
        lines.push("This alarm has passed and will be discarded on next start".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, h, m, 0).single().unwrap()
    }

    #[test]
    fn test_no_alarm() {
        assert_eq!(status_lines(None, at(6, 0)), vec!["No alarm set"]);
    }

    #[test]
    fn test_pending_alarm() {
        let alarm = PersistedAlarm {
            target_time: at(8, 0),
            silent: true,
        };
        assert_eq!(
            status_lines(Some(&alarm), at(0, 59)),
            vec![
                "Alarm set for Wed 2025-01-15 08:00".to_string(),
                "Time until alarm: 7 Hours, 1 Minute".to_string(),
                "Silent: sunrise only".to_string(),
            ]
        );
    }

    #[test]
    fn test_passed_alarm() {
        let alarm = PersistedAlarm {
            target_time: at(8, 0),
            silent: false,
        };
        let lines = status_lines(Some(&alarm), at(8, 30));
        assert_eq!(lines[1], "Time until alarm: Alarm Active");
        assert_eq!(lines.len(), 3);
    }
}
