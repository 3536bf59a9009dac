//! Alarm arming state and target time normalization.
//!
//! An alarm is requested as a time of day. It lands on today when that time is still
//! ahead, otherwise on the same wall-clock time tomorrow. Seconds are always dropped.
//! Anything further out than the configured day limit is refused as clock corruption.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use thiserror::Error;

/// Errors returned when arming the alarm. The alarm state is never changed on error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlarmError {
    /// The normalized time is not usable: too far ahead, in the past, or nonexistent locally.
    #[error("Invalid alarm time: {0}")]
    InvalidTime(String),

    /// The input could not be read as a time of day or a local timestamp.
    #[error("Cannot parse alarm time '{0}', expected HH:MM or YYYY-MM-DD HH:MM")]
    Unparseable(String),
}

/// Where the alarm is in its lifecycle.
///
/// Each later phase carries the data of the earlier ones, so "fired implies sunrise
/// entered implies armed" holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmPhase {
    Idle,
    Armed {
        target: DateTime<Local>,
    },
    Ramping {
        target: DateTime<Local>,
    },
    Fired {
        target: DateTime<Local>,
        fired_at: DateTime<Local>,
    },
}

impl AlarmPhase {
    pub fn target(&self) -> Option<DateTime<Local>> {
        match *self {
            AlarmPhase::Idle => None,
            AlarmPhase::Armed { target }
            | AlarmPhase::Ramping { target }
            | AlarmPhase::Fired { target, .. } => Some(target),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlarmPhase::Idle => "idle",
            AlarmPhase::Armed { .. } => "armed",
            AlarmPhase::Ramping { .. } => "ramping",
            AlarmPhase::Fired { .. } => "fired",
        }
    }
}

/// The single alarm and whether it plays sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmState {
    pub phase: AlarmPhase,
    pub silent: bool,
}

impl Default for AlarmState {
    fn default() -> Self {
        Self {
            phase: AlarmPhase::Idle,
            silent: false,
        }
    }
}

impl AlarmState {
    pub fn is_armed(&self) -> bool {
        !matches!(self.phase, AlarmPhase::Idle)
    }

    pub fn entered_sunrise(&self) -> bool {
        matches!(
            self.phase,
            AlarmPhase::Ramping { .. } | AlarmPhase::Fired { .. }
        )
    }

    pub fn is_ramping(&self) -> bool {
        matches!(self.phase, AlarmPhase::Ramping { .. })
    }

    pub fn target(&self) -> Option<DateTime<Local>> {
        self.phase.target()
    }

    pub fn fired_at(&self) -> Option<DateTime<Local>> {
        match self.phase {
            AlarmPhase::Fired { fired_at, .. } => Some(fired_at),
            _ => None,
        }
    }

    /// Arm for `target`, discarding whatever phase came before.
    pub fn arm(&mut self, target: DateTime<Local>) {
        self.phase = AlarmPhase::Armed { target };
    }

    /// Back to idle in a single assignment.
    pub fn reset(&mut self) {
        self.phase = AlarmPhase::Idle;
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`, seconds ignored) into a time of day.
pub fn parse_alarm_time(input: &str) -> Result<NaiveTime, AlarmError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| AlarmError::Unparseable(input.to_string()))
}

/// An alarm as asked for on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmRequest {
    TimeOfDay(NaiveTime),
    At(DateTime<Local>),
}

/// Read `HH:MM[:SS]` as a time of day, or `YYYY-MM-DD HH:MM[:SS]` as a local timestamp.
pub fn parse_alarm_request(input: &str) -> Result<AlarmRequest, AlarmError> {
    if let Ok(time) = parse_alarm_time(input) {
        return Ok(AlarmRequest::TimeOfDay(time));
    }

    let trimmed = input.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| AlarmError::Unparseable(input.to_string()))?;

    resolve_local(naive)
        .map(AlarmRequest::At)
        .ok_or_else(|| AlarmError::InvalidTime(format!("{trimmed} does not exist in local time")))
}

/// Project a time of day onto the next occurrence after `now`.
pub fn next_occurrence(
    time_of_day: NaiveTime,
    now: DateTime<Local>,
    max_days: u32,
) -> Result<DateTime<Local>, AlarmError> {
    let time = truncate_seconds(time_of_day);
    normalize(now.date_naive(), time, now, max_days)
}

/// Normalize a full timestamp the same way: seconds dropped, rolled to the next day when
/// not in the future, then checked against the day limit.
pub fn normalize_timestamp(
    requested: DateTime<Local>,
    now: DateTime<Local>,
    max_days: u32,
) -> Result<DateTime<Local>, AlarmError> {
    let time = truncate_seconds(requested.time());
    normalize(requested.date_naive(), time, now, max_days)
}

fn truncate_seconds(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

fn normalize(
    date: NaiveDate,
    time: NaiveTime,
    now: DateTime<Local>,
    max_days: u32,
) -> Result<DateTime<Local>, AlarmError> {
    let mut candidate = resolve_local(date.and_time(time));

    // Not in the future (or skipped by a DST gap): same wall-clock time one day later
    if candidate.is_none_or(|c| c <= now) {
        let next_day = date
            .succ_opt()
            .ok_or_else(|| AlarmError::InvalidTime("date out of range".to_string()))?;
        candidate = resolve_local(next_day.and_time(time));
    }

    let target = candidate.ok_or_else(|| {
        AlarmError::InvalidTime(format!("{} does not exist in local time", time.format("%H:%M")))
    })?;

    if target <= now {
        return Err(AlarmError::InvalidTime(format!(
            "{} is in the past",
            target.format("%Y-%m-%d %H:%M")
        )));
    }

    if target - now > Duration::days(i64::from(max_days)) {
        return Err(AlarmError::InvalidTime(format!(
            "{} is more than {} days away",
            target.format("%Y-%m-%d %H:%M"),
            max_days
        )));
    }

    Ok(target)
}

fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}
