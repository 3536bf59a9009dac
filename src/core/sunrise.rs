//! Sunrise phase evaluation.
//!
//! A pure step function over the alarm phase: given the phase and the current time it
//! returns the next phase and the effects the coordinator has to apply. Nothing here
//! touches a sink, which keeps the firing rules testable in isolation.

use chrono::{DateTime, Duration, Local};

use super::alarm::AlarmPhase;
use crate::common::utils::clamp_unit;

/// Something the coordinator must do as a result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SunriseEffect {
    /// First tick inside the window: capture the baseline and go to full brightness.
    EnterSunrise,
    /// Overlay level for the current position in the window, in `[0, 1]`.
    Progress(f64),
    /// The alarm time has passed: finish the sunrise and start the audio.
    Complete,
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SunriseOutcome {
    pub phase: AlarmPhase,
    pub effects: Vec<SunriseEffect>,
}

impl SunriseOutcome {
    fn unchanged(phase: AlarmPhase) -> Self {
        Self {
            phase,
            effects: Vec::new(),
        }
    }
}

/// Position of `now` within `[target - window, target]`, clamped to `[0, 1]`.
pub fn sunrise_progress(now: DateTime<Local>, target: DateTime<Local>, window: Duration) -> f64 {
    let window_ms = window.num_milliseconds();
    if window_ms <= 0 {
        return if now >= target { 1.0 } else { 0.0 };
    }
    let start = target - window;
    let elapsed_ms = (now - start).num_milliseconds();
    clamp_unit(elapsed_ms as f64 / window_ms as f64)
}

/// Advance the phase for one sunrise tick.
///
/// - `Armed` before the window: nothing
/// - `Armed` inside the window: enter, apply progress, become `Ramping`
/// - `Armed` already past the alarm (the window was skipped): enter and complete at once
/// - `Ramping` up to the alarm time: apply progress
/// - `Ramping` after the alarm time: complete and become `Fired`
/// - `Idle` and `Fired`: nothing, so re-ticking never fires twice
pub fn evaluate(phase: AlarmPhase, now: DateTime<Local>, window: Duration) -> SunriseOutcome {
    match phase {
        AlarmPhase::Idle | AlarmPhase::Fired { .. } => SunriseOutcome::unchanged(phase),

        AlarmPhase::Armed { target } => {
            if now < target - window {
                SunriseOutcome::unchanged(phase)
            } else if now <= target {
                SunriseOutcome {
                    phase: AlarmPhase::Ramping { target },
                    effects: vec![
                        SunriseEffect::EnterSunrise,
                        SunriseEffect::Progress(sunrise_progress(now, target, window)),
                    ],
                }
            } else {
                SunriseOutcome {
                    phase: AlarmPhase::Fired {
                        target,
                        fired_at: now,
                    },
                    effects: vec![
                        SunriseEffect::EnterSunrise,
                        SunriseEffect::Progress(1.0),
                        SunriseEffect::Complete,
                    ],
                }
            }
        }

        AlarmPhase::Ramping { target } => {
            if now <= target {
                SunriseOutcome {
                    phase,
                    effects: vec![SunriseEffect::Progress(sunrise_progress(
                        now, target, window,
                    ))],
                }
            } else {
                SunriseOutcome {
                    phase: AlarmPhase::Fired {
                        target,
                        fired_at: now,
                    },
                    effects: vec![SunriseEffect::Complete],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn alarm() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).single().unwrap()
    }

    fn window() -> Duration {
        Duration::seconds(600)
    }

    #[test]
    fn test_armed_before_window_does_nothing() {
        let phase = AlarmPhase::Armed { target: alarm() };
        let outcome = evaluate(phase, alarm() - Duration::seconds(601), window());
        assert_eq!(outcome.phase, phase);
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn test_window_entry_at_exact_start() {
        let phase = AlarmPhase::Armed { target: alarm() };
        let outcome = evaluate(phase, alarm() - window(), window());
        assert_eq!(outcome.phase, AlarmPhase::Ramping { target: alarm() });
        assert_eq!(
            outcome.effects,
            vec![SunriseEffect::EnterSunrise, SunriseEffect::Progress(0.0)]
        );
    }

    #[test]
    fn test_truncated_window_starts_partway() {
        // Armed with only 120s left: progress starts at 0.8
        let phase = AlarmPhase::Armed { target: alarm() };
        let outcome = evaluate(phase, alarm() - Duration::seconds(120), window());
        assert_eq!(
            outcome.effects,
            vec![SunriseEffect::EnterSunrise, SunriseEffect::Progress(0.8)]
        );
    }

    #[test]
    fn test_ramping_at_alarm_time_is_not_fired_yet() {
        let phase = AlarmPhase::Ramping { target: alarm() };
        let outcome = evaluate(phase, alarm(), window());
        assert_eq!(outcome.phase, phase);
        assert_eq!(outcome.effects, vec![SunriseEffect::Progress(1.0)]);
    }

    #[test]
    fn test_ramping_past_alarm_fires() {
        let now = alarm() + Duration::seconds(1);
        let outcome = evaluate(AlarmPhase::Ramping { target: alarm() }, now, window());
        assert_eq!(
            outcome.phase,
            AlarmPhase::Fired {
                target: alarm(),
                fired_at: now
            }
        );
        assert_eq!(outcome.effects, vec![SunriseEffect::Complete]);
    }

    #[test]
    fn test_skipped_window_enters_and_fires_once() {
        let now = alarm() + Duration::seconds(30);
        let outcome = evaluate(AlarmPhase::Armed { target: alarm() }, now, window());
        assert!(matches!(outcome.phase, AlarmPhase::Fired { .. }));
        assert_eq!(
            outcome
                .effects
                .iter()
                .filter(|e| **e == SunriseEffect::Complete)
                .count(),
            1
        );

        let again = evaluate(outcome.phase, now + Duration::seconds(5), window());
        assert!(again.effects.is_empty());
    }

    #[test]
    fn test_fired_and_idle_are_terminal_for_ticks() {
        let fired = AlarmPhase::Fired {
            target: alarm(),
            fired_at: alarm(),
        };
        assert!(evaluate(fired, alarm() + Duration::hours(1), window())
            .effects
            .is_empty());
        assert!(evaluate(AlarmPhase::Idle, alarm(), window())
            .effects
            .is_empty());
    }

    #[test]
    fn test_sunrise_progress_midpoint() {
        let p = sunrise_progress(alarm() - Duration::seconds(300), alarm(), window());
        assert!((p - 0.5).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_progress_is_monotone(a in -1200i64..1200, b in -1200i64..1200) {
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let p_early = sunrise_progress(alarm() + Duration::seconds(early), alarm(), window());
            let p_late = sunrise_progress(alarm() + Duration::seconds(late), alarm(), window());
            prop_assert!(p_early <= p_late);
            prop_assert!((0.0..=1.0).contains(&p_early));
            prop_assert!((0.0..=1.0).contains(&p_late));
        }
    }
}
