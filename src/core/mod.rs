//! Core alarm logic and state management.
//!
//! [`AlarmCore`] is the single owner of everything time-driven: the alarm phase, the
//! brightness controller, the audio coordinator, the inactivity monitor and the
//! background grant. Callers drive it with three independent ticks plus user and host
//! events; each call runs to completion before the next, so no state is ever shared.
//!
//! - `tick_sunrise`: window entry, overlay progress, firing
//! - `tick_volume`: the post-fire loudness ramp
//! - `tick_inactivity`: the dimming overlay, handing the screen to the sunrise when the
//!   window opens, and background grant expiry
//!
//! The runtime loop in [`runtime`] schedules those ticks and feeds signals in.

pub mod alarm;
pub mod audio;
pub mod background;
pub mod brightness;
pub mod inactivity;
pub mod runtime;
pub mod settings;
pub mod sunrise;
pub mod volume;

use chrono::{DateTime, Local, NaiveTime};

use crate::backend::Sinks;
use crate::common::utils::{format_time_until, percent};
use alarm::{AlarmError, AlarmPhase, AlarmState};
use audio::{AudioCoordinator, Interruption};
use background::BackgroundKeeper;
use brightness::BrightnessController;
use inactivity::{InactivityAction, InactivityMonitor};
use settings::AlarmSettings;
use sunrise::SunriseEffect;

/// Notable things that happened during a tick, for the runtime to log or persist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoreEvent {
    SunriseStarted,
    SunriseProgress(f64),
    AlarmFired { at: DateTime<Local> },
    OverlayShown,
    OverlayHidden,
    GrantExpired,
}

/// Owner of all alarm state.
pub struct AlarmCore {
    settings: AlarmSettings,
    alarm: AlarmState,
    brightness: BrightnessController,
    audio: AudioCoordinator,
    inactivity: InactivityMonitor,
    background: BackgroundKeeper,
    completions: u32,
}

impl AlarmCore {
    pub fn new(settings: AlarmSettings, sinks: Sinks, now: DateTime<Local>) -> Self {
        let brightness = BrightnessController::new(
            sinks.brightness,
            settings.brightness_epsilon,
            settings.dim_brightness,
        );
        let audio =
            AudioCoordinator::new(sinks.audio, settings.volume, settings.brightness_epsilon);
        let inactivity =
            InactivityMonitor::new(now, settings.inactivity_timeout, settings.sunrise_window);
        let background = BackgroundKeeper::new(sinks.host, settings.background_grant);

        Self {
            alarm: AlarmState {
                phase: AlarmPhase::Idle,
                silent: settings.silent,
            },
            settings,
            brightness,
            audio,
            inactivity,
            background,
            completions: 0,
        }
    }

    // # Arming

    /// Arm for the next occurrence of `time_of_day`. Replaces any alarm already set.
    pub fn set_alarm(
        &mut self,
        time_of_day: NaiveTime,
        now: DateTime<Local>,
    ) -> Result<DateTime<Local>, AlarmError> {
        let target = alarm::next_occurrence(time_of_day, now, self.settings.max_days_ahead)?;
        self.arm(target, now);
        Ok(target)
    }

    /// Arm for a full timestamp, normalized like [`Self::set_alarm`].
    pub fn set_alarm_at(
        &mut self,
        requested: DateTime<Local>,
        now: DateTime<Local>,
    ) -> Result<DateTime<Local>, AlarmError> {
        let target = alarm::normalize_timestamp(requested, now, self.settings.max_days_ahead)?;
        self.arm(target, now);
        Ok(target)
    }

    fn arm(&mut self, target: DateTime<Local>, now: DateTime<Local>) {
        if self.alarm.is_armed() {
            self.teardown();
        }
        self.alarm.arm(target);
        self.background.on_armed(now);

        log_block_start!("Alarm set for {}", target.format("%a %H:%M"));
        log_indented!("Time until alarm: {}", format_time_until(target, now));
        if self.alarm.silent {
            log_indented!("Silent: sunrise only");
        }
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.alarm.silent = silent;
    }

    /// Disarm and undo every side effect. Safe to call in any state, any number of times.
    ///
    /// Brightness is only restored when an alarm was armed, so a repeated cancel never
    /// writes again.
    pub fn cancel_alarm(&mut self) {
        if self.teardown() {
            log_block_start!("Alarm cancelled");
        }
    }

    /// Hand the screen and audio back before exit. Also lifts a dim left over while idle.
    pub fn shutdown(&mut self) {
        self.teardown();
        if self.brightness.is_dimmed() {
            self.brightness.undim();
        }
    }

    /// Returns whether an alarm was armed.
    fn teardown(&mut self) -> bool {
        let was_armed = self.alarm.is_armed();
        self.alarm.reset();
        self.audio.on_cancel();
        self.background.release();
        if was_armed {
            self.brightness.restore_brightness();
            self.inactivity.clear_overlay();
        }
        was_armed
    }

    // # Ticks

    pub fn tick_sunrise(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let outcome = sunrise::evaluate(self.alarm.phase, now, self.settings.sunrise_window);
        self.alarm.phase = outcome.phase;

        let mut events = Vec::new();
        for effect in outcome.effects {
            match effect {
                SunriseEffect::EnterSunrise => {
                    self.brightness.start_sunrise_phase();
                    if self.inactivity.overlay_shown() {
                        self.inactivity.clear_overlay();
                        events.push(CoreEvent::OverlayHidden);
                    }
                    events.push(CoreEvent::SunriseStarted);
                }
                SunriseEffect::Progress(_) => {
                    if let Some(target) = self.alarm.target() {
                        let progress = self.brightness.update_sunrise_progress(
                            now,
                            target,
                            self.settings.sunrise_window,
                        );
                        events.push(CoreEvent::SunriseProgress(progress));
                    }
                }
                SunriseEffect::Complete => {
                    self.brightness.complete_sunrise();
                    self.background.release();
                    self.audio.on_alarm_fired(now, self.alarm.silent);
                    self.completions += 1;
                    events.push(CoreEvent::AlarmFired { at: now });
                }
            }
        }
        events
    }

    /// Advance the volume ramp. Returns the volume written, if any.
    pub fn tick_volume(&mut self, now: DateTime<Local>) -> Option<f64> {
        if !matches!(self.alarm.phase, AlarmPhase::Fired { .. }) {
            return None;
        }
        self.audio.tick(now)
    }

    pub fn tick_inactivity(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        match self.inactivity.tick(now, self.alarm.target()) {
            InactivityAction::ShowOverlay => {
                self.brightness.dim();
                events.push(CoreEvent::OverlayShown);
            }
            InactivityAction::HideOverlay => {
                // Sunrise entry must follow at once: an undim in between drops the
                // pre-dim baseline.
                self.brightness.release_dim_for_sunrise();
                events.push(CoreEvent::OverlayHidden);
                events.extend(self.tick_sunrise(now));
            }
            InactivityAction::None => {}
        }

        if self.background.tick(now) {
            events.push(CoreEvent::GrantExpired);
        }
        events
    }

    // # User and host events

    /// The user touched the device. Returns `OverlayHidden` when the dim was lifted.
    pub fn notify_interaction(&mut self, now: DateTime<Local>) -> Option<CoreEvent> {
        let was_shown = self.inactivity.user_interacted(now);
        let below_full = self.brightness.current() < 1.0 && !self.alarm.is_ramping();

        if was_shown || below_full {
            self.brightness.undim();
        }
        was_shown.then_some(CoreEvent::OverlayHidden)
    }

    pub fn on_audio_interruption(&mut self, interruption: Interruption) {
        self.audio.on_interruption(interruption);
    }

    pub fn enter_background(&mut self, now: DateTime<Local>) {
        self.background
            .enter_background(now, self.alarm.is_armed() && !self.has_fired());
    }

    pub fn enter_foreground(&mut self) {
        self.background.enter_foreground();
    }

    // # Accessors

    pub fn phase(&self) -> AlarmPhase {
        self.alarm.phase
    }

    pub fn alarm(&self) -> &AlarmState {
        &self.alarm
    }

    pub fn target(&self) -> Option<DateTime<Local>> {
        self.alarm.target()
    }

    pub fn fired_at(&self) -> Option<DateTime<Local>> {
        self.alarm.fired_at()
    }

    pub fn has_fired(&self) -> bool {
        self.alarm.fired_at().is_some()
    }

    /// How many times the alarm has fired since this core was created.
    pub fn completions(&self) -> u32 {
        self.completions
    }

    pub fn brightness(&self) -> &BrightnessController {
        &self.brightness
    }

    pub fn audio(&self) -> &AudioCoordinator {
        &self.audio
    }

    pub fn inactivity(&self) -> &InactivityMonitor {
        &self.inactivity
    }

    pub fn has_background_grant(&self) -> bool {
        self.background.has_grant()
    }

    pub fn settings(&self) -> &AlarmSettings {
        &self.settings
    }

    /// Remaining time as shown on the alarm screen, or `None` when nothing is armed.
    pub fn time_until_alarm(&self, now: DateTime<Local>) -> Option<String> {
        self.alarm
            .target()
            .map(|target| format_time_until(target, now))
    }

    /// One-line status summary for logs.
    pub fn describe(&self, now: DateTime<Local>) -> String {
        match self.alarm.phase {
            AlarmPhase::Idle => "No alarm set".to_string(),
            AlarmPhase::Armed { target } => format!(
                "Armed for {} ({})",
                target.format("%H:%M"),
                format_time_until(target, now)
            ),
            AlarmPhase::Ramping { target } => format!(
                "Sunrise {} toward {}",
                percent(self.brightness.overlay_level()),
                target.format("%H:%M")
            ),
            AlarmPhase::Fired { fired_at, .. } => {
                format!("Alarm fired at {}", fired_at.format("%H:%M:%S"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{AudioRecorder, BrightnessRecorder, HostRecorder};
    use crate::common::logger::Log;
    use chrono::{Duration, TimeZone};

    struct Harness {
        core: AlarmCore,
        brightness: BrightnessRecorder,
        audio: AudioRecorder,
        host: HostRecorder,
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, h, m, s).single().unwrap()
    }

    fn harness(now: DateTime<Local>, reading: Option<f64>) -> Harness {
        Log::set_enabled(false);
        let brightness = BrightnessRecorder::new(reading);
        let audio = AudioRecorder::new();
        let host = HostRecorder::new();
        let sinks = Sinks {
            brightness: brightness.sink(),
            audio: audio.sink(),
            host: host.host(),
        };
        Harness {
            core: AlarmCore::new(AlarmSettings::default(), sinks, now),
            brightness,
            audio,
            host,
        }
    }

    #[test]
    fn test_set_alarm_stores_normalized_target() {
        let mut h = harness(at(7, 0, 0), Some(0.5));
        let target = h
            .core
            .set_alarm(NaiveTime::from_hms_opt(8, 0, 0).unwrap(), at(7, 0, 0))
            .unwrap();
        assert_eq!(target, at(8, 0, 0));
        assert_eq!(h.core.phase(), AlarmPhase::Armed { target });
        assert_eq!(
            h.core.time_until_alarm(at(7, 0, 0)).as_deref(),
            Some("1 Hour, 0 Minutes")
        );
    }

    #[test]
    fn test_rejected_alarm_leaves_state_unchanged() {
        let mut h = harness(at(7, 0, 0), None);
        let result = h
            .core
            .set_alarm_at(at(7, 0, 0) + Duration::days(9), at(7, 0, 0));
        assert!(result.is_err());
        assert_eq!(h.core.phase(), AlarmPhase::Idle);
    }

    #[test]
    fn test_rearming_replaces_previous_alarm() {
        let mut h = harness(at(7, 0, 0), Some(0.5));
        h.core.set_alarm_at(at(7, 5, 0), at(7, 0, 0)).unwrap();
        h.core.tick_sunrise(at(7, 1, 0));
        assert!(h.core.alarm().is_ramping());

        h.core.set_alarm_at(at(9, 0, 0), at(7, 1, 0)).unwrap();
        assert_eq!(h.core.phase(), AlarmPhase::Armed { target: at(9, 0, 0) });
        assert_eq!(h.brightness.last(), Some(0.5));
    }

    #[test]
    fn test_cancel_is_idempotent_from_any_state() {
        let mut h = harness(at(7, 0, 0), Some(0.5));
        h.core.cancel_alarm();
        h.core.cancel_alarm();
        assert_eq!(h.core.phase(), AlarmPhase::Idle);
        assert!(!h.audio.is_playing());
        assert!(h.host.active_grants().is_empty());
    }

    #[test]
    fn test_interaction_lifts_dim_overlay() {
        let mut h = harness(at(2, 0, 0), Some(0.6));
        let events = h.core.tick_inactivity(at(2, 0, 31));
        assert_eq!(events, vec![CoreEvent::OverlayShown]);
        assert!(h.core.brightness().is_dimmed());

        assert_eq!(
            h.core.notify_interaction(at(2, 0, 40)),
            Some(CoreEvent::OverlayHidden)
        );
        assert_eq!(h.brightness.last(), Some(1.0));
        assert_eq!(h.core.notify_interaction(at(2, 0, 41)), None);
    }

    #[test]
    fn test_sunrise_entry_hides_overlay_and_keeps_pre_dim_baseline() {
        let mut h = harness(at(7, 0, 0), Some(0.6));
        h.core.set_alarm_at(at(8, 0, 0), at(7, 0, 0)).unwrap();
        h.brightness.set_reading(Some(0.6));

        // Dim at 07:30 after half an hour idle
        h.core.tick_inactivity(at(7, 30, 0));
        assert!(h.core.brightness().is_dimmed());

        let events = h.core.tick_sunrise(at(7, 50, 0));
        assert!(events.contains(&CoreEvent::OverlayHidden));
        assert!(events.contains(&CoreEvent::SunriseStarted));
        assert_eq!(h.core.brightness().baseline_before_sunrise(), Some(0.6));

        h.core.cancel_alarm();
        assert_eq!(h.brightness.last(), Some(0.6));
    }

    #[test]
    fn test_volume_tick_requires_fired_phase() {
        let mut h = harness(at(7, 0, 0), None);
        assert_eq!(h.core.tick_volume(at(7, 0, 10)), None);
        h.core.set_alarm_at(at(7, 5, 0), at(7, 0, 0)).unwrap();
        assert_eq!(h.core.tick_volume(at(7, 1, 0)), None);
        assert!(h.audio.events().is_empty());
    }

    #[test]
    fn test_describe() {
        let mut h = harness(at(7, 0, 0), None);
        assert_eq!(h.core.describe(at(7, 0, 0)), "No alarm set");
        h.core.set_alarm_at(at(7, 42, 0), at(7, 0, 0)).unwrap();
        assert_eq!(h.core.describe(at(7, 0, 0)), "Armed for 07:42 (42 Minutes)");
    }
}
