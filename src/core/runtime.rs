//! Runtime loop: the imperative shell around [`AlarmCore`].
//!
//! Three [`Cadence`]s decide when the sunrise, volume and inactivity ticks are due. The
//! loop sleeps until the nearest one with `recv_timeout` on the signal channel, so a
//! signal wakes it immediately. Under a simulated clock the sleep runs on a helper
//! thread while the channel is polled, since `recv_timeout` only knows real time.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use super::{AlarmCore, CoreEvent};
use crate::common::constants::SIMULATION_POLL_MS;
use crate::common::utils::percent;
use crate::io::signals::{SignalMessage, SignalState};
use crate::state::{AlarmStore, PersistedAlarm};

/// A fixed-interval tick schedule on the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    interval: StdDuration,
    next_due: DateTime<Local>,
}

impl Cadence {
    /// A cadence that is due immediately.
    pub fn new(interval: StdDuration, now: DateTime<Local>) -> Self {
        Self {
            interval,
            next_due: now,
        }
    }

    /// Whether a tick is due at `now`. Consumes the tick and schedules the next one.
    ///
    /// The next tick is measured from `now`, so missed ticks after a stall collapse
    /// into one.
    pub fn due(&mut self, now: DateTime<Local>) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now
            + chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::seconds(1));
        true
    }

    /// Time left until the next tick, zero when overdue.
    pub fn until_due(&self, now: DateTime<Local>) -> StdDuration {
        (self.next_due - now).to_std().unwrap_or(StdDuration::ZERO)
    }
}

/// Everything the runtime needs, assembled by the application entry point.
pub struct RuntimeParams {
    pub core: AlarmCore,
    pub signal_state: SignalState,
    /// `None` disables persistence, e.g. in simulation.
    pub store: Option<AlarmStore>,
    pub debug_enabled: bool,
}

pub struct Runtime {
    core: AlarmCore,
    signal_state: SignalState,
    store: Option<AlarmStore>,
    debug_enabled: bool,
    sunrise: Cadence,
    volume: Cadence,
    inactivity: Cadence,
    last_progress_step: Option<u32>,
    pending_sleep: Option<JoinHandle<()>>,
}

impl Runtime {
    pub fn new(params: RuntimeParams, now: DateTime<Local>) -> Self {
        let settings = params.core.settings().clone();
        Self {
            core: params.core,
            signal_state: params.signal_state,
            store: params.store,
            debug_enabled: params.debug_enabled,
            sunrise: Cadence::new(settings.sunrise_tick, now),
            volume: Cadence::new(settings.volume_tick, now),
            inactivity: Cadence::new(settings.inactivity_tick, now),
            last_progress_step: None,
            pending_sleep: None,
        }
    }

    pub fn core(&self) -> &AlarmCore {
        &self.core
    }

    /// Arm the alarm for `target` and persist it.
    pub fn arm_at(
        &mut self,
        target: DateTime<Local>,
        now: DateTime<Local>,
    ) -> Result<DateTime<Local>> {
        let armed = self.core.set_alarm_at(target, now)?;
        self.persist(armed);
        Ok(armed)
    }

    /// Arm for the next occurrence of a time of day and persist it.
    pub fn arm(
        &mut self,
        time_of_day: chrono::NaiveTime,
        now: DateTime<Local>,
    ) -> Result<DateTime<Local>> {
        let armed = self.core.set_alarm(time_of_day, now)?;
        self.persist(armed);
        Ok(armed)
    }

    /// Re-arm from the saved alarm, if one exists and is still ahead.
    ///
    /// Returns the armed target, or `None` when nothing was restored.
    pub fn restore_persisted(&mut self, now: DateTime<Local>) -> Result<Option<DateTime<Local>>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(saved) = store.load()? else {
            return Ok(None);
        };

        if saved.is_stale(now) {
            log_block_start!(
                "Discarding saved alarm for {} (already passed)",
                saved.target_time.format("%a %H:%M")
            );
            store.clear()?;
            return Ok(None);
        }

        // `--silent` and the config can only add silence to a saved alarm
        let silent = self.core.alarm().silent || saved.silent;
        self.core.set_silent(silent);
        match self.core.set_alarm_at(saved.target_time, now) {
            Ok(target) => Ok(Some(target)),
            Err(e) => {
                log_warning!("Saved alarm rejected: {e}");
                store.clear()?;
                Ok(None)
            }
        }
    }

    /// Run every cadence that is due at `now` and apply the resulting events.
    pub fn run_due_ticks(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        if self.sunrise.due(now) {
            events.extend(self.core.tick_sunrise(now));
        }
        if self.inactivity.due(now) {
            events.extend(self.core.tick_inactivity(now));
        }
        if self.volume.due(now)
            && let Some(volume) = self.core.tick_volume(now)
            && self.debug_enabled
        {
            log_debug!("Alarm volume {}", percent(volume));
        }

        for event in &events {
            self.handle_event(*event);
        }
        events
    }

    /// Apply one signal message to the core.
    pub fn handle_signal_message(&mut self, message: SignalMessage, now: DateTime<Local>) {
        #[cfg(debug_assertions)]
        eprintln!("DEBUG: handle_signal_message({message:?})");

        match message {
            SignalMessage::Shutdown => {
                self.signal_state.running.store(false, Ordering::SeqCst);
            }
            SignalMessage::Interaction => {
                if let Some(CoreEvent::OverlayHidden) = self.core.notify_interaction(now) {
                    self.handle_event(CoreEvent::OverlayHidden);
                }
            }
            SignalMessage::CancelAlarm => {
                self.core.cancel_alarm();
                self.last_progress_step = None;
                self.forget_persisted();
            }
            SignalMessage::Background => {
                self.core.enter_background(now);
                if self.debug_enabled {
                    log_debug!(
                        "Entered background (grant held: {})",
                        self.core.has_background_grant()
                    );
                }
            }
            SignalMessage::Foreground => {
                self.core.enter_foreground();
                if self.debug_enabled {
                    log_debug!("Back in foreground");
                }
            }
        }
    }

    /// Run until shutdown, then hand the screen and audio back.
    pub fn execute(mut self) -> Result<()> {
        log_block_start!("{}", self.core.describe(crate::time::source::now()));

        self.main_loop()?;

        log_block_start!("Shutting down sunrise-alarm...");
        let keep_saved =
            self.store.is_some() && self.core.alarm().is_armed() && !self.core.has_fired();
        self.core.shutdown();
        if keep_saved {
            log_indented!("Alarm is saved and will be restored on next launch");
        }

        if let Some(handle) = self.pending_sleep.take() {
            let _ = handle.join();
        }
        log_end!();
        Ok(())
    }

    fn main_loop(&mut self) -> Result<()> {
        #[cfg(debug_assertions)]
        let mut debug_loop_count: u64 = 0;

        while self.signal_state.running.load(Ordering::SeqCst)
            && !crate::time::source::simulation_ended()
        {
            #[cfg(debug_assertions)]
            {
                debug_loop_count += 1;
                eprintln!("DEBUG: Main loop iteration {debug_loop_count} starting");
            }

            let now = crate::time::source::now();
            self.run_due_ticks(now);

            let sleep_duration = self.sleep_duration(crate::time::source::now());

            let recv_result = if crate::time::source::is_simulated() {
                self.wait_simulated(sleep_duration)
            } else {
                self.signal_state.signal_receiver.recv_timeout(sleep_duration)
            };

            match recv_result {
                Ok(message) => {
                    self.handle_signal_message(message, crate::time::source::now());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if self.signal_state.running.load(Ordering::SeqCst) {
                        log_pipe!();
                        log_error!("Signal handler disconnected unexpectedly");
                        log_indented!("Signals will no longer be processed");
                        // Avoid spinning on a dead channel
                        crate::time::source::sleep(sleep_duration);
                    }
                }
            }
        }

        Ok(())
    }

    /// Sleep on the simulated clock while still listening for signals.
    ///
    /// A sleep cut short by a signal keeps running; the next wait resumes it instead of
    /// starting a second one, so simulated time never advances twice.
    fn wait_simulated(&mut self, duration: StdDuration) -> Result<SignalMessage, RecvTimeoutError> {
        let handle = match self.pending_sleep.take() {
            Some(handle) => handle,
            None => std::thread::spawn(move || crate::time::source::sleep(duration)),
        };

        loop {
            match self
                .signal_state
                .signal_receiver
                .recv_timeout(StdDuration::from_millis(SIMULATION_POLL_MS))
            {
                Ok(message) => {
                    self.pending_sleep = Some(handle);
                    return Ok(message);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if handle.is_finished() {
                        let _ = handle.join();
                        return Err(RecvTimeoutError::Timeout);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let _ = handle.join();
                    return Err(RecvTimeoutError::Disconnected);
                }
            }
        }
    }

    /// Time until the nearest cadence is due.
    pub fn sleep_duration(&self, now: DateTime<Local>) -> StdDuration {
        self.sunrise
            .until_due(now)
            .min(self.volume.until_due(now))
            .min(self.inactivity.until_due(now))
    }

    fn handle_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::SunriseStarted => {
                log_block_start!("Sunrise started");
                if let Some(target) = self.core.target() {
                    log_indented!("Alarm at {}", target.format("%H:%M"));
                }
                self.last_progress_step = None;
            }
            CoreEvent::SunriseProgress(progress) => {
                let step = (progress * 10.0).floor() as u32;
                if self.last_progress_step != Some(step) {
                    self.last_progress_step = Some(step);
                    log_decorated!("Sunrise {}", percent(progress));
                }
            }
            CoreEvent::AlarmFired { at } => {
                log_block_start!("Alarm fired at {}", at.format("%H:%M:%S"));
                self.forget_persisted();
            }
            CoreEvent::OverlayShown => {
                if self.debug_enabled {
                    log_debug!("Screen dimmed after inactivity");
                }
            }
            CoreEvent::OverlayHidden => {
                if self.debug_enabled {
                    log_debug!("Dim overlay lifted");
                }
            }
            CoreEvent::GrantExpired => {
                log_warning!("Background execution grant expired");
                log_indented!("The alarm may be delayed until the process is resumed");
            }
        }
    }

    fn persist(&self, target: DateTime<Local>) {
        let Some(store) = &self.store else {
            return;
        };
        let record = PersistedAlarm {
            target_time: target,
            silent: self.core.alarm().silent,
        };
        if let Err(e) = store.save(&record) {
            log_warning!("Could not save alarm: {e}");
        }
    }

    fn forget_persisted(&self) {
        if let Some(store) = &self.store
            && let Err(e) = store.clear()
        {
            log_warning!("Could not remove saved alarm: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Sinks;
    use crate::backend::recording::{AudioEvent, AudioRecorder, BrightnessRecorder, HostRecorder};
    use crate::common::logger::Log;
    use crate::core::settings::AlarmSettings;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, h, m, s).single().unwrap()
    }

    fn runtime(now: DateTime<Local>, store: Option<AlarmStore>) -> (Runtime, AudioRecorder) {
        runtime_with(AlarmSettings::default(), now, store)
    }

    fn runtime_with(
        settings: AlarmSettings,
        now: DateTime<Local>,
        store: Option<AlarmStore>,
    ) -> (Runtime, AudioRecorder) {
        Log::set_enabled(false);
        let audio = AudioRecorder::new();
        let sinks = Sinks {
            brightness: BrightnessRecorder::new(Some(0.5)).sink(),
            audio: audio.sink(),
            host: HostRecorder::new().host(),
        };
        let core = AlarmCore::new(settings, sinks, now);
        let rt = Runtime::new(
            RuntimeParams {
                core,
                signal_state: SignalState::detached(),
                store,
                debug_enabled: false,
            },
            now,
        );
        (rt, audio)
    }

    #[test]
    fn test_cadence() {
        let start = at(7, 0, 0);
        let mut cadence = Cadence::new(StdDuration::from_secs(5), start);
        assert!(cadence.due(start));
        assert!(!cadence.due(start + Duration::seconds(4)));
        assert_eq!(
            cadence.until_due(start + Duration::seconds(4)),
            StdDuration::from_secs(1)
        );
        assert!(cadence.due(start + Duration::seconds(5)));
        // A long stall yields one tick, not a burst
        assert!(cadence.due(start + Duration::seconds(60)));
        assert!(!cadence.due(start + Duration::seconds(61)));
        assert_eq!(cadence.until_due(start + Duration::seconds(90)), StdDuration::ZERO);
    }

    #[test]
    fn test_sleep_duration_is_nearest_cadence() {
        let now = at(7, 0, 0);
        let (mut rt, _) = runtime(now, None);
        rt.run_due_ticks(now);
        // Inactivity ticks every second
        assert_eq!(
            rt.sleep_duration(now + Duration::milliseconds(200)),
            StdDuration::from_millis(800)
        );
    }

    #[test]
    fn test_arm_persists_and_fire_clears() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::in_dir(dir.path());
        let now = at(7, 59, 0);
        let (mut rt, audio) = runtime(now, Some(store.clone()));

        rt.arm_at(at(8, 0, 0), now).unwrap();
        assert_eq!(store.load().unwrap().unwrap().target_time, at(8, 0, 0));

        let mut t = now;
        while t <= at(8, 0, 10) {
            rt.run_due_ticks(t);
            t += Duration::seconds(1);
        }

        assert!(rt.core().has_fired());
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(audio.count(&AudioEvent::Play), 1);
    }

    #[test]
    fn test_cancel_signal_clears_store() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::in_dir(dir.path());
        let now = at(6, 0, 0);
        let (mut rt, _) = runtime(now, Some(store.clone()));

        rt.arm_at(at(8, 0, 0), now).unwrap();
        rt.handle_signal_message(SignalMessage::CancelAlarm, now);
        assert!(!rt.core().alarm().is_armed());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_restore_persisted() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::in_dir(dir.path());
        store
            .save(&PersistedAlarm {
                target_time: at(8, 0, 0),
                silent: true,
            })
            .unwrap();

        let (mut rt, _) = runtime(at(6, 0, 0), Some(store.clone()));
        assert_eq!(rt.restore_persisted(at(6, 0, 0)).unwrap(), Some(at(8, 0, 0)));
        assert!(rt.core().alarm().silent);
    }

    #[test]
    fn test_restored_alarm_keeps_silent_override() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::in_dir(dir.path());
        store
            .save(&PersistedAlarm {
                target_time: at(8, 0, 0),
                silent: false,
            })
            .unwrap();

        let settings = AlarmSettings {
            silent: true,
            ..AlarmSettings::default()
        };
        let (mut rt, audio) = runtime_with(settings, at(7, 59, 0), Some(store));
        assert_eq!(rt.restore_persisted(at(7, 59, 0)).unwrap(), Some(at(8, 0, 0)));
        assert!(rt.core().alarm().silent);

        let mut t = at(7, 59, 0);
        while t <= at(8, 0, 10) {
            rt.run_due_ticks(t);
            t += Duration::seconds(1);
        }
        assert!(rt.core().has_fired());
        assert_eq!(audio.count(&AudioEvent::Play), 0);
    }

    #[test]
    fn test_stale_persisted_alarm_is_discarded() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::in_dir(dir.path());
        store
            .save(&PersistedAlarm {
                target_time: at(8, 0, 0),
                silent: false,
            })
            .unwrap();

        let (mut rt, _) = runtime(at(9, 0, 0), Some(store.clone()));
        assert_eq!(rt.restore_persisted(at(9, 0, 0)).unwrap(), None);
        assert!(!rt.core().alarm().is_armed());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_shutdown_signal_stops_loop() {
        let (mut rt, _) = runtime(at(6, 0, 0), None);
        rt.handle_signal_message(SignalMessage::Shutdown, at(6, 0, 0));
        assert!(!rt.signal_state.running.load(Ordering::SeqCst));
    }
}
