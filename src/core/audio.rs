//! Alarm audio playback coordination.
//!
//! Wraps the audio sink with the alarm's rules: the session is best-effort, playback
//! starts at the ramp's opening volume, the ramp only runs while sound is actually
//! playing, and interruptions pause without touching the alarm itself.

use chrono::{DateTime, Local};

use super::volume::{VolumeRamp, VolumeSchedule};
use crate::backend::AudioSink;
use crate::common::utils::{percent, within_epsilon};

/// Audio session interruption reported by the host (a call, another app taking focus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Began,
    Ended,
}

pub struct AudioCoordinator {
    sink: Box<dyn AudioSink>,
    ramp: VolumeRamp,
    playing: bool,
    paused_by_interruption: bool,
    last_volume: Option<f64>,
    epsilon: f64,
}

impl AudioCoordinator {
    pub fn new(sink: Box<dyn AudioSink>, schedule: VolumeSchedule, epsilon: f64) -> Self {
        Self {
            sink,
            ramp: VolumeRamp::new(schedule),
            playing: false,
            paused_by_interruption: false,
            last_volume: None,
            epsilon,
        }
    }

    /// Start the alarm sound. Returns whether sound is playing afterwards.
    ///
    /// A failed session activation is logged and playback is attempted anyway. The ramp
    /// only starts when the sink confirms playback.
    pub fn on_alarm_fired(&mut self, now: DateTime<Local>, silent: bool) -> bool {
        if silent {
            log_decorated!("Silent alarm, skipping audio");
            return false;
        }

        if let Err(e) = self.sink.activate() {
            log_warning!("Audio session activation failed: {e}");
            log_indented!("Attempting playback anyway");
        }

        let opening = self.ramp.schedule().start;
        self.apply_volume(opening);

        if self.sink.play() {
            self.playing = true;
            self.ramp.start(now);
            log_decorated!("Alarm sound started at {}", percent(opening));
            true
        } else {
            log_error!("{} failed to start alarm playback", self.sink.name());
            false
        }
    }

    /// Stop playback unconditionally and tear down the ramp.
    pub fn on_cancel(&mut self) {
        self.sink.stop();
        self.ramp.stop();
        self.playing = false;
        self.paused_by_interruption = false;
        self.last_volume = None;
    }

    pub fn on_interruption(&mut self, interruption: Interruption) {
        match interruption {
            Interruption::Began => {
                if self.playing {
                    self.sink.pause();
                    self.playing = false;
                    self.paused_by_interruption = true;
                    log_decorated!("Alarm sound paused by interruption");
                }
            }
            Interruption::Ended => {
                if !self.paused_by_interruption {
                    return;
                }
                self.paused_by_interruption = false;

                if let Err(e) = self.sink.activate() {
                    log_warning!("Could not reactivate audio after interruption: {e}");
                    return;
                }
                if self.sink.play() {
                    self.playing = true;
                    log_decorated!("Alarm sound resumed");
                } else {
                    log_warning!("Alarm sound could not resume after interruption");
                }
            }
        }
    }

    /// Push the ramp's target for `now` to the sink. Returns the volume written, if any.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<f64> {
        if !self.playing {
            return None;
        }
        let target = self.ramp.tick(now)?;
        if self.apply_volume(target) {
            Some(target)
        } else {
            None
        }
    }

    fn apply_volume(&mut self, volume: f64) -> bool {
        if let Some(last) = self.last_volume
            && within_epsilon(last, volume, self.epsilon)
        {
            return false;
        }
        self.sink.set_volume(volume);
        self.last_volume = Some(volume);
        true
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_active()
    }

    pub fn last_volume(&self) -> Option<f64> {
        self.last_volume
    }
}
