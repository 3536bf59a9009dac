//! Alarm volume ramp.
//!
//! Starts quiet and climbs linearly: `start + (elapsed / interval) * step`, capped at 1.0.
//! With the defaults that is 10% at the first second, 55% after 90 s and 100% at 180 s.
//! Past the cap the ramp is finished and stops producing targets.

use chrono::{DateTime, Duration, Local};

/// Shape of the ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSchedule {
    pub start: f64,
    pub step: f64,
    pub interval: Duration,
    pub cap: Duration,
    /// Advance in whole intervals instead of continuously.
    pub stepped: bool,
}

impl VolumeSchedule {
    /// Target volume `elapsed` after the alarm started playing.
    pub fn volume_at(&self, elapsed: Duration) -> f64 {
        if elapsed <= Duration::zero() {
            return self.start.clamp(0.0, 1.0);
        }
        if elapsed > self.cap {
            return 1.0;
        }

        let interval_ms = self.interval.num_milliseconds().max(1) as f64;
        let mut intervals = elapsed.num_milliseconds() as f64 / interval_ms;
        if self.stepped {
            intervals = intervals.floor();
        }
        (self.start + intervals * self.step).clamp(0.0, 1.0)
    }
}

/// Running ramp state.
#[derive(Debug, Clone)]
pub struct VolumeRamp {
    schedule: VolumeSchedule,
    started_at: Option<DateTime<Local>>,
    finished: bool,
}

impl VolumeRamp {
    pub fn new(schedule: VolumeSchedule) -> Self {
        Self {
            schedule,
            started_at: None,
            finished: false,
        }
    }

    /// Begin the ramp at `now` and return the opening volume.
    pub fn start(&mut self, now: DateTime<Local>) -> f64 {
        self.started_at = Some(now);
        self.finished = false;
        self.schedule.volume_at(Duration::zero())
    }

    /// Target volume for `now`, or `None` when idle or already finished.
    ///
    /// The first tick past the cap yields 1.0 once, then the ramp goes quiet.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<f64> {
        let started_at = self.started_at?;
        if self.finished {
            return None;
        }

        let elapsed = now - started_at;
        if elapsed > self.schedule.cap {
            self.finished = true;
            return Some(1.0);
        }
        Some(self.schedule.volume_at(elapsed))
    }

    /// Tear the ramp down. The sink volume is left where it is.
    pub fn stop(&mut self) {
        self.started_at = None;
        self.finished = false;
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some() && !self.finished
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn schedule(&self) -> &VolumeSchedule {
        &self.schedule
    }
}
