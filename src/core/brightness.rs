//! Brightness ownership: sunrise baseline, inactivity dimming and filtered sink writes.
//!
//! Two features want the same screen. The sunrise takes it to full brightness and later
//! gives back whatever the user had; the inactivity overlay dims it and lifts it again on
//! interaction. This controller remembers one baseline for each so that neither clobbers
//! the other, and funnels every write through [`BrightnessController::set_brightness_safely`].

use chrono::{DateTime, Duration, Local};

use super::sunrise::sunrise_progress;
use crate::backend::{BrightnessSink, SinkResult};
use crate::common::constants::FULL_BRIGHTNESS;
use crate::common::utils::{clamp_unit, within_epsilon};

pub struct BrightnessController {
    sink: Box<dyn BrightnessSink>,
    current: f64,
    overlay_level: f64,
    baseline_before_sunrise: Option<f64>,
    baseline_before_dim: Option<f64>,
    dimmed: bool,
    last_applied: Option<f64>,
    epsilon: f64,
    dim_level: f64,
    unavailable_logged: bool,
}

impl BrightnessController {
    pub fn new(sink: Box<dyn BrightnessSink>, epsilon: f64, dim_level: f64) -> Self {
        Self {
            sink,
            current: FULL_BRIGHTNESS,
            overlay_level: 0.0,
            baseline_before_sunrise: None,
            baseline_before_dim: None,
            dimmed: false,
            last_applied: None,
            epsilon,
            dim_level: clamp_unit(dim_level),
            unavailable_logged: false,
        }
    }

    /// Clamp and write `value`, skipping writes within epsilon of the last applied one.
    ///
    /// Returns whether the sink accepted a write. An unavailable sink is logged once per
    /// outage and otherwise ignored.
    pub fn set_brightness_safely(&mut self, value: f64) -> bool {
        let value = clamp_unit(value);
        self.current = value;

        if let Some(last) = self.last_applied
            && within_epsilon(last, value, self.epsilon)
        {
            return false;
        }

        match self.sink.write(value) {
            SinkResult::Applied => {
                self.last_applied = Some(value);
                self.unavailable_logged = false;
                true
            }
            SinkResult::Unavailable => {
                if !self.unavailable_logged {
                    log_warning!(
                        "{} brightness control unavailable, keeping current screen level",
                        self.sink.name()
                    );
                    self.unavailable_logged = true;
                }
                false
            }
        }
    }

    /// Remember the pre-sunrise brightness (once per arm cycle) and go to full.
    ///
    /// When the screen is dimmed, or was dimmed until the sunrise window suppressed the
    /// overlay, the level from before dimming is the one worth restoring later.
    pub fn start_sunrise_phase(&mut self) {
        if self.baseline_before_sunrise.is_none() {
            let baseline = self
                .baseline_before_dim
                .take()
                .or_else(|| self.sink.read())
                .or(self.last_applied)
                .unwrap_or(self.current);
            self.baseline_before_sunrise = Some(clamp_unit(baseline));

            #[cfg(debug_assertions)]
            eprintln!("DEBUG: start_sunrise_phase() - baseline {baseline:.3}");
        }
        self.dimmed = false;
        self.baseline_before_dim = None;
        self.set_brightness_safely(FULL_BRIGHTNESS);
    }

    /// Set the overlay level for `now` within the window ending at `alarm_time`.
    pub fn update_sunrise_progress(
        &mut self,
        now: DateTime<Local>,
        alarm_time: DateTime<Local>,
        window: Duration,
    ) -> f64 {
        self.overlay_level = sunrise_progress(now, alarm_time, window);
        self.overlay_level
    }

    pub fn complete_sunrise(&mut self) {
        self.set_brightness_safely(FULL_BRIGHTNESS);
        self.overlay_level = 1.0;
    }

    /// Give back the pre-sunrise brightness, or full brightness if no sunrise began.
    pub fn restore_brightness(&mut self) {
        let target = self
            .baseline_before_sunrise
            .take()
            .unwrap_or(FULL_BRIGHTNESS);
        self.overlay_level = 0.0;
        self.dimmed = false;
        self.baseline_before_dim = None;
        self.set_brightness_safely(target);
    }

    /// Show the inactivity dim: remember the current level once, then drop to `dim_level`.
    pub fn dim(&mut self) {
        if self.dimmed {
            return;
        }
        let level = self
            .last_applied
            .or_else(|| self.sink.read())
            .unwrap_or(self.current);
        self.baseline_before_dim = Some(clamp_unit(level));
        self.dimmed = true;
        self.set_brightness_safely(self.dim_level);
    }

    /// Lift the dim after user interaction. The screen goes to full brightness.
    pub fn undim(&mut self) {
        self.dimmed = false;
        self.baseline_before_dim = None;
        self.set_brightness_safely(FULL_BRIGHTNESS);
    }

    /// Drop the dim because the sunrise window has begun. Nothing is written here; the
    /// pre-dim level is kept for [`Self::start_sunrise_phase`] to use as its baseline.
    pub fn release_dim_for_sunrise(&mut self) {
        self.dimmed = false;
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn overlay_level(&self) -> f64 {
        self.overlay_level
    }

    pub fn is_dimmed(&self) -> bool {
        self.dimmed
    }

    pub fn last_applied(&self) -> Option<f64> {
        self.last_applied
    }

    pub fn baseline_before_sunrise(&self) -> Option<f64> {
        self.baseline_before_sunrise
    }
}
