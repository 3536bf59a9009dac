//! Inactivity dimming.
//!
//! After the idle timeout the screen is dimmed behind an overlay so a bedside display
//! does not light the room all night. Once the sunrise window is near the overlay is
//! suppressed: the sunrise owns the screen from then on.

use chrono::{DateTime, Duration, Local};

/// What the coordinator should do after an inactivity tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactivityAction {
    None,
    ShowOverlay,
    HideOverlay,
}

#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    last_interaction: DateTime<Local>,
    timeout: Duration,
    window: Duration,
    overlay_shown: bool,
}

impl InactivityMonitor {
    pub fn new(now: DateTime<Local>, timeout: Duration, window: Duration) -> Self {
        Self {
            last_interaction: now,
            timeout,
            window,
            overlay_shown: false,
        }
    }

    /// Evaluate idleness at `now`. `alarm_target` is the armed alarm time, if any.
    pub fn tick(
        &mut self,
        now: DateTime<Local>,
        alarm_target: Option<DateTime<Local>>,
    ) -> InactivityAction {
        if let Some(target) = alarm_target
            && now >= target - self.window
        {
            if self.overlay_shown {
                self.overlay_shown = false;
                return InactivityAction::HideOverlay;
            }
            return InactivityAction::None;
        }

        if !self.overlay_shown && now - self.last_interaction > self.timeout {
            self.overlay_shown = true;
            return InactivityAction::ShowOverlay;
        }

        InactivityAction::None
    }

    /// Record an interaction. Returns whether the overlay was showing.
    pub fn user_interacted(&mut self, now: DateTime<Local>) -> bool {
        self.last_interaction = now;
        std::mem::take(&mut self.overlay_shown)
    }

    /// Forget the overlay without counting an interaction.
    pub fn clear_overlay(&mut self) {
        self.overlay_shown = false;
    }

    pub fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }

    pub fn idle_for(&self, now: DateTime<Local>) -> Duration {
        now - self.last_interaction
    }
}
