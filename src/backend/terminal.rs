//! Log-only sinks.
//!
//! Used when no backlight is available and during simulation, where the point is to
//! watch the ramps in the log rather than on the screen.

use anyhow::Result;

use super::{AudioSink, BrightnessSink, GrantId, HostLifecycle, SinkResult};
use crate::common::utils::percent;

pub struct TerminalBrightness {
    level: Option<f64>,
    debug_enabled: bool,
}

impl TerminalBrightness {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            level: None,
            debug_enabled,
        }
    }
}

impl BrightnessSink for TerminalBrightness {
    fn write(&mut self, value: f64) -> SinkResult {
        self.level = Some(value);
        if self.debug_enabled {
            log_indented!("Brightness → {}", percent(value));
        }
        SinkResult::Applied
    }

    fn read(&self) -> Option<f64> {
        self.level
    }

    fn name(&self) -> &'static str {
        "Terminal"
    }
}

pub struct TerminalAudio {
    playing: bool,
    volume: f64,
    debug_enabled: bool,
}

impl TerminalAudio {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            playing: false,
            volume: 0.0,
            debug_enabled,
        }
    }
}

impl AudioSink for TerminalAudio {
    fn activate(&mut self) -> Result<()> {
        Ok(())
    }

    fn play(&mut self) -> bool {
        if !self.playing {
            self.playing = true;
            log_decorated!("Alarm sound playing at {}", percent(self.volume));
        }
        true
    }

    fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            log_decorated!("Alarm sound paused");
        }
    }

    fn stop(&mut self) {
        if self.playing {
            self.playing = false;
            log_decorated!("Alarm sound stopped");
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        if self.playing || self.debug_enabled {
            log_indented!("Volume → {}", percent(volume));
        }
    }

    fn name(&self) -> &'static str {
        "Terminal"
    }
}

pub struct TerminalHost {
    next_id: u64,
    debug_enabled: bool,
}

impl TerminalHost {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            next_id: 1,
            debug_enabled,
        }
    }
}

impl HostLifecycle for TerminalHost {
    fn begin_background_task(&mut self, name: &str) -> Option<GrantId> {
        let id = GrantId(self.next_id);
        self.next_id += 1;
        if self.debug_enabled {
            log_debug!("Background task '{}' granted (#{})", name, id.0);
        }
        Some(id)
    }

    fn end_background_task(&mut self, id: GrantId) {
        if self.debug_enabled {
            log_debug!("Background task #{} released", id.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::logger::Log;

    #[test]
    fn test_brightness_read_reflects_last_write() {
        Log::set_enabled(false);
        let mut sink = TerminalBrightness::new(false);
        assert_eq!(sink.read(), None);
        assert_eq!(sink.write(0.4), SinkResult::Applied);
        assert_eq!(sink.read(), Some(0.4));
    }

    #[test]
    fn test_host_grants_are_unique() {
        Log::set_enabled(false);
        let mut host = TerminalHost::new(false);
        let a = host.begin_background_task("AlarmTimer");
        let b = host.begin_background_task("AlarmTimer");
        assert!(a.is_some());
        assert_ne!(a, b);
    }
}
