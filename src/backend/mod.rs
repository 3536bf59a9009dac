//! Output abstraction layer for brightness, alarm audio and host lifecycle.
//!
//! The alarm core never touches hardware directly. It talks to three traits:
//!
//! - [`BrightnessSink`]: writes and reads the display brightness as a fraction in `[0, 1]`
//! - [`AudioSink`]: looped alarm playback with a volume control
//! - [`HostLifecycle`]: time-limited background execution grants
//!
//! ## Backend Selection
//!
//! - **Auto-detection**: uses the sysfs backlight when a writable device exists, otherwise
//!   falls back to the terminal backend
//! - **Explicit configuration**: `backend = "backlight"` or `backend = "terminal"`
//!
//! Sinks are best-effort. A sink that cannot apply a value reports it and the core carries
//! on; nothing here is allowed to stop an alarm from firing.

use anyhow::Result;
use std::path::Path;

use crate::common::constants::BACKLIGHT_ROOT;
use crate::config::{Backend, Config};

pub mod backlight;
pub mod terminal;

#[cfg(any(test, feature = "testing-support"))]
pub mod recording;

/// Outcome of a brightness write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkResult {
    Applied,
    /// The capability is missing or refused the write. Logged once by the caller.
    Unavailable,
}

/// Handle for an active background execution grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrantId(pub u64);

/// Display brightness output.
#[cfg_attr(test, mockall::automock)]
pub trait BrightnessSink {
    /// Apply a brightness fraction. Values are already clamped to `[0, 1]`.
    fn write(&mut self, value: f64) -> SinkResult;

    /// Current brightness as reported by the device, if it can be read.
    fn read(&self) -> Option<f64>;

    fn name(&self) -> &'static str;
}

/// Alarm audio output.
#[cfg_attr(test, mockall::automock)]
pub trait AudioSink {
    /// Activate the playback session (route, focus). May fail; callers still try to play.
    fn activate(&mut self) -> Result<()>;

    /// Start or resume looped playback. Returns whether playback actually started.
    fn play(&mut self) -> bool;

    fn pause(&mut self);

    fn stop(&mut self);

    /// Set playback volume as a fraction in `[0, 1]`.
    fn set_volume(&mut self, volume: f64);

    fn name(&self) -> &'static str;
}

/// Host process lifecycle: background execution grants.
#[cfg_attr(test, mockall::automock)]
pub trait HostLifecycle {
    /// Request a background execution grant. `None` when the host refuses.
    fn begin_background_task(&mut self, name: &str) -> Option<GrantId>;

    fn end_background_task(&mut self, id: GrantId);
}

/// The three outputs the alarm core drives.
pub struct Sinks {
    pub brightness: Box<dyn BrightnessSink>,
    pub audio: Box<dyn AudioSink>,
    pub host: Box<dyn HostLifecycle>,
}

/// Enumeration of available backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Linux sysfs backlight for brightness, terminal output for audio and host
    Backlight,
    /// Log-only output for everything
    Terminal,
}

impl BackendType {
    /// Get the human-readable name for this backend type.
    pub fn name(&self) -> &'static str {
        match self {
            BackendType::Backlight => "Backlight",
            BackendType::Terminal => "Terminal",
        }
    }
}

/// Detect the appropriate backend from configuration and the current system.
///
/// Simulated runs always use the terminal backend so that a simulation never
/// changes the real screen.
///
/// # Errors
/// Returns an error when `backend = "backlight"` is configured but no backlight
/// device exists.
pub fn detect_backend(config: &Config) -> Result<BackendType> {
    detect_backend_in(config, Path::new(BACKLIGHT_ROOT))
}

pub(crate) fn detect_backend_in(config: &Config, backlight_root: &Path) -> Result<BackendType> {
    if crate::time::source::is_simulated() {
        return Ok(BackendType::Terminal);
    }

    match config.backend.unwrap_or(Backend::Auto) {
        Backend::Auto => {
            if backlight::find_device(backlight_root).is_some() {
                Ok(BackendType::Backlight)
            } else {
                #[cfg(debug_assertions)]
                eprintln!("DEBUG: detect_backend() - no backlight device, using terminal");
                Ok(BackendType::Terminal)
            }
        }
        Backend::Backlight => {
            if backlight::find_device(backlight_root).is_none() {
                anyhow::bail!(
                    "Configuration specifies backend=\"backlight\" but no device was found under {}",
                    backlight_root.display()
                );
            }
            Ok(BackendType::Backlight)
        }
        Backend::Terminal => Ok(BackendType::Terminal),
    }
}

/// Create the sinks for a backend type.
///
/// # Errors
/// Returns an error if the backlight device cannot be opened.
pub fn create_sinks(backend_type: BackendType, debug_enabled: bool) -> Result<Sinks> {
    let brightness: Box<dyn BrightnessSink> = match backend_type {
        BackendType::Backlight => {
            Box::new(backlight::BacklightSink::discover(Path::new(BACKLIGHT_ROOT))?)
        }
        BackendType::Terminal => Box::new(terminal::TerminalBrightness::new(debug_enabled)),
    };

    Ok(Sinks {
        brightness,
        audio: Box::new(terminal::TerminalAudio::new(debug_enabled)),
        host: Box::new(terminal::TerminalHost::new(debug_enabled)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_terminal_backend() {
        let config = Config {
            backend: Some(Backend::Terminal),
            ..Config::default()
        };
        let root = tempdir().unwrap();
        assert_eq!(
            detect_backend_in(&config, root.path()).unwrap(),
            BackendType::Terminal
        );
    }

    #[test]
    fn test_auto_without_device_falls_back_to_terminal() {
        let root = tempdir().unwrap();
        assert_eq!(
            detect_backend_in(&Config::default(), root.path()).unwrap(),
            BackendType::Terminal
        );
    }

    #[test]
    fn test_auto_with_device_selects_backlight() {
        let root = tempdir().unwrap();
        let device = root.path().join("intel_backlight");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("brightness"), "100\n").unwrap();
        fs::write(device.join("max_brightness"), "200\n").unwrap();

        assert_eq!(
            detect_backend_in(&Config::default(), root.path()).unwrap(),
            BackendType::Backlight
        );
    }

    #[test]
    fn test_explicit_backlight_without_device_is_error() {
        let config = Config {
            backend: Some(Backend::Backlight),
            ..Config::default()
        };
        let root = tempdir().unwrap();
        assert!(detect_backend_in(&config, root.path()).is_err());
    }
}
