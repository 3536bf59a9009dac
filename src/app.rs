//! Application coordinator that manages the complete lifecycle of a sunrise alarm run.
//!
//! Handles resource acquisition and hands over to the runtime loop:
//! - Configuration loading
//! - Backend detection and sink creation
//! - Signal handler setup
//! - Arming from the command line or restoring a saved alarm
//!
//! `SunriseAlarm` uses a builder so the same path serves normal and simulated runs:
//! - Normal startup: `SunriseAlarm::new(debug_enabled).with_alarm(time).run()`
//! - Simulation: `SunriseAlarm::new(debug_enabled).without_headers().without_persistence().run()`

use anyhow::{Context, Result};

use crate::{
    backend::{create_sinks, detect_backend},
    common::utils::private_path,
    config::{self, Config},
    core::alarm::{AlarmRequest, parse_alarm_request},
    core::runtime::{Runtime, RuntimeParams},
    core::settings::AlarmSettings,
    core::AlarmCore,
    io::signals::setup_signal_handler,
    state::AlarmStore,
};

/// Builder for configuring and running the alarm.
///
/// # Examples
///
/// ```no_run
/// use sunrise_alarm::SunriseAlarm;
///
/// # fn main() -> anyhow::Result<()> {
/// SunriseAlarm::new(false)
///     .with_alarm(Some("06:45".to_string()))
///     .silent(true)
///     .run()?;
/// # Ok(())
/// # }
/// ```
pub struct SunriseAlarm {
    debug_enabled: bool,
    alarm_time: Option<String>,
    silent: bool,
    show_headers: bool,
    persist: bool,
}

impl SunriseAlarm {
    /// Create a new runner with defaults matching a normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            alarm_time: None,
            silent: false,
            show_headers: true,
            persist: true,
        }
    }

    /// Arm for `HH:MM` or `YYYY-MM-DD HH:MM` instead of restoring a saved alarm
    pub fn with_alarm(mut self, alarm_time: Option<String>) -> Self {
        self.alarm_time = alarm_time;
        self
    }

    /// Play no sound when the alarm fires, overriding the config
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Skip header display (the simulation prints its own)
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Neither read nor write the saved alarm
    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Execute the application.
    ///
    /// Loads configuration, builds the sinks, arms the alarm and runs the loop until a
    /// shutdown signal (or the end of a simulation).
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing detailed sink operations");
        }

        // Parse the requested time before touching anything else
        let requested = self
            .alarm_time
            .as_deref()
            .map(parse_alarm_request)
            .transpose()?;

        let config = Config::load().context("Configuration failed")?;

        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", private_path(&custom_dir));
        }
        let config_path = Config::get_config_path().ok();
        config.log_config(config_path.as_deref());

        let backend_type = detect_backend(&config)?;
        log_block_start!("Using {} backend", backend_type.name());
        let sinks = create_sinks(backend_type, self.debug_enabled)?;

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let mut settings = AlarmSettings::from_config(&config);
        settings.silent |= self.silent;

        let store = if self.persist {
            Some(AlarmStore::open_default()?)
        } else {
            None
        };

        let now = crate::time::source::now();
        let core = AlarmCore::new(settings, sinks, now);
        let mut runtime = Runtime::new(
            RuntimeParams {
                core,
                signal_state,
                store,
                debug_enabled: self.debug_enabled,
            },
            now,
        );

        match requested {
            Some(AlarmRequest::TimeOfDay(time_of_day)) => {
                runtime.arm(time_of_day, now)?;
            }
            Some(AlarmRequest::At(target)) => {
                runtime.arm_at(target, now)?;
            }
            None => {
                if runtime.restore_persisted(now)?.is_some() {
                    log_indented!("Restored saved alarm");
                } else {
                    log_block_start!("No alarm set");
                    log_indented!("Pass HH:MM to arm one");
                }
            }
        }

        runtime.execute()
    }
}
