//! Implementation of `--simulate` for watching a full sunrise on accelerated time.
//!
//! The command installs a [`SimulatedTimeSource`] before the runtime starts, so the
//! regular alarm loop runs unchanged while the clock races ahead. With `--log` every
//! line after the header is written to a file instead of the terminal.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use std::sync::Arc;

use crate::common::logger::{Log, LoggerGuard};
use crate::time::source::{SimulatedTimeSource, parse_datetime};

/// Resources that must stay alive until the simulation finishes.
pub struct SimulationGuards {
    logger_guard: Option<LoggerGuard>,
    log_to_file: bool,
}

impl SimulationGuards {
    /// Flush file logging and print a closing line on the terminal.
    pub fn complete_simulation(&mut self) {
        if self.log_to_file {
            drop(self.logger_guard.take());
            println!("┣ Simulation complete");
            println!("╹");
        }
    }
}

/// Parse the simulation bounds and install the simulated clock.
///
/// # Arguments
/// * `start_time` / `end_time` - "YYYY-MM-DD HH:MM:SS" in local time
/// * `multiplier` - acceleration factor; `0.0` fast-forwards through every sleep
/// * `log_to_file` - route output to `sunrise-alarm-simulation-<stamp>.log`
pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    multiplier: f64,
    log_to_file: bool,
) -> Result<SimulationGuards> {
    let start = parse_datetime(start_time).map_err(|e| anyhow!("Invalid start time: {e}"))?;
    let end = parse_datetime(end_time).map_err(|e| anyhow!("Invalid end time: {e}"))?;

    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    log_version!();
    log_block_start!("Simulation Mode");
    log_simulation_details(start, end, multiplier);

    let source = Arc::new(SimulatedTimeSource::new(start, end, multiplier));

    let logger_guard = if log_to_file {
        let log_filename = format!(
            "sunrise-alarm-simulation-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        log_block_start!("Logging simulation output to: {}", log_filename);

        crate::time::source::init_time_source(source);
        let guard = Log::start_file_logging(log_filename)?;

        // Repeat the header inside the file, now with simulated timestamps
        log_version!();
        log_block_start!("Simulation Mode");
        Some(guard)
    } else {
        crate::time::source::init_time_source(source);
        None
    };

    Ok(SimulationGuards {
        logger_guard,
        log_to_file,
    })
}

fn log_simulation_details(start: DateTime<Local>, end: DateTime<Local>, multiplier: f64) {
    log_indented!("Start: {}", start.format("%Y-%m-%d %H:%M:%S"));
    log_indented!("End:   {}", end.format("%Y-%m-%d %H:%M:%S"));
    if multiplier == 0.0 {
        log_indented!("Speed: fast-forward");
    } else {
        log_indented!("Speed: {}x", multiplier);
    }
}
