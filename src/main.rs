//! Main application entry point.
//!
//! Parses the command line and dispatches:
//! - help and version output
//! - the one-shot `status` and `clear` commands
//! - a normal run through [`SunriseAlarm`]
//! - a simulated run, which installs the simulated clock first

use anyhow::Result;

use sunrise_alarm::args::{CliAction, ParsedArgs};
use sunrise_alarm::commands;
use sunrise_alarm::common::constants::EXIT_FAILURE;
use sunrise_alarm::common::logger::Log;
use sunrise_alarm::config;
use sunrise_alarm::time::simulate::handle_simulate_command;
use sunrise_alarm::{SunriseAlarm, log_error_exit};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            commands::help::display_version();
            Ok(())
        }
        CliAction::ShowHelp => {
            commands::help::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            commands::help::display_help_due_to_error();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::StatusCommand {
            debug_enabled,
            config_dir,
        } => config::set_config_dir(config_dir)
            .and_then(|_| commands::status::handle_status_command(debug_enabled)),
        CliAction::ClearCommand {
            debug_enabled,
            config_dir,
        } => config::set_config_dir(config_dir)
            .and_then(|_| commands::clear::handle_clear_command(debug_enabled)),
        CliAction::Run {
            debug_enabled,
            config_dir,
            alarm_time,
            silent,
        } => config::set_config_dir(config_dir).and_then(|_| {
            SunriseAlarm::new(debug_enabled)
                .with_alarm(alarm_time)
                .silent(silent)
                .run()
        }),
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            alarm_time,
            silent,
            start_time,
            end_time,
            multiplier,
            log_to_file,
        } => config::set_config_dir(config_dir).and_then(|_| {
            let mut guards =
                handle_simulate_command(&start_time, &end_time, multiplier, log_to_file)?;
            let result = SunriseAlarm::new(debug_enabled)
                .with_alarm(alarm_time)
                .silent(silent)
                .without_headers()
                .without_persistence()
                .run();
            guards.complete_simulation();
            result
        }),
    };

    if let Err(e) = result {
        Log::set_enabled(true);
        log_error_exit!("{}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(EXIT_FAILURE);
    }

    Ok(())
}
