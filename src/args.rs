//! Command-line argument parsing and processing.
//!
//! Hand-rolled parser for a small surface:
//!
//! ```text
//! sunrise-alarm [HH:MM | --at "YYYY-MM-DD HH:MM"] [--silent] [--debug] [--config DIR]
//!               [--simulate START END [MULTIPLIER | --fast-forward] [--log]]
//! sunrise-alarm status [--config DIR]
//! sunrise-alarm clear  [--config DIR]
//! ```
//!
//! Problems are reported with `log_warning!` and turn into
//! [`CliAction::ShowHelpDueToError`].

/// What the process should do, decided from the command line.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the alarm, optionally arming it for `alarm_time`
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        alarm_time: Option<String>,
        silent: bool,
    },
    /// Run on a simulated clock between two local timestamps
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        alarm_time: Option<String>,
        silent: bool,
        start_time: String,
        end_time: String,
        multiplier: f64,
        log_to_file: bool,
    },
    /// Show the saved alarm
    StatusCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Remove the saved alarm
    ClearCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    ShowHelp,
    ShowVersion,
    /// Something on the command line was wrong; print usage and exit non-zero
    ShowHelpDueToError,
}

pub struct ParsedArgs {
    pub action: CliAction,
}

/// Default acceleration when `--simulate` is given without a multiplier.
const DEFAULT_SIMULATION_MULTIPLIER: f64 = 60.0;

const SIMULATE_USAGE: &str = "Usage: --simulate \"YYYY-MM-DD HH:MM:SS\" \"YYYY-MM-DD HH:MM:SS\" [multiplier | --fast-forward] [--log]";

/// Shape check for `YYYY-MM-DD HH:MM:SS`; the simulate command does the real parse.
fn looks_like_datetime(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

/// Flags and positionals collected before deciding on an action.
#[derive(Default)]
struct Collected {
    debug_enabled: bool,
    help: bool,
    version: bool,
    silent: bool,
    log_to_file: bool,
    invalid: bool,
    config_dir: Option<String>,
    alarm_time: Option<String>,
    command: Option<String>,
    simulate: Option<(String, String)>,
    multiplier: Option<f64>,
}

impl Collected {
    fn reject(&mut self, message: std::fmt::Arguments<'_>) {
        log_warning!("{message}");
        self.invalid = true;
    }

    /// Consume `START END [MULTIPLIER | --fast-forward]` after `--simulate`.
    fn take_simulate<I>(&mut self, rest: &mut std::iter::Peekable<I>)
    where
        I: Iterator<Item = String>,
    {
        let (Some(start), Some(end)) = (rest.next(), rest.next()) else {
            self.reject(format_args!("--simulate needs a start and an end. {SIMULATE_USAGE}"));
            return;
        };

        for (label, value) in [("start", &start), ("end", &end)] {
            if !looks_like_datetime(value) {
                self.reject(format_args!(
                    "Invalid {label} time '{value}'. Use YYYY-MM-DD HH:MM:SS"
                ));
            }
        }
        if !self.invalid {
            self.simulate = Some((start, end));
        }

        let Some(next) = rest.peek() else { return };
        if next == "--fast-forward" {
            self.multiplier = Some(0.0);
            rest.next();
        } else if let Ok(mult) = next.parse::<f64>() {
            rest.next();
            if (0.1..=3600.0).contains(&mult) {
                self.multiplier = Some(mult);
            } else {
                self.reject(format_args!("Multiplier {mult} is outside 0.1 to 3600"));
            }
        }
    }

    fn into_action(self) -> CliAction {
        let Self {
            debug_enabled,
            help,
            version,
            silent,
            log_to_file,
            invalid,
            config_dir,
            alarm_time,
            command,
            simulate,
            multiplier,
        } = self;

        if version {
            return CliAction::ShowVersion;
        }
        if invalid {
            return CliAction::ShowHelpDueToError;
        }
        if help {
            return CliAction::ShowHelp;
        }

        match (command.as_deref(), simulate) {
            (Some("status"), _) => CliAction::StatusCommand {
                debug_enabled,
                config_dir,
            },
            (Some(_), _) => CliAction::ClearCommand {
                debug_enabled,
                config_dir,
            },
            (None, Some((start_time, end_time))) => CliAction::Simulate {
                debug_enabled,
                config_dir,
                alarm_time,
                silent,
                start_time,
                end_time,
                multiplier: multiplier.unwrap_or(DEFAULT_SIMULATION_MULTIPLIER),
                log_to_file,
            },
            (None, None) => CliAction::Run {
                debug_enabled,
                config_dir,
                alarm_time,
                silent,
            },
        }
    }
}

impl ParsedArgs {
    /// Parse a full argument list, program name first.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collected = Collected::default();
        let mut rest = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .peekable();

        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--help" | "-h" => collected.help = true,
                "--version" | "-V" | "-v" => collected.version = true,
                "--debug" | "-d" => collected.debug_enabled = true,
                "--silent" | "-s" => collected.silent = true,
                "--log" => collected.log_to_file = true,
                "--config" | "-c" => match rest.next_if(|next| !next.starts_with('-')) {
                    Some(dir) => collected.config_dir = Some(dir),
                    None => collected.reject(format_args!("--config needs a directory")),
                },
                "--at" | "-a" => match rest.next() {
                    Some(when) if collected.alarm_time.is_none() => {
                        collected.alarm_time = Some(when)
                    }
                    Some(_) => collected.reject(format_args!("Only one alarm time may be given")),
                    None => collected.reject(format_args!("--at needs \"YYYY-MM-DD HH:MM\"")),
                },
                "--simulate" | "-S" => collected.take_simulate(&mut rest),
                "status" | "clear"
                    if collected.command.is_none() && collected.alarm_time.is_none() =>
                {
                    collected.command = Some(arg);
                }
                flag if flag.starts_with('-') => {
                    collected.reject(format_args!("Unknown option: {flag}"));
                }
                time if time.contains(':')
                    && collected.alarm_time.is_none()
                    && collected.command.is_none() =>
                {
                    collected.alarm_time = Some(arg);
                }
                other => collected.reject(format_args!("Unexpected argument: {other}")),
            }
        }

        ParsedArgs {
            action: collected.into_action(),
        }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::logger::Log;

    fn parse(args: &[&str]) -> CliAction {
        Log::set_enabled(false);
        let mut full = vec!["sunrise-alarm"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    #[test]
    fn test_no_arguments_runs() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                alarm_time: None,
                silent: false,
            }
        );
    }

    #[test]
    fn test_alarm_time_with_flags() {
        assert_eq!(
            parse(&["06:45", "--silent", "-d", "--config", "/tmp/alarm"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/alarm".to_string()),
                alarm_time: Some("06:45".to_string()),
                silent: true,
            }
        );
    }

    #[test]
    fn test_alarm_at_timestamp() {
        assert_eq!(
            parse(&["--at", "2025-01-16 06:45", "-s"]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                alarm_time: Some("2025-01-16 06:45".to_string()),
                silent: true,
            }
        );
        assert_eq!(parse(&["06:45", "--at", "2025-01-16 06:45"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--at"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(
            parse(&["status"]),
            CliAction::StatusCommand {
                debug_enabled: false,
                config_dir: None,
            }
        );
        assert_eq!(
            parse(&["-c", "/tmp/x", "clear"]),
            CliAction::ClearCommand {
                debug_enabled: false,
                config_dir: Some("/tmp/x".to_string()),
            }
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-V", "--help"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_errors_show_help() {
        assert_eq!(parse(&["--bogus"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["snooze"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--config"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["06:45", "07:00"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_simulate_with_multiplier_and_log() {
        assert_eq!(
            parse(&[
                "07:00",
                "--simulate",
                "2025-01-15 06:45:00",
                "2025-01-15 07:10:00",
                "120",
                "--log",
            ]),
            CliAction::Simulate {
                debug_enabled: false,
                config_dir: None,
                alarm_time: Some("07:00".to_string()),
                silent: false,
                start_time: "2025-01-15 06:45:00".to_string(),
                end_time: "2025-01-15 07:10:00".to_string(),
                multiplier: 120.0,
                log_to_file: true,
            }
        );
    }

    #[test]
    fn test_simulate_fast_forward_and_default() {
        match parse(&[
            "--simulate",
            "2025-01-15 06:45:00",
            "2025-01-15 07:10:00",
            "--fast-forward",
        ]) {
            CliAction::Simulate { multiplier, .. } => assert_eq!(multiplier, 0.0),
            other => panic!("unexpected action {other:?}"),
        }
        match parse(&["--simulate", "2025-01-15 06:45:00", "2025-01-15 07:10:00"]) {
            CliAction::Simulate { multiplier, .. } => assert_eq!(multiplier, 60.0),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_simulate_rejects_bad_input() {
        assert_eq!(
            parse(&["--simulate", "tomorrow", "2025-01-15 07:10:00"]),
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            parse(&["--simulate", "2025-01-15 06:45:00", "2025-01-15 07:10:00", "9000"]),
            CliAction::ShowHelpDueToError
        );
        assert_eq!(parse(&["--simulate", "2025-01-15 06:45:00"]), CliAction::ShowHelpDueToError);
    }
}
