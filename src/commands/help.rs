//! Usage and help output.

/// Display the full usage text
pub fn display_help() {
    log_version!();
    log_block_start!("Usage: sunrise-alarm [HH:MM] [OPTIONS]");
    log_indented!("       sunrise-alarm <COMMAND> [OPTIONS]");
    log_block_start!("Arguments:");
    log_indented!("HH:MM                   Arm the alarm for the next occurrence of this time");
    log_indented!("                        Without it, a saved alarm is restored");
    log_block_start!("Commands:");
    log_indented!("status                  Show the saved alarm and the time left");
    log_indented!("clear                   Remove the saved alarm");
    log_block_start!("Options:");
    log_indented!("-a, --at <datetime>     Arm for a date and time (\"YYYY-MM-DD HH:MM\")");
    log_indented!("-s, --silent            Sunrise only, no alarm sound");
    log_indented!("-c, --config <dir>      Use a custom configuration directory");
    log_indented!("-d, --debug             Enable detailed debug output");
    log_indented!("-S, --simulate <start> <end> [mult | --fast-forward] [--log]");
    log_indented!("                        Run on a simulated clock (\"YYYY-MM-DD HH:MM:SS\")");
    log_indented!("-h, --help              Print help information");
    log_indented!("-V, --version           Print version information");
    log_block_start!("Signals:");
    log_indented!("SIGUSR1                 User interaction, lifts the dim overlay");
    log_indented!("SIGUSR2                 Cancel the alarm");
    log_indented!("SIGTSTP / SIGCONT       Entered background / foreground");
    log_end!();
}

/// Display usage after a parse error
pub fn display_help_due_to_error() {
    log_block_start!("Usage: sunrise-alarm [HH:MM] [OPTIONS]");
    log_indented!("Run 'sunrise-alarm --help' for more information");
    log_end!();
}

/// Display version information
pub fn display_version() {
    log_version!();
    log_end!();
}
