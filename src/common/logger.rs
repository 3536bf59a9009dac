//! Structured logging system with visual formatting.
//!
//! Every line the alarm prints goes through this module so that the output keeps a
//! consistent box-drawing layout. Logging can be switched off at runtime for quiet
//! operation (tests, status queries), and routed to a file while a simulation runs.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

// Use an AtomicBool instead of thread_local for thread safety
static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Option<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Main logging interface providing structured output formatting.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`**: opens a new conceptual block (arming, sunrise entry, firing).
///   Prints an empty pipe `┃` for spacing, then `┣ message`.
/// - **`log_decorated!`**: a line belonging to the current block, `┣ message`.
/// - **`log_indented!`**: nested details under a block, `┃   message`.
/// - **`log_pipe!`**: a single empty `┃` line, used before a semantic level macro
///   that starts its own block.
/// - **`log_version!`** / **`log_end!`**: startup header and final `╹` marker.
/// - **`log_warning!`, `log_error!`, `log_debug!`**: semantic
///   `[LEVEL]` lines outside of the box-drawing flow.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Start file logging to the specified path.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(Some(tx.clone()))
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix shown while running on simulated time.
    ///
    /// Returns `[HH:MM:SS] ` of the simulated clock, or an empty string when the
    /// real clock is in use. Public for macro access.
    pub fn get_timestamp_prefix() -> String {
        // Check this without initializing the time source
        if crate::time::source::is_initialized() && crate::time::source::is_simulated() {
            format!("[{}] ", crate::time::source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        // LOG_CHANNEL stays set; OnceLock can only be set once per process
    }
}

// Strip ANSI color codes so file output stays readable
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next(); // consume '['
                for ch in chars.by_ref() {
                    if ch == 'm' {
                        break;
                    }
                }
            } else {
                result.push(ch);
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route one finished line to stdout, or to the log file while `--log` is active.
pub fn write_output(text: &str) {
    if let Some(Some(tx)) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Shape of a log line: its leading glyph and whether it opens a new block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Block,
    Decorated,
    Indented,
    Level(Level),
    /// Error that ends the flow with `┗`.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Warning,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Debug => "\x1b[32mDEBUG\x1b[0m",
            Level::Warning => "\x1b[33mWARNING\x1b[0m",
            Level::Error => "\x1b[31mERROR\x1b[0m",
        }
    }
}

/// Render `message` in the given shape. Called by the logging macros.
pub fn emit(line: Line, message: std::fmt::Arguments<'_>) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    write_output(&render(&prefix, line, &message.to_string()));
}

fn render(prefix: &str, line: Line, message: &str) -> String {
    match line {
        Line::Block => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Line::Decorated => format!("{prefix}┣ {message}\n"),
        Line::Indented => format!("{prefix}┃   {message}\n"),
        Line::Level(level) => format!("{prefix}┣[{}] {message}\n", level.tag()),
        Line::Exit => format!("{prefix}┃\n{prefix}┗[{}] {message}\n", Level::Error.tag()),
    }
}

// # Logging Macros
//
// Each takes either a format string with arguments or a single displayable expression.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($line:expr, $fmt:literal $($arg:tt)*) => {
        $crate::common::logger::emit($line, format_args!($fmt $($arg)*))
    };
    ($line:expr, $expr:expr) => {
        $crate::common::logger::emit($line, format_args!("{}", $expr))
    };
}

/// Open a new conceptual block: an empty `┃` then `┣ message`.
#[macro_export]
macro_rules! log_block_start {
    ($($t:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Block, $($t)+) };
}

/// A line inside the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($t:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Decorated, $($t)+) };
}

/// Nested detail under a block.
#[macro_export]
macro_rules! log_indented {
    ($($t:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Indented, $($t)+) };
}

/// A lone `┃` for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Startup header with the package version.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let version = env!("CARGO_PKG_VERSION");
            $crate::common::logger::write_output(&format!(
                "{prefix}┏ sunrise-alarm v{version} ━━╸\n"
            ));
        }
    }};
}

/// Final `╹` marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

#[macro_export]
macro_rules! log_warning {
    ($($t:tt)+) => {
        $crate::__log_line!(
            $crate::common::logger::Line::Level($crate::common::logger::Level::Warning),
            $($t)+
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)+) => {
        $crate::__log_line!(
            $crate::common::logger::Line::Level($crate::common::logger::Level::Error),
            $($t)+
        )
    };
}

/// Error that terminates the current flow, closing the box with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($($t:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Exit, $($t)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($t:tt)+) => {
        $crate::__log_line!(
            $crate::common::logger::Line::Level($crate::common::logger::Level::Debug),
            $($t)+
        )
    };
}
