//! Unix signal handling.
//!
//! Signals are translated into [`SignalMessage`]s on a dedicated thread and delivered
//! to the runtime loop over a channel, so all alarm state is still touched from one
//! thread only.
//!
//! | Signal                   | Meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | SIGINT, SIGTERM, SIGHUP  | shut down (brightness is restored)        |
//! | SIGUSR1                  | user interaction (lifts the dim overlay)  |
//! | SIGUSR2                  | cancel the alarm                          |
//! | SIGTSTP / SIGCONT        | entered background / foreground           |

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGCONT, SIGHUP, SIGINT, SIGTERM, SIGTSTP, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, channel},
    thread,
};

/// Unified signal message type for all signal-based communication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Shutdown signal (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
    /// The user touched the device (SIGUSR1)
    Interaction,
    /// Cancel the armed alarm (SIGUSR2)
    CancelAlarm,
    /// The process was sent to the background (SIGTSTP)
    Background,
    /// The process is in the foreground again (SIGCONT)
    Foreground,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
    /// Channel receiver for signal messages
    pub signal_receiver: Receiver<SignalMessage>,
    /// Channel sender, also used to inject messages in tests
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// Channel and running flag without any OS signal registration.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = channel::<SignalMessage>();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }
}

/// Map a raw signal number to the message it stands for.
pub fn message_for_signal(sig: i32) -> Option<SignalMessage> {
    match sig {
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        SIGUSR1 => Some(SignalMessage::Interaction),
        SIGUSR2 => Some(SignalMessage::CancelAlarm),
        SIGTSTP => Some(SignalMessage::Background),
        SIGCONT => Some(SignalMessage::Foreground),
        _ => None,
    }
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that forwards signals as messages. Shutdown signals
/// also clear the running flag directly so the loop stops even if it is mid-tick.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2, SIGTSTP, SIGCONT])
        .context("failed to register signal handlers")?;

    let running_clone = state.running.clone();
    let signal_sender_clone = state.signal_sender.clone();

    thread::spawn(move || {
        #[cfg(debug_assertions)]
        eprintln!(
            "DEBUG: Signal handler thread starting for PID: {}",
            std::process::id()
        );

        for sig in signals.forever() {
            let Some(message) = message_for_signal(sig) else {
                continue;
            };

            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {sig} → {message:?}");
            }

            if message == SignalMessage::Shutdown {
                running_clone.store(false, Ordering::SeqCst);
                let _ = signal_sender_clone.send(message);
                break;
            }

            if signal_sender_clone.send(message).is_err() {
                #[cfg(debug_assertions)]
                eprintln!("DEBUG: Signal channel disconnected, stopping signal thread");
                break;
            }
        }
    });

    Ok(state)
}
