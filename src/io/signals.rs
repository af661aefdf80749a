//! Signal handling for the daemon.
//!
//! SIGINT, SIGTERM and SIGHUP are turned into a [`RuntimeMessage::Shutdown`]
//! on the Core channel, so shutdown is processed between two event loop
//! iterations like any other message.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::sync::mpsc::Sender;
use std::thread;

use crate::core::RuntimeMessage;

/// Human-readable description of a shutdown signal.
fn describe(signal: i32, debug_enabled: bool) -> &'static str {
    match signal {
        SIGINT if debug_enabled => "Received SIGINT (Ctrl+C), shutting down...",
        SIGINT => "Received interrupt signal, shutting down...",
        SIGTERM => "Received termination request, shutting down...",
        SIGHUP => "Received hangup signal, shutting down...",
        _ => "Received signal, shutting down...",
    }
}

/// Register the handlers and forward the first shutdown signal to Core.
pub fn setup_signal_handler(sender: Sender<RuntimeMessage>, debug_enabled: bool) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                log_pipe!();
                log_info!("{}", describe(signal, debug_enabled));

                if let Err(e) = sender.send(RuntimeMessage::Shutdown) {
                    log_warning!("Failed to send shutdown message: {e}");
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_descriptions() {
        assert!(describe(SIGINT, true).contains("Ctrl+C"));
        assert!(!describe(SIGINT, false).contains("Ctrl+C"));
        assert!(describe(SIGTERM, false).contains("termination"));
        assert!(describe(SIGHUP, false).contains("hangup"));
    }
}
