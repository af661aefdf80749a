//! Host bridge: line-delimited JSON over a Unix domain socket.
//!
//! The bridge is the thin stand-in for a home-automation host. Clients read
//! accessory status, write characteristics, trigger identify and subscribe to
//! sensor events. The socket server lives on its own thread and never touches
//! scheduler state: every request is forwarded to the Core event loop as a
//! [`RuntimeMessage`](crate::core::RuntimeMessage) and the connection waits for
//! the reply.
//!
//! Events flow the other way through a [`BridgeNotifier`], whose channel the
//! server drains and fans out to subscribers.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use crate::core::RuntimeMessage;

pub mod client;
pub mod protocol;
mod server;

pub use client::BridgeClient;
pub use protocol::{BridgeEvent, BridgeRequest, BridgeResponse, Characteristic, Setting};
pub use server::default_socket_path;
pub(crate) use server::runtime_dir;

/// Sending half of the event channel, held by Core.
///
/// Sends never block; if the server is gone the event is dropped.
#[derive(Clone)]
pub struct BridgeNotifier {
    event_sender: mpsc::Sender<BridgeEvent>,
}

impl BridgeNotifier {
    /// Create a notifier and the receiver the server drains.
    pub fn new() -> (Self, mpsc::Receiver<BridgeEvent>) {
        let (event_sender, event_receiver) = mpsc::channel();
        (Self { event_sender }, event_receiver)
    }

    pub fn send(&self, event: BridgeEvent) {
        let _ = self.event_sender.send(event);
    }
}

/// Handle to the running socket server thread.
pub struct BridgeServer {
    thread_handle: Option<std::thread::JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl BridgeServer {
    /// Bind the socket and start serving in a background thread.
    ///
    /// Binding happens on the calling thread so that a bad socket path is
    /// reported at startup rather than lost in the server thread.
    pub fn start(
        socket_path: PathBuf,
        event_receiver: mpsc::Receiver<BridgeEvent>,
        runtime_sender: mpsc::Sender<RuntimeMessage>,
        debug_enabled: bool,
    ) -> Result<Self> {
        let socket_server = server::BridgeSocketServer::new(socket_path)
            .context("Failed to create bridge socket server")?;
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let thread_handle = std::thread::Builder::new()
            .name("bridge-server".to_string())
            .spawn(move || {
                if let Err(e) =
                    socket_server.run(event_receiver, runtime_sender, running_clone, debug_enabled)
                {
                    log_pipe!();
                    log_critical!("Bridge server stopped: {e:#}");
                }
            })
            .context("Failed to spawn bridge server thread")?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            running,
        })
    }

    /// Stop the server thread and remove the socket.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("Bridge server thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for BridgeServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
