//! Unix socket server for the bridge.
//!
//! The accept loop runs on the bridge thread. Each accepted connection gets a
//! short-lived helper thread that reads requests line by line, forwards them to
//! Core and writes back the reply. A `subscribe` request hands the connection
//! back to the accept loop, which from then on only writes events to it.

use anyhow::{Context, Result};
use nix::unistd::getuid;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use super::protocol::{BridgeEvent, BridgeRequest, BridgeResponse};
use crate::constants::{BRIDGE_REPLY_TIMEOUT, SOCKET_FILE_NAME};
use crate::core::RuntimeMessage;

/// Unix socket server handling bridge connections.
pub(super) struct BridgeSocketServer {
    socket_path: PathBuf,
    listener: UnixListener,
    subscribers: HashMap<u32, Subscriber>,
    next_client_id: u32,
    /// Last `scheduled` event per accessory, replayed to new subscribers.
    schedule: HashMap<String, BridgeEvent>,
}

/// A connection that asked for the event stream.
struct Subscriber {
    raw_stream: UnixStream,
    writer: BufWriter<UnixStream>,
    connected_at: Instant,
}

impl BridgeSocketServer {
    /// Bind the socket, replacing a stale socket file if present.
    pub(super) fn new(socket_path: PathBuf) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove existing socket: {socket_path:?}"))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {parent:?}"))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {socket_path:?}"))?;
        listener
            .set_nonblocking(true)
            .context("Failed to set socket to non-blocking mode")?;

        Ok(Self {
            socket_path,
            listener,
            subscribers: HashMap::new(),
            next_client_id: 1,
            schedule: HashMap::new(),
        })
    }

    /// Serve until `running` is cleared, then remove the socket file.
    pub(super) fn run(
        mut self,
        event_receiver: mpsc::Receiver<BridgeEvent>,
        runtime_sender: mpsc::Sender<RuntimeMessage>,
        running: Arc<AtomicBool>,
        debug_enabled: bool,
    ) -> Result<()> {
        if debug_enabled {
            log_debug!("Bridge listening on {:?}", self.socket_path);
        }

        let (handoff_sender, handoff_receiver) = mpsc::channel::<UnixStream>();

        while running.load(Ordering::SeqCst) {
            while let Ok(event) = event_receiver.try_recv() {
                self.broadcast_event(event, debug_enabled)?;
            }

            while let Ok(stream) = handoff_receiver.try_recv() {
                self.add_subscriber(stream, debug_enabled);
            }

            self.accept(&runtime_sender, &handoff_sender, debug_enabled);
            self.prune_subscribers(debug_enabled);

            thread::sleep(Duration::from_millis(10));
        }

        if debug_enabled {
            log_debug!("Bridge shutting down");
        }

        self.cleanup()
    }

    fn broadcast_event(&mut self, event: BridgeEvent, debug_enabled: bool) -> Result<()> {
        let json_line =
            serde_json::to_string(&event).context("Failed to serialize bridge event")?;
        let message = format!("{json_line}\n");

        let mut failed = Vec::new();
        for (client_id, subscriber) in &mut self.subscribers {
            if subscriber.writer.write_all(message.as_bytes()).is_err()
                || subscriber.writer.flush().is_err()
            {
                failed.push(*client_id);
            }
        }
        for client_id in failed {
            self.drop_subscriber(client_id, debug_enabled);
        }

        if let BridgeEvent::Scheduled { ref accessory, .. } = event {
            self.schedule.insert(accessory.clone(), event.clone());
        }
        Ok(())
    }

    fn add_subscriber(&mut self, stream: UnixStream, debug_enabled: bool) {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let writer_stream = match stream
            .set_nonblocking(true)
            .and_then(|()| stream.try_clone())
        {
            Ok(writer_stream) => writer_stream,
            Err(e) => {
                if debug_enabled {
                    log_debug!("Failed to register subscriber {client_id}: {e}");
                }
                return;
            }
        };

        let mut subscriber = Subscriber {
            raw_stream: stream,
            writer: BufWriter::new(writer_stream),
            connected_at: Instant::now(),
        };

        // Bring the newcomer up to date with the armed timers
        for event in self.schedule.values() {
            let Ok(json_line) = serde_json::to_string(event) else {
                continue;
            };
            if writeln!(subscriber.writer, "{json_line}").is_err() {
                return;
            }
        }
        if subscriber.writer.flush().is_err() {
            return;
        }

        self.subscribers.insert(client_id, subscriber);
        if debug_enabled {
            log_debug!("Bridge subscribers: {}", self.subscribers.len());
        }
    }

    fn accept(
        &mut self,
        runtime_sender: &mpsc::Sender<RuntimeMessage>,
        handoff_sender: &mpsc::Sender<UnixStream>,
        debug_enabled: bool,
    ) {
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    let runtime = runtime_sender.clone();
                    let handoff = handoff_sender.clone();
                    let spawned = thread::Builder::new()
                        .name("bridge-connection".to_string())
                        .spawn(move || {
                            if let Err(e) = serve_connection(stream, runtime, handoff)
                                && debug_enabled
                            {
                                log_debug!("Bridge connection closed: {e}");
                            }
                        });
                    if let Err(e) = spawned {
                        log_warning!("Could not serve bridge connection: {e}");
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    if debug_enabled {
                        log_debug!("Error accepting bridge connection: {e}");
                    }
                    break;
                }
            }
        }
    }

    /// Detect closed subscriber connections with a non-blocking read.
    fn prune_subscribers(&mut self, debug_enabled: bool) {
        let mut disconnected = Vec::new();

        for (client_id, subscriber) in &mut self.subscribers {
            let mut buffer = [0u8; 64];
            match subscriber.raw_stream.read(&mut buffer) {
                Ok(0) => disconnected.push(*client_id),
                // Subscribers have nothing more to say; ignore chatter
                Ok(_) => {}
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(_) => disconnected.push(*client_id),
            }
        }

        for client_id in disconnected {
            self.drop_subscriber(client_id, debug_enabled);
        }
    }

    fn drop_subscriber(&mut self, client_id: u32, debug_enabled: bool) {
        if let Some(subscriber) = self.subscribers.remove(&client_id)
            && debug_enabled
        {
            log_debug!(
                "Bridge subscriber left after {}s - subscribers: {}",
                subscriber.connected_at.elapsed().as_secs(),
                self.subscribers.len()
            );
        }
    }

    fn cleanup(&self) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .with_context(|| format!("Failed to remove socket file: {:?}", self.socket_path))?;
        }
        Ok(())
    }
}

/// Request/response loop of one connection.
fn serve_connection(
    stream: UnixStream,
    runtime_sender: mpsc::Sender<RuntimeMessage>,
    handoff_sender: mpsc::Sender<UnixStream>,
) -> Result<()> {
    // Accepted sockets inherit non-blocking mode from the listener on some platforms
    stream
        .set_nonblocking(false)
        .context("Failed to make connection blocking")?;

    let reader = BufReader::new(stream.try_clone().context("Failed to clone stream")?);
    let mut writer = stream.try_clone().context("Failed to clone stream")?;

    for line in reader.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<BridgeRequest>(&line) {
            Ok(request) => request,
            Err(e) => {
                write_response(
                    &mut writer,
                    &BridgeResponse::error(format!("invalid request: {e}")),
                )?;
                continue;
            }
        };

        if request == BridgeRequest::Subscribe {
            write_response(&mut writer, &BridgeResponse::Ok)?;
            handoff_sender
                .send(stream)
                .map_err(|_| anyhow::anyhow!("Bridge server is shutting down"))?;
            return Ok(());
        }

        let response = forward(&runtime_sender, request);
        write_response(&mut writer, &response)?;
    }

    Ok(())
}

/// Hand a request to Core and wait for its reply.
fn forward(runtime_sender: &mpsc::Sender<RuntimeMessage>, request: BridgeRequest) -> BridgeResponse {
    let (reply, reply_receiver) = mpsc::channel();
    if runtime_sender
        .send(RuntimeMessage::Bridge { request, reply })
        .is_err()
    {
        return BridgeResponse::error("daemon is shutting down");
    }

    reply_receiver
        .recv_timeout(BRIDGE_REPLY_TIMEOUT)
        .unwrap_or_else(|_| BridgeResponse::error("timed out waiting for the daemon"))
}

fn write_response(writer: &mut UnixStream, response: &BridgeResponse) -> Result<()> {
    let json_line = serde_json::to_string(response).context("Failed to serialize response")?;
    writeln!(writer, "{json_line}").context("Failed to write response")?;
    writer.flush().context("Failed to flush response")?;
    Ok(())
}

/// Default socket location.
///
/// - Primary: `$XDG_RUNTIME_DIR/suncontact.sock`
/// - Fallback: `/run/user/{uid}/suncontact.sock`
pub fn default_socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_FILE_NAME)
}

/// `$XDG_RUNTIME_DIR`, falling back to the per-user run directory.
pub(crate) fn runtime_dir() -> PathBuf {
    match std::env::var("XDG_RUNTIME_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(format!("/run/user/{}", getuid())),
    }
}
