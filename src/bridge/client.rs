//! Bridge client used by the CLI subcommands.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use super::protocol::{BridgeEvent, BridgeRequest, BridgeResponse};
use crate::constants::BRIDGE_REPLY_TIMEOUT;

/// Connection to a running daemon.
pub struct BridgeClient {
    stream: UnixStream,
    reader: BufReader<UnixStream>,
}

impl BridgeClient {
    pub fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).with_context(|| {
            format!(
                "Failed to connect to suncontact at {}. Is the daemon running?",
                socket_path.display()
            )
        })?;

        stream
            .set_read_timeout(Some(BRIDGE_REPLY_TIMEOUT * 2))
            .context("Failed to set read timeout on bridge socket")?;

        let reader_stream = stream
            .try_clone()
            .context("Failed to clone stream for reader")?;

        Ok(Self {
            stream,
            reader: BufReader::new(reader_stream),
        })
    }

    /// Send one request and wait for its response.
    pub fn request(&mut self, request: &BridgeRequest) -> Result<BridgeResponse> {
        let json_line = serde_json::to_string(request).context("Failed to serialize request")?;
        self.send_raw(&json_line)
    }

    /// Send a pre-encoded request line and wait for its response.
    pub fn send_raw(&mut self, line: &str) -> Result<BridgeResponse> {
        writeln!(self.stream, "{line}").context("Failed to send request")?;
        self.stream.flush().context("Failed to flush request")?;

        let reply = self.read_line()?;
        serde_json::from_str(&reply)
            .with_context(|| format!("Failed to parse bridge response: {reply}"))
    }

    /// Switch this connection to event streaming.
    ///
    /// Read timeouts are lifted since events may be hours apart.
    pub fn subscribe(&mut self) -> Result<()> {
        match self.request(&BridgeRequest::Subscribe)? {
            BridgeResponse::Ok => {}
            BridgeResponse::Error { message } => anyhow::bail!("Subscription refused: {message}"),
            other => anyhow::bail!("Unexpected reply to subscribe: {other:?}"),
        }

        self.stream
            .set_read_timeout(None)
            .context("Failed to clear read timeout")?;
        Ok(())
    }

    /// Block until the next event arrives.
    pub fn next_event(&mut self) -> Result<BridgeEvent> {
        let line = self.read_line()?;
        serde_json::from_str(&line).with_context(|| format!("Failed to parse bridge event: {line}"))
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .context("Failed to read from bridge socket")?;

        let line = line.trim();
        if line.is_empty() {
            anyhow::bail!("Connection closed by daemon");
        }
        Ok(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_without_daemon_fails_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let result = BridgeClient::connect(&dir.path().join("absent.sock"));

        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("Is the daemon running?"));
    }
}
