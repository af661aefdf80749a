//! Command-line command handlers for suncontact.
//!
//! `status`, `set`, `identify` and `watch` are bridge clients: they connect to
//! the running daemon's socket and never touch accessory state themselves.
//! `periods` and `next` work offline from the catalog and the configuration.

pub mod help;
pub mod identify;
pub mod next;
pub mod periods;
pub mod set;
pub mod status;
pub mod watch;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::bridge::{BridgeClient, BridgeResponse};
use crate::config::Config;

/// Socket the daemon listens on for this configuration directory.
///
/// An existing configuration file may move the socket; otherwise the default
/// runtime path is used. The file is never created from a client command.
pub(crate) fn resolve_socket_path(config_dir: Option<&str>) -> Result<PathBuf> {
    let config_path = crate::config::get_config_path(config_dir.map(Path::new))?;
    if config_path.exists() {
        Ok(Config::load_from_path(&config_path)?.socket_path())
    } else {
        Ok(crate::bridge::default_socket_path())
    }
}

/// Connect to the daemon serving this configuration directory.
pub(crate) fn connect(config_dir: Option<&str>) -> Result<BridgeClient> {
    let socket_path = resolve_socket_path(config_dir)?;
    BridgeClient::connect(&socket_path)
}

/// Turn a bridge reply that should be a plain acknowledgement into a result.
pub(crate) fn expect_ok(response: BridgeResponse) -> Result<()> {
    match response {
        BridgeResponse::Ok => Ok(()),
        BridgeResponse::Error { message } => anyhow::bail!("{message}"),
        other => anyhow::bail!("Unexpected reply from daemon: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_socket_path_comes_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::CONFIG_FILE_NAME),
            r#"
socket = "/tmp/suncontact-test.sock"

[[accessory]]
name = "Sunset"
location = [52.52, 13.40]
"#,
        )
        .unwrap();

        let path = resolve_socket_path(dir.path().to_str()).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/suncontact-test.sock"));
    }

    #[test]
    #[serial]
    fn test_socket_path_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_socket_path(dir.path().to_str()).unwrap();

        assert_eq!(path, crate::bridge::default_socket_path());
        assert!(!dir.path().join(crate::constants::CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_expect_ok_surfaces_daemon_errors() {
        assert!(expect_ok(BridgeResponse::Ok).is_ok());

        let err = expect_ok(BridgeResponse::error("persistence failed")).unwrap_err();
        assert_eq!(err.to_string(), "persistence failed");
    }
}
