//! Lock file management for single-instance enforcement.
//!
//! Two daemons writing the same accessory state files would race each other,
//! so the daemon holds an exclusive `flock` on
//! `$XDG_RUNTIME_DIR/suncontact.lock` for its whole lifetime. The kernel drops
//! the lock when the process dies, so a leftover file is never a stale lock.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::LOCK_FILE_NAME;

/// Exclusive lock held for the life of the value.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Try to take the lock without blocking.
    ///
    /// Returns `Ok(None)` if another process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create lock directory {}", parent.display()))?;
        }

        // Open without truncating so a running holder's PID stays readable
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(_) => Ok(None),
        }
    }

    /// Replace the lock file contents with `contents`.
    pub fn write(&mut self, contents: &str) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(contents.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Default lock path in the runtime directory.
pub fn get_main_lock_path() -> PathBuf {
    crate::bridge::runtime_dir().join(LOCK_FILE_NAME)
}

/// Take the daemon lock, failing with a descriptive error when another
/// instance is running.
///
/// The lock records our PID and the state directory in use.
pub fn ensure_single_instance(lock_path: &Path, state_dir: &Path) -> Result<LockFile> {
    match LockFile::try_acquire(lock_path)? {
        Some(mut lock) => {
            lock.write(&format!("{}\n{}\n", std::process::id(), state_dir.display()))
                .context("Failed to write lock file")?;
            Ok(lock)
        }
        None => {
            let holder = std::fs::read_to_string(lock_path)
                .ok()
                .and_then(|content| content.lines().next().map(str::to_string))
                .filter(|pid| !pid.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            anyhow::bail!(
                "suncontact is already running (PID: {holder}); stop it or use `suncontact status`"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let first = ensure_single_instance(&path, dir.path()).unwrap();
        let contents = std::fs::read_to_string(first.path()).unwrap();
        assert_eq!(
            contents.lines().next(),
            Some(std::process::id().to_string().as_str())
        );

        let err = ensure_single_instance(&path, dir.path()).unwrap_err();
        assert!(err.to_string().contains("already running"));
    }

    #[test]
    fn test_drop_releases_and_removes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let lock = LockFile::try_acquire(&path).unwrap().unwrap();
        drop(lock);
        assert!(!path.exists());

        assert!(LockFile::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_leftover_file_is_not_a_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.lock");
        std::fs::write(&path, "999999\n/old/state\n").unwrap();

        let lock = ensure_single_instance(&path, dir.path()).unwrap();
        let contents = std::fs::read_to_string(lock.path()).unwrap();
        assert!(contents.starts_with(&std::process::id().to_string()));
    }
}
