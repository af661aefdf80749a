//! JSON file backed state store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{SolarConfig, StateStore};
use crate::error::StoreError;

/// Stores one accessory's [`SolarConfig`] as a small JSON file.
///
/// Writes go to a temporary file in the same directory which then replaces
/// the record, so a crash never leaves a half-written file behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn retrieve(&self, default: SolarConfig) -> Result<SolarConfig, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(default),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            StoreError::Format(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn store(&mut self, config: &SolarConfig) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(parent).map_err(|e| {
            StoreError::Io(format!("failed to create {}: {e}", parent.display()))
        })?;

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| StoreError::Format(e.to_string()))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| StoreError::Io(format!("failed to create temporary file: {e}")))?;
        let write_result = writeln!(temp, "{json}").and_then(|()| temp.as_file().sync_all());
        write_result.map_err(|e| StoreError::Io(format!("failed to write state: {e}")))?;

        temp.persist(&self.path).map_err(|e| {
            StoreError::Io(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        let default = SolarConfig::default().with_offset(12);

        assert_eq!(store.retrieve(default).unwrap(), default);
    }

    #[test]
    fn test_store_then_retrieve() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("sunset.json"));
        let saved = SolarConfig {
            period: 7,
            offset_minutes: -20,
            enabled: true,
        };

        store.store(&saved).unwrap();

        assert_eq!(store.retrieve(SolarConfig::default()).unwrap(), saved);
        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains("\"offset\": -20"));
    }

    #[test]
    fn test_corrupt_file_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ period: nope").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.retrieve(SolarConfig::default()),
            Err(StoreError::Format(_))
        ));
    }

    #[test]
    fn test_unwritable_location_is_an_io_error() {
        let dir = tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut store = JsonFileStore::new(blocker.join("state.json"));
        assert!(matches!(
            store.store(&SolarConfig::default()),
            Err(StoreError::Io(_))
        ));
    }
}
