//! JSON file backing the persisted agent state.
//!
//! Keys follow the settings UI: `fileCode`, `caseSequence` and
//! `autoEnabled`. Keys this agent does not know are kept on rewrite.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use docarchiver_core::{SessionStore, StoreError, StoredSettings};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sequence: Option<String>,
    #[serde(default)]
    pub auto_enabled: bool,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// [`SessionStore`] over a JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents. A missing file reads as the default state.
    pub fn read(&self) -> Result<PersistedState, StoreError> {
        let _guard = self.lock.lock();
        self.read_unlocked()
    }

    /// Persist the operator's file code and case sequence.
    pub fn save_settings(&self, file_code: &str, case_sequence: &str) -> Result<(), StoreError> {
        self.update(|state| {
            state.file_code = Some(file_code.to_string());
            state.case_sequence = Some(case_sequence.to_string());
        })
    }

    fn update(&self, f: impl FnOnce(&mut PersistedState)) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut state = self.read_unlocked()?;
        f(&mut state);
        self.write_unlocked(&state)
    }

    fn read_unlocked(&self) -> Result<PersistedState, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(PersistedState::default()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(StoreError(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn write_unlocked(&self, state: &PersistedState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(state).map_err(|e| StoreError(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| StoreError(format!("{}: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn load_settings(&self) -> Result<StoredSettings, StoreError> {
        let state = self.read()?;
        Ok(StoredSettings {
            file_code: state.file_code,
            case_sequence: state.case_sequence,
        })
    }

    fn save_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.update(|state| state.auto_enabled = enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_default() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert_eq!(store.read().unwrap(), PersistedState::default());
        assert_eq!(store.load_settings().unwrap(), StoredSettings::default());
    }

    #[test]
    fn test_save_enabled_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = JsonFileStore::new(&path);
        store.save_enabled(true).unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["autoEnabled"], true);
    }

    #[test]
    fn test_settings_round_trip_keeps_flag() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        store.save_enabled(true).unwrap();
        store.save_settings("03010102", "2").unwrap();

        let settings = store.load_settings().unwrap();
        assert_eq!(settings.file_code.as_deref(), Some("03010102"));
        assert_eq!(settings.case_sequence.as_deref(), Some("2"));
        assert!(store.read().unwrap().auto_enabled);
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"fileCode": "03010101", "theme": "dark"}"#).unwrap();

        let store = JsonFileStore::new(&path);
        store.save_enabled(false).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["fileCode"], "03010101");
        assert_eq!(raw["autoEnabled"], false);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.load_settings().is_err());
        assert!(store.save_enabled(false).is_err());
    }
}
