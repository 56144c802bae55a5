//! Durable sync state: pattern name → highest confirmed identifier offset.
//!
//! Persisted as JSON, read at the start of a run and replaced wholesale at
//! the end:
//!
//! ```json
//! { "last_sync": "2026-02-21T10:00:00Z", "patterns": { "ga_plenary": { "highest_found": 12 } } }
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternState {
    pub highest_found: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternState>,
}

impl SyncState {
    pub fn highest_found(&self, pattern: &str) -> Option<i64> {
        self.patterns.get(pattern).map(|p| p.highest_found)
    }

    /// Record progress for a pattern. Never moves `highest_found` backwards.
    pub fn advance(&mut self, pattern: &str, highest_found: i64) {
        let entry = self
            .patterns
            .entry(pattern.to_string())
            .or_insert(PatternState { highest_found });
        entry.highest_found = entry.highest_found.max(highest_found);
    }

    /// Load state from disk. A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SyncError::State {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Atomically replace the state file (write temp, then rename).
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let io_err = |source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(self).map_err(|source| SyncError::State {
            path: path.to_path_buf(),
            source,
        })?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        info!(path = %path.display(), patterns = self.patterns.len(), "saved sync state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_state() {
        let state = SyncState::load(Path::new("/nonexistent/state.json")).unwrap();
        assert_eq!(state, SyncState::default());
    }

    #[test]
    fn save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("state.json");

        let mut state = SyncState::default();
        state.advance("ga_plenary", 12);
        state.last_sync = Some("2026-02-21T10:00:00Z".parse().unwrap());
        state.save(&path).unwrap();

        let loaded = SyncState::load(&path).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.highest_found("ga_plenary"), Some(12));
        assert_eq!(loaded.highest_found("other"), None);
    }

    #[test]
    fn reads_legacy_layout_without_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, r#"{"patterns": {"res": {"highest_found": 7}}}"#).unwrap();

        let state = SyncState::load(&path).unwrap();
        assert_eq!(state.highest_found("res"), Some(7));
        assert!(state.last_sync.is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SyncState::load(&path),
            Err(SyncError::State { .. })
        ));
    }

    #[test]
    fn advance_is_monotonic() {
        let mut state = SyncState::default();
        state.advance("res", 10);
        state.advance("res", 4);
        assert_eq!(state.highest_found("res"), Some(10));
        state.advance("res", 11);
        assert_eq!(state.highest_found("res"), Some(11));
    }
}
