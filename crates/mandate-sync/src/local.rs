//! Download directory: local presence checks and atomic writes.

use std::io::Write;
use std::path::{Path, PathBuf};

use mandate_core::symbol::symbol_to_filename;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::SyncError;

/// Local side of the crawler: what is already downloaded, and where new
/// downloads go.
pub trait DocumentStore: Send + Sync {
    /// True if a non-empty file for `symbol` exists.
    fn has_local(&self, symbol: &str) -> bool;

    /// Write `bytes` for `symbol`. Must never leave a partial file visible.
    fn persist(&self, symbol: &str, bytes: &[u8]) -> Result<PathBuf, SyncError>;
}

/// Flat directory of `<symbol with / → _>.pdf` files.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) a download directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| SyncError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(symbol_to_filename(symbol))
    }
}

impl DocumentStore for LocalStore {
    fn has_local(&self, symbol: &str) -> bool {
        std::fs::metadata(self.path_for(symbol)).is_ok_and(|m| m.is_file() && m.len() > 0)
    }

    fn persist(&self, symbol: &str, bytes: &[u8]) -> Result<PathBuf, SyncError> {
        let path = self.path_for(symbol);
        let io_err = |source| SyncError::Io {
            path: path.clone(),
            source,
        };

        // Temp file in the same directory so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!(symbol, path = %path.display(), size = bytes.len(), "persisted document");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data").join("pdfs");
        let store = LocalStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn persist_then_present() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).unwrap();
        assert!(!store.has_local("A/80/L.1"));

        let path = store.persist("A/80/L.1", b"%PDF-1.7").unwrap();
        assert_eq!(path.file_name().unwrap(), "A_80_L.1.pdf");
        assert!(store.has_local("A/80/L.1"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn empty_file_is_not_present() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).unwrap();
        std::fs::write(store.path_for("A/80/L.2"), b"").unwrap();
        assert!(!store.has_local("A/80/L.2"));
    }

    #[test]
    fn persist_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).unwrap();
        store.persist("A/RES/80/1", b"one").unwrap();
        store.persist("A/RES/80/1", b"two").unwrap();

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("A_RES_80_1.pdf")]);
        assert_eq!(std::fs::read(store.path_for("A/RES/80/1")).unwrap(), b"two");
    }
}
