//! File-based ledger snapshot store.
//!
//! Keeps the whole ledger in a single JSON file. Writes go to a sibling
//! temporary file first and are renamed into place.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{LedgerError, LedgerSnapshot, LedgerSnapshotStore};

use super::document::{decode_document, encode_document};

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    /// Create a store writing to `path`. The file is created on first save.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileLedgerStore::new("./data/ledger.json");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerSnapshotStore for FileLedgerStore {
    async fn load(&self) -> Result<LedgerSnapshot, LedgerError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(decode_document(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(LedgerSnapshot::new()),
            Err(e) => Err(LedgerError::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
        }

        let raw = encode_document(snapshot)?;
        let temp = self.temp_path();

        fs::write(&temp, raw)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SnapshotRecord;
    use tempfile::TempDir;

    fn snapshot_with(tx: &str) -> LedgerSnapshot {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.insert(
            tx.to_string(),
            SnapshotRecord {
                user_id: "user_1".to_string(),
                user_email: "a@b.com".to_string(),
                timestamp: 1_700_000_000_000,
            },
        );
        snapshot
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("ledger.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("nested").join("ledger.json"));

        store.save(&snapshot_with("tx_1")).await.unwrap();

        assert_eq!(store.load().await.unwrap(), snapshot_with("tx_1"));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{{{ definitely not json").unwrap();

        let store = FileLedgerStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("ledger.json"));

        store.save(&snapshot_with("tx_1")).await.unwrap();
        store.save(&snapshot_with("tx_2")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert!(loaded.contains_key("tx_2"));
        assert!(!loaded.contains_key("tx_1"));
    }
}
