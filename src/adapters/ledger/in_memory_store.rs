//! In-memory ledger snapshot store.
//!
//! Holds the encoded document as a raw string, the same bytes the file store
//! would write. Used for tests and local development without a data dir.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{LedgerError, LedgerSnapshot, LedgerSnapshotStore};

use super::document::{decode_document, encode_document};

/// In-memory snapshot store. Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    raw: Arc<RwLock<Option<String>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw document, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Arc::new(RwLock::new(Some(raw.into()))),
        }
    }

    /// The raw document as last saved.
    pub async fn raw(&self) -> Option<String> {
        self.raw.read().await.clone()
    }
}

#[async_trait]
impl LedgerSnapshotStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<LedgerSnapshot, LedgerError> {
        Ok(self
            .raw
            .read()
            .await
            .as_deref()
            .map(decode_document)
            .unwrap_or_default())
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        let encoded = encode_document(snapshot)?;
        *self.raw.write().await = Some(encoded);
        Ok(())
    }
}
