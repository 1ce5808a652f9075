//! Cached transaction ledger.
//!
//! Keeps an in-process cache in front of a [`LedgerSnapshotStore`]. Every
//! write is a read-modify-write of the persisted snapshot, so entries written
//! before a restart survive even when the cache starts cold. A lookup that
//! misses the cache reloads the snapshot before giving up.
//!
//! One async mutex guards the cache and every store round-trip. Two webhook
//! deliveries for the same transaction therefore see the ledger one after the
//! other, and only the first finds the entry.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;

use crate::domain::foundation::{Timestamp, TransactionId, UserId};
use crate::domain::payment::{
    retention_from_secs, TransactionUserLedgerEntry, DEFAULT_LEDGER_RETENTION_SECS,
};
use crate::ports::{
    LedgerError, LedgerSnapshot, LedgerSnapshotStore, SnapshotRecord, TransactionLedger,
};

type Cache = HashMap<TransactionId, TransactionUserLedgerEntry>;

/// Ledger with an in-process cache and a persistent snapshot.
pub struct CachedTransactionLedger<S: LedgerSnapshotStore> {
    store: S,
    cache: Mutex<Cache>,
    retention: Duration,
}

impl<S: LedgerSnapshotStore> CachedTransactionLedger<S> {
    /// Create a ledger with the default one-hour retention and a cold cache.
    pub fn new(store: S) -> Self {
        Self::with_retention(store, retention_from_secs(DEFAULT_LEDGER_RETENTION_SECS))
    }

    pub fn with_retention(store: S, retention: Duration) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// The backing snapshot store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop the in-process cache, as a process restart would.
    pub async fn reset_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Number of entries currently cached.
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    fn entries_from(snapshot: &LedgerSnapshot) -> Cache {
        snapshot
            .iter()
            .filter_map(|(tx, record)| {
                let entry = record.to_entry(tx);
                if entry.is_none() {
                    tracing::warn!(transaction_id = %tx, "Dropping malformed ledger record");
                }
                entry
            })
            .map(|entry| (entry.transaction_id.clone(), entry))
            .collect()
    }

    fn snapshot_from(cache: &Cache) -> LedgerSnapshot {
        cache
            .values()
            .map(|entry| (entry.transaction_id.as_str().to_string(), SnapshotRecord::from(entry)))
            .collect()
    }

    /// Merges persisted entries the cache does not know about. Caller holds
    /// the cache lock.
    async fn refresh(&self, cache: &mut Cache) -> Result<(), LedgerError> {
        let persisted = Self::entries_from(&self.store.load().await?);
        for (tx, entry) in persisted {
            cache.entry(tx).or_insert(entry);
        }
        Ok(())
    }

    /// Loads, mutates and saves the persisted snapshot, then mirrors the
    /// result into the cache. Caller holds the cache lock.
    async fn rewrite<F>(&self, cache: &mut Cache, mutate: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut Cache) + Send,
    {
        let mut merged = Self::entries_from(&self.store.load().await?);
        mutate(&mut merged);
        self.store.save(&Self::snapshot_from(&merged)).await?;
        *cache = merged;
        Ok(())
    }
}

#[async_trait]
impl<S: LedgerSnapshotStore> TransactionLedger for CachedTransactionLedger<S> {
    async fn register(&self, entry: TransactionUserLedgerEntry) -> Result<(), LedgerError> {
        let mut cache = self.cache.lock().await;
        let transaction_id = entry.transaction_id.clone();
        let user_id = entry.user_id.clone();

        self.rewrite(&mut cache, move |entries| {
            entries.insert(entry.transaction_id.clone(), entry);
        })
        .await?;

        tracing::info!(
            transaction_id = %transaction_id,
            user_id = %user_id,
            "Registered transaction in ledger"
        );
        Ok(())
    }

    async fn lookup(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionUserLedgerEntry>, LedgerError> {
        let mut cache = self.cache.lock().await;

        if !cache.contains_key(transaction_id) {
            tracing::debug!(
                transaction_id = %transaction_id,
                "Ledger cache miss, reloading persisted snapshot"
            );
            self.refresh(&mut cache).await?;
        }

        let Some(entry) = cache.get(transaction_id).cloned() else {
            return Ok(None);
        };

        if entry.is_expired(Timestamp::now(), self.retention) {
            tracing::info!(transaction_id = %transaction_id, "Purging expired ledger entry");
            let expired = transaction_id.clone();
            self.rewrite(&mut cache, move |entries| {
                entries.remove(&expired);
            })
            .await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn clear(&self, transaction_id: &TransactionId) -> Result<(), LedgerError> {
        let mut cache = self.cache.lock().await;
        let target = transaction_id.clone();
        self.rewrite(&mut cache, move |entries| {
            entries.remove(&target);
        })
        .await
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<usize, LedgerError> {
        let mut cache = self.cache.lock().await;
        let retention = self.retention;
        let mut removed = 0;

        self.rewrite(&mut cache, |entries| {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now, retention));
            removed = before - entries.len();
        })
        .await?;

        if removed > 0 {
            tracing::info!(removed, "Swept expired ledger entries");
        }
        Ok(removed)
    }

    async fn entries_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TransactionUserLedgerEntry>, LedgerError> {
        let mut cache = self.cache.lock().await;
        self.refresh(&mut cache).await?;

        let now = Timestamp::now();
        let mut entries: Vec<_> = cache
            .values()
            .filter(|entry| &entry.user_id == user_id && !entry.is_expired(now, self.retention))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn clear_for_user(&self, user_id: &UserId) -> Result<usize, LedgerError> {
        let mut cache = self.cache.lock().await;
        let mut removed = 0;

        self.rewrite(&mut cache, |entries| {
            let before = entries.len();
            entries.retain(|_, entry| &entry.user_id != user_id);
            removed = before - entries.len();
        })
        .await?;

        Ok(removed)
    }
}
