//! Ledger Snapshot Store Port - durable backing for the cached ledger.
//!
//! The whole ledger is persisted as one document so a restarted process can
//! reload it on a cache miss. The document shape is
//! `{ "<txId>": { "userId", "userEmail", "timestamp" } }` with `timestamp`
//! in Unix milliseconds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::transaction_ledger::LedgerError;
use crate::domain::foundation::{Timestamp, TransactionId, UserId};
use crate::domain::payment::TransactionUserLedgerEntry;

/// Storage key the ledger document lives under.
pub const LEDGER_STORAGE_KEY: &str = "amsync_tx_user_map";

/// One persisted ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub user_id: String,
    pub user_email: String,
    pub timestamp: i64,
}

/// The persisted ledger, keyed by transaction id.
pub type LedgerSnapshot = BTreeMap<String, SnapshotRecord>;

impl From<&TransactionUserLedgerEntry> for SnapshotRecord {
    fn from(entry: &TransactionUserLedgerEntry) -> Self {
        Self {
            user_id: entry.user_id.as_str().to_string(),
            user_email: entry.user_email.clone(),
            timestamp: entry.created_at.as_unix_millis(),
        }
    }
}

impl SnapshotRecord {
    /// Rebuilds a ledger entry. Records with blank ids or impossible
    /// timestamps yield `None` and are dropped by the caller.
    pub fn to_entry(&self, transaction_id: &str) -> Option<TransactionUserLedgerEntry> {
        let transaction_id = TransactionId::new(transaction_id).ok()?;
        let user_id = UserId::new(self.user_id.clone()).ok()?;
        let created_at = Timestamp::from_unix_millis(self.timestamp)?;
        Some(TransactionUserLedgerEntry::created_at(
            transaction_id,
            user_id,
            self.user_email.clone(),
            created_at,
        ))
    }
}

/// Port for persisting the ledger snapshot.
#[async_trait]
pub trait LedgerSnapshotStore: Send + Sync {
    /// Load the persisted snapshot.
    ///
    /// A missing or unreadable document is an empty ledger, not an error;
    /// errors are reserved for the store itself being unusable.
    async fn load(&self) -> Result<LedgerSnapshot, LedgerError>;

    /// Replace the persisted snapshot.
    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = SnapshotRecord {
            user_id: "user_1".to_string(),
            user_email: "a@b.com".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["userEmail"], "a@b.com");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn record_round_trips_through_entry() {
        let entry = TransactionUserLedgerEntry::new(
            TransactionId::new("tx_1").unwrap(),
            UserId::new("user_1").unwrap(),
            "a@b.com",
        );
        let record = SnapshotRecord::from(&entry);
        let restored = record.to_entry("tx_1").unwrap();

        assert_eq!(restored.user_id, entry.user_id);
        assert_eq!(restored.created_at.as_unix_millis(), entry.created_at.as_unix_millis());
    }

    #[test]
    fn blank_user_id_is_dropped() {
        let record = SnapshotRecord {
            user_id: " ".to_string(),
            user_email: String::new(),
            timestamp: 0,
        };
        assert!(record.to_entry("tx_1").is_none());
    }
}
