//! Transaction-to-user ledger entries.
//!
//! The gateway does not reliably echo application identity in its webhook, so
//! the user who started a payment is recorded against the transaction id at
//! creation time.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, TransactionId, UserId};

/// Default retention for ledger entries (1 hour).
pub const DEFAULT_LEDGER_RETENTION_SECS: i64 = 3600;

/// Maps one gateway transaction to the application user who initiated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUserLedgerEntry {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub user_email: String,
    pub created_at: Timestamp,
}

impl TransactionUserLedgerEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(transaction_id: TransactionId, user_id: UserId, user_email: impl Into<String>) -> Self {
        Self::created_at(transaction_id, user_id, user_email, Timestamp::now())
    }

    /// Creates an entry with an explicit creation time.
    pub fn created_at(
        transaction_id: TransactionId,
        user_id: UserId,
        user_email: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            transaction_id,
            user_id,
            user_email: user_email.into(),
            created_at,
        }
    }

    /// An entry is expired once it is strictly older than the retention window.
    pub fn is_expired(&self, now: Timestamp, retention: Duration) -> bool {
        now.duration_since(&self.created_at) > retention
    }
}

/// Retention window helper used by ledger adapters.
pub fn retention_from_secs(secs: i64) -> Duration {
    Duration::seconds(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(created_at: Timestamp) -> TransactionUserLedgerEntry {
        TransactionUserLedgerEntry::created_at(
            TransactionId::new("tx_1").unwrap(),
            UserId::new("user_1").unwrap(),
            "a@b.com",
            created_at,
        )
    }

    #[test]
    fn entry_older_than_retention_is_expired() {
        let now = Timestamp::now();
        let retention = retention_from_secs(DEFAULT_LEDGER_RETENTION_SECS);

        assert!(entry_at(now.minus_minutes(90)).is_expired(now, retention));
        assert!(!entry_at(now.minus_minutes(10)).is_expired(now, retention));
    }

    #[test]
    fn entry_exactly_at_retention_is_kept() {
        let now = Timestamp::now();
        let retention = retention_from_secs(DEFAULT_LEDGER_RETENTION_SECS);
        assert!(!entry_at(now.minus_minutes(60)).is_expired(now, retention));
    }
}
