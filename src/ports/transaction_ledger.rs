//! Transaction Ledger Port - maps gateway transactions to application users.
//!
//! The gateway webhook is not guaranteed to carry the application user, so
//! the user is recorded against the transaction id when the payment is
//! created and looked up again when the outcome arrives.
//!
//! # Contract
//!
//! - `register` inserts or overwrites the entry for a transaction
//! - `lookup` never returns an expired entry; it purges it instead
//! - implementations must serialise writes so concurrent webhook deliveries
//!   for the same transaction cannot both observe the entry and apply twice

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, TransactionId, UserId};
use crate::domain::payment::{PaymentFlowError, TransactionUserLedgerEntry};

/// Errors that can occur during ledger operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger storage error: {0}")]
    Storage(String),

    #[error("Failed to serialize ledger: {0}")]
    Serialization(String),

    #[error("Ledger backend unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for PaymentFlowError {
    fn from(err: LedgerError) -> Self {
        PaymentFlowError::ledger(err.to_string())
    }
}

/// Port for the transaction-to-user ledger.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Record who initiated a transaction. Overwrites any existing entry.
    async fn register(&self, entry: TransactionUserLedgerEntry) -> Result<(), LedgerError>;

    /// Find the entry for a transaction.
    ///
    /// Returns `None` when the entry is unknown or expired; expired entries
    /// are removed as a side effect.
    async fn lookup(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionUserLedgerEntry>, LedgerError>;

    /// Remove the entry for a transaction. Removing an unknown id is a no-op.
    async fn clear(&self, transaction_id: &TransactionId) -> Result<(), LedgerError>;

    /// Remove every entry older than the retention window at `now`.
    ///
    /// Returns the number of entries removed.
    async fn sweep_expired(&self, now: Timestamp) -> Result<usize, LedgerError>;

    /// All live entries for one user, newest first.
    async fn entries_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TransactionUserLedgerEntry>, LedgerError>;

    /// Remove every entry belonging to one user. Returns the number removed.
    async fn clear_for_user(&self, user_id: &UserId) -> Result<usize, LedgerError>;
}
