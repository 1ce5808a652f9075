//! Entitlement audit log port.
//!
//! One record per effective entitlement change. No-op re-applications (a
//! webhook redelivery after the reconciler already granted access) are not
//! recorded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuditRecordId, DomainError, Timestamp, TransactionId, UserId};
use crate::domain::payment::{Amount, Currency, EntitlementSource};

/// A single effective entitlement change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementAuditRecord {
    pub id: AuditRecordId,
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub currency: Currency,
    pub source: EntitlementSource,
    pub recorded_at: Timestamp,
}

/// Append-only log of entitlement changes.
#[async_trait]
pub trait EntitlementAuditLog: Send + Sync {
    /// Append a record.
    async fn record(&self, record: EntitlementAuditRecord) -> Result<(), DomainError>;

    /// All records for a user, oldest first.
    async fn records_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<EntitlementAuditRecord>, DomainError>;
}
