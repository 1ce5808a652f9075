//! EntitlementService - the single write path for paid access.
//!
//! Both the webhook receiver and the return reconciler grant access through
//! [`EntitlementService::apply`]. The profile store's conditional write makes
//! the grant idempotent, and only effective changes reach the audit log.

use std::sync::Arc;

use crate::domain::foundation::{AuditRecordId, DomainError, Timestamp, UserId};
use crate::domain::payment::{ApplyOutcome, EntitlementSource, EntitlementUpdate};
use crate::ports::{EntitlementAuditLog, EntitlementAuditRecord, ProfileRepository};

/// Grants paid access and records the change.
pub struct EntitlementService {
    profiles: Arc<dyn ProfileRepository>,
    audit_log: Arc<dyn EntitlementAuditLog>,
    payment_method: String,
}

impl EntitlementService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        audit_log: Arc<dyn EntitlementAuditLog>,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            profiles,
            audit_log,
            payment_method: payment_method.into(),
        }
    }

    /// Marks the user paid with the given transaction.
    ///
    /// Store failures propagate. Audit failures are logged only; access has
    /// already been granted by then.
    pub async fn apply(
        &self,
        user_id: &UserId,
        update: &EntitlementUpdate,
        source: EntitlementSource,
    ) -> Result<ApplyOutcome, DomainError> {
        let now = Timestamp::now();
        let outcome = self
            .profiles
            .grant_entitlement(user_id, update, &self.payment_method, now)
            .await?;

        match outcome {
            ApplyOutcome::Applied => {
                tracing::info!(
                    user_id = %user_id,
                    transaction_id = %update.transaction_id,
                    amount = update.amount.value(),
                    source = source.as_str(),
                    "Entitlement granted"
                );

                let record = EntitlementAuditRecord {
                    id: AuditRecordId::new(),
                    user_id: user_id.clone(),
                    transaction_id: update.transaction_id.clone(),
                    amount: update.amount,
                    currency: update.currency.clone(),
                    source,
                    recorded_at: now,
                };
                if let Err(e) = self.audit_log.record(record).await {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to write entitlement audit record");
                }
            }
            ApplyOutcome::AlreadyApplied => {
                tracing::debug!(
                    user_id = %user_id,
                    transaction_id = %update.transaction_id,
                    source = source.as_str(),
                    "Entitlement already applied for transaction"
                );
            }
        }

        Ok(outcome)
    }
}
