//! GetPaymentStatusHandler - Query handler for a single gateway status check.
//!
//! Callers only see transactions they started: a live ledger entry in their
//! name, or the transaction already stamped on their entitlement. Anything
//! else is reported as not found.

use std::sync::Arc;

use crate::domain::foundation::{TransactionId, UserId};
use crate::domain::payment::PaymentFlowError;
use crate::ports::{PaymentGateway, ProfileRepository, TransactionLedger, TransactionStatusReport};

/// Query for one transaction's status.
#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub user_id: UserId,
    pub transaction_id: TransactionId,
}

pub struct GetPaymentStatusHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn TransactionLedger>,
    profiles: Arc<dyn ProfileRepository>,
}

impl GetPaymentStatusHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn TransactionLedger>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            gateway,
            ledger,
            profiles,
        }
    }

    pub async fn handle(
        &self,
        query: GetPaymentStatusQuery,
    ) -> Result<TransactionStatusReport, PaymentFlowError> {
        self.ensure_owned_by(&query.user_id, &query.transaction_id)
            .await?;

        self.gateway
            .get_transaction_status(&query.transaction_id)
            .await
            .map_err(|e| e.into_flow_error(Some(&query.transaction_id)))
    }

    /// Fails with `TransactionNotFound` unless `user_id` started the transaction.
    pub async fn ensure_owned_by(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
    ) -> Result<(), PaymentFlowError> {
        if let Some(entry) = self.ledger.lookup(transaction_id).await? {
            if &entry.user_id == user_id {
                return Ok(());
            }
            tracing::warn!(
                transaction_id = %transaction_id,
                user_id = %user_id,
                "Status requested for another user's transaction"
            );
            return Err(PaymentFlowError::transaction_not_found(transaction_id.clone()));
        }

        // Ledger entries are cleared once the payment is applied.
        let settled = self
            .profiles
            .find_entitlement(user_id)
            .await?
            .and_then(|e| e.transaction_id)
            .is_some_and(|tx| &tx == transaction_id);
        if settled {
            Ok(())
        } else {
            Err(PaymentFlowError::transaction_not_found(transaction_id.clone()))
        }
    }
}
