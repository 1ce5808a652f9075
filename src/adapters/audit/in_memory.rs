//! In-memory entitlement audit log.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{EntitlementAuditLog, EntitlementAuditRecord};

/// Append-only audit log held in process memory. Clones share records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitlementAuditLog {
    records: Arc<RwLock<Vec<EntitlementAuditRecord>>>,
}

impl InMemoryEntitlementAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EntitlementAuditLog for InMemoryEntitlementAuditLog {
    async fn record(&self, record: EntitlementAuditRecord) -> Result<(), DomainError> {
        tracing::debug!(
            user_id = %record.user_id,
            transaction_id = %record.transaction_id,
            source = record.source.as_str(),
            "Audit record appended"
        );
        self.records.write().await.push(record);
        Ok(())
    }

    async fn records_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<EntitlementAuditRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect())
    }
}
