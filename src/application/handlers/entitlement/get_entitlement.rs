//! GetEntitlementHandler - Query handler for the current user's paid access.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payment::UserEntitlement;
use crate::ports::ProfileRepository;

/// Query for one user's entitlement.
#[derive(Debug, Clone)]
pub struct GetEntitlementQuery {
    pub user_id: UserId,
}

/// Handler for entitlement lookups. Users without a profile row are unpaid.
pub struct GetEntitlementHandler {
    profiles: Arc<dyn ProfileRepository>,
}

impl GetEntitlementHandler {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub async fn handle(&self, query: GetEntitlementQuery) -> Result<UserEntitlement, DomainError> {
        Ok(self
            .profiles
            .find_entitlement(&query.user_id)
            .await?
            .unwrap_or_else(|| UserEntitlement::unpaid(query.user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::profile::InMemoryProfileRepository;

    #[tokio::test]
    async fn missing_profile_reads_as_unpaid() {
        let handler = GetEntitlementHandler::new(Arc::new(InMemoryProfileRepository::new()));
        let user_id = UserId::new("user_1").unwrap();

        let ent = handler.handle(GetEntitlementQuery { user_id: user_id.clone() }).await.unwrap();

        assert_eq!(ent, UserEntitlement::unpaid(user_id));
    }

    #[tokio::test]
    async fn existing_profile_is_returned() {
        let repo = InMemoryProfileRepository::new();
        let user_id = UserId::new("user_1").unwrap();
        let mut paid = UserEntitlement::unpaid(user_id.clone());
        paid.is_paid = true;
        repo.insert(paid.clone()).await;

        let handler = GetEntitlementHandler::new(Arc::new(repo));
        let ent = handler.handle(GetEntitlementQuery { user_id }).await.unwrap();

        assert_eq!(ent, paid);
    }
}
