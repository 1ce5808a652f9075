//! In-memory profile repository.
//!
//! Backs local development and tests. The write lock is held for the whole
//! read-merge-write, which gives the same at-most-once behaviour as the
//! conditional upsert in the Postgres adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::payment::{ApplyOutcome, EntitlementUpdate, UserEntitlement};
use crate::ports::ProfileRepository;

/// In-memory entitlement store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<UserId, UserEntitlement>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile directly.
    pub async fn insert(&self, entitlement: UserEntitlement) {
        self.profiles
            .write()
            .await
            .insert(entitlement.user_id.clone(), entitlement);
    }

    /// Make every subsequent write fail, as an unreachable store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_entitlement(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserEntitlement>, DomainError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn grant_entitlement(
        &self,
        user_id: &UserId,
        update: &EntitlementUpdate,
        payment_method: &str,
        at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "profile store unavailable",
            ));
        }

        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.clone())
            .or_insert_with(|| UserEntitlement::unpaid(user_id.clone()));

        Ok(profile.apply(update, payment_method, at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TransactionId;
    use crate::domain::payment::{Amount, Currency};

    fn update(tx: &str) -> EntitlementUpdate {
        EntitlementUpdate {
            amount: Amount::whole(499),
            transaction_id: TransactionId::new(tx).unwrap(),
            currency: Currency::mzn(),
            context: None,
        }
    }

    #[tokio::test]
    async fn unknown_user_has_no_profile() {
        let repo = InMemoryProfileRepository::new();
        let found = repo.find_entitlement(&UserId::new("nobody").unwrap()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn grant_creates_profile_and_is_idempotent() {
        let repo = InMemoryProfileRepository::new();
        let user = UserId::new("user_1").unwrap();

        let first = repo.grant_entitlement(&user, &update("tx_1"), "mobile_money", Timestamp::now()).await.unwrap();
        let second = repo.grant_entitlement(&user, &update("tx_1"), "mobile_money", Timestamp::now()).await.unwrap();

        assert_eq!(first, ApplyOutcome::Applied);
        assert_eq!(second, ApplyOutcome::AlreadyApplied);
        assert!(repo.find_entitlement(&user).await.unwrap().unwrap().is_paid);
    }

    #[tokio::test]
    async fn concurrent_grants_apply_once() {
        let repo = InMemoryProfileRepository::new();
        let user = UserId::new("user_1").unwrap();

        let first = update("tx_1");
        let redelivered = update("tx_1");
        let (a, b) = tokio::join!(
            repo.grant_entitlement(&user, &first, "mobile_money", Timestamp::now()),
            repo.grant_entitlement(&user, &redelivered, "mobile_money", Timestamp::now()),
        );

        let applied = [a.unwrap(), b.unwrap()].iter().filter(|o| o.changed()).count();
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn failing_store_returns_database_error() {
        let repo = InMemoryProfileRepository::new();
        repo.set_fail_writes(true);

        let err = repo
            .grant_entitlement(&UserId::new("user_1").unwrap(), &update("tx_1"), "m", Timestamp::now())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
