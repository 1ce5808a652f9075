//! ProfileRepository port for the entitlement fields of user profiles.
//!
//! The identity provider's profile document store owns the profile; this
//! port only reads and merges the payment/entitlement fields.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::payment::{ApplyOutcome, EntitlementUpdate, UserEntitlement};

/// Repository for user entitlement state
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find the entitlement fields for a user. `None` if no profile exists.
    async fn find_entitlement(&self, user_id: &UserId)
        -> Result<Option<UserEntitlement>, DomainError>;

    /// Merge a payment into the user's profile.
    ///
    /// Must be a conditional write: if the profile is already paid with
    /// `update.transaction_id`, nothing is written and `AlreadyApplied` is
    /// returned, even when two callers race. Creates the profile if absent.
    async fn grant_entitlement(
        &self,
        user_id: &UserId,
        update: &EntitlementUpdate,
        payment_method: &str,
        at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError>;
}
