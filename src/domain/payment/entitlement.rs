//! User entitlement: the paid-access flag and payment metadata on a profile.
//!
//! `is_paid` is monotonic in this flow. There is no refund or chargeback path,
//! so nothing here ever sets it back to false.

use serde::{Deserialize, Serialize};

use super::money::{Amount, Currency};
use crate::domain::foundation::{Timestamp, TransactionId, UserId};

/// Payment fields stamped onto the user profile when access is granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntitlement {
    pub user_id: UserId,
    pub is_paid: bool,
    pub payment_date: Option<Timestamp>,
    pub payment_method: Option<String>,
    pub payment_amount: Option<Amount>,
    pub transaction_id: Option<TransactionId>,
    pub currency: Option<Currency>,
    pub context: Option<String>,
}

/// The data both the webhook receiver and the reconciler hand to the
/// entitlement service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementUpdate {
    pub amount: Amount,
    pub transaction_id: TransactionId,
    pub currency: Currency,
    pub context: Option<String>,
}

/// Result of applying an [`EntitlementUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// The profile changed.
    Applied,
    /// The user was already paid with this same transaction; nothing changed.
    AlreadyApplied,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// Which path asked for the entitlement change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementSource {
    /// Gateway webhook (authoritative).
    Webhook,
    /// Browser returning from hosted checkout (fallback).
    ReturnReconciler,
}

impl EntitlementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementSource::Webhook => "webhook",
            EntitlementSource::ReturnReconciler => "return_reconciler",
        }
    }
}

impl UserEntitlement {
    /// An unpaid profile with no payment metadata.
    pub fn unpaid(user_id: UserId) -> Self {
        Self {
            user_id,
            is_paid: false,
            payment_date: None,
            payment_method: None,
            payment_amount: None,
            transaction_id: None,
            currency: None,
            context: None,
        }
    }

    /// True when this exact transaction has already been applied.
    pub fn already_applied(&self, transaction_id: &TransactionId) -> bool {
        self.is_paid && self.transaction_id.as_ref() == Some(transaction_id)
    }

    /// Merges a payment into the profile.
    ///
    /// Re-applying the transaction that granted access is a no-op. A different
    /// transaction restamps the payment metadata; `is_paid` stays true either way.
    pub fn apply(
        &mut self,
        update: &EntitlementUpdate,
        payment_method: &str,
        at: Timestamp,
    ) -> ApplyOutcome {
        if self.already_applied(&update.transaction_id) {
            return ApplyOutcome::AlreadyApplied;
        }

        self.is_paid = true;
        self.payment_date = Some(at);
        self.payment_method = Some(payment_method.to_string());
        self.payment_amount = Some(update.amount);
        self.transaction_id = Some(update.transaction_id.clone());
        self.currency = Some(update.currency.clone());
        if update.context.is_some() {
            self.context = update.context.clone();
        }

        ApplyOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(tx: &str) -> EntitlementUpdate {
        EntitlementUpdate {
            amount: Amount::whole(499),
            transaction_id: TransactionId::new(tx).unwrap(),
            currency: Currency::mzn(),
            context: Some("Plano Premium".to_string()),
        }
    }

    #[test]
    fn first_apply_marks_paid_and_stamps_metadata() {
        let mut ent = UserEntitlement::unpaid(UserId::new("user_1").unwrap());
        let at = Timestamp::now();

        let outcome = ent.apply(&update("tx_1"), "mobile_money", at);

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert!(ent.is_paid);
        assert_eq!(ent.payment_date, Some(at));
        assert_eq!(ent.payment_amount, Some(Amount::whole(499)));
        assert_eq!(ent.transaction_id.as_ref().map(|t| t.as_str()), Some("tx_1"));
        assert_eq!(ent.payment_method.as_deref(), Some("mobile_money"));
    }

    #[test]
    fn reapplying_same_transaction_is_noop() {
        let mut ent = UserEntitlement::unpaid(UserId::new("user_1").unwrap());
        let first_at = Timestamp::now();
        ent.apply(&update("tx_1"), "mobile_money", first_at);

        let outcome = ent.apply(&update("tx_1"), "mobile_money", first_at.plus_secs(60));

        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
        assert!(ent.is_paid);
        assert_eq!(ent.payment_date, Some(first_at));
    }

    #[test]
    fn different_transaction_restamps_but_stays_paid() {
        let mut ent = UserEntitlement::unpaid(UserId::new("user_1").unwrap());
        ent.apply(&update("tx_1"), "mobile_money", Timestamp::now());

        let outcome = ent.apply(&update("tx_2"), "mobile_money", Timestamp::now());

        assert!(outcome.changed());
        assert!(ent.is_paid);
        assert_eq!(ent.transaction_id.as_ref().map(|t| t.as_str()), Some("tx_2"));
    }

    #[test]
    fn apply_without_context_keeps_previous_context() {
        let mut ent = UserEntitlement::unpaid(UserId::new("user_1").unwrap());
        ent.apply(&update("tx_1"), "mobile_money", Timestamp::now());

        let mut bare = update("tx_2");
        bare.context = None;
        ent.apply(&bare, "mobile_money", Timestamp::now());

        assert_eq!(ent.context.as_deref(), Some("Plano Premium"));
    }
}
