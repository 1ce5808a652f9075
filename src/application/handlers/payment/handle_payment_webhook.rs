//! HandlePaymentWebhookHandler - Command handler for gateway payment notifications.
//!
//! Steps per delivery: signature check, parse, then for approved payments
//! resolve the user and grant access. Once a payload is structurally
//! accepted the handler succeeds even when the user cannot be resolved or
//! the profile store is down, so the gateway does not retry forever.

use std::sync::Arc;

use crate::application::handlers::entitlement::EntitlementService;
use crate::domain::foundation::{TransactionId, UserId};
use crate::domain::payment::{
    ApplyOutcome, Currency, EntitlementSource, InboundWebhook, WebhookError,
    WebhookSignatureVerifier,
};
use crate::ports::TransactionLedger;

/// Receiver behaviour that depends on the deployment.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Reject deliveries without a signature header.
    pub require_signature: bool,
    /// Used when the payload omits `currency`.
    pub default_currency: Currency,
}

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// Signature header value, if any.
    pub signature: Option<String>,
}

/// What the delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Access granted to this user.
    EntitlementGranted { user_id: UserId },
    /// The user already had access from this transaction.
    AlreadyEntitled { user_id: UserId },
    /// Approved, but no user could be resolved.
    LedgerMiss,
    /// Not an approved payment; logged only.
    NotApproved { status: String },
    /// The profile store failed; the ledger entry is kept for a redelivery.
    EntitlementDeferred { user_id: UserId },
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlePaymentWebhookResult {
    pub transaction_id: TransactionId,
    pub outcome: WebhookOutcome,
}

/// Handler for gateway webhooks.
pub struct HandlePaymentWebhookHandler {
    ledger: Arc<dyn TransactionLedger>,
    entitlements: Arc<EntitlementService>,
    verifier: Option<WebhookSignatureVerifier>,
    settings: WebhookSettings,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        ledger: Arc<dyn TransactionLedger>,
        entitlements: Arc<EntitlementService>,
        verifier: Option<WebhookSignatureVerifier>,
        settings: WebhookSettings,
    ) -> Self {
        Self {
            ledger,
            entitlements,
            verifier,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        // 1. Signature
        let verified = self.check_signature(&cmd)?;

        // 2. Parse
        let webhook = InboundWebhook::parse(&cmd.payload, &self.settings.default_currency)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected malformed webhook payload");
                e
            })?;
        let transaction_id = webhook.transaction_id.clone();

        // 3. Not approved: log and stop
        if !webhook.is_approved() {
            tracing::info!(
                transaction_id = %transaction_id,
                status = %webhook.status,
                "Webhook for non-approved payment, no entitlement change"
            );
            return Ok(HandlePaymentWebhookResult {
                transaction_id,
                outcome: WebhookOutcome::NotApproved {
                    status: webhook.status,
                },
            });
        }

        // 4. Resolve the user
        let Some(user_id) = self.resolve_user(&webhook, verified).await? else {
            tracing::warn!(
                transaction_id = %transaction_id,
                "Approved payment has no ledger entry, acknowledging without entitlement"
            );
            return Ok(HandlePaymentWebhookResult {
                transaction_id,
                outcome: WebhookOutcome::LedgerMiss,
            });
        };

        // 5. Grant access, then clear the ledger entry
        let outcome = match self
            .entitlements
            .apply(&user_id, &webhook.entitlement_update(), EntitlementSource::Webhook)
            .await
        {
            Ok(applied) => {
                if let Err(e) = self.ledger.clear(&transaction_id).await {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        error = %e,
                        "Failed to clear ledger entry after entitlement"
                    );
                }
                match applied {
                    ApplyOutcome::Applied => WebhookOutcome::EntitlementGranted { user_id },
                    ApplyOutcome::AlreadyApplied => WebhookOutcome::AlreadyEntitled { user_id },
                }
            }
            Err(e) => {
                tracing::error!(
                    transaction_id = %transaction_id,
                    user_id = %user_id,
                    error = %e,
                    "Profile store rejected entitlement, keeping ledger entry for redelivery"
                );
                WebhookOutcome::EntitlementDeferred { user_id }
            }
        };

        Ok(HandlePaymentWebhookResult {
            transaction_id,
            outcome,
        })
    }

    /// Returns whether the payload is signature-verified.
    fn check_signature(&self, cmd: &HandlePaymentWebhookCommand) -> Result<bool, WebhookError> {
        let signature = cmd.signature.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (signature, &self.verifier) {
            (Some(signature), Some(verifier)) => {
                verifier.verify(&cmd.payload, signature).map_err(|e| {
                    tracing::warn!(security_event = true, error = %e, "Webhook signature verification failed");
                    e
                })?;
                Ok(true)
            }
            (Some(_), None) => {
                tracing::warn!("Webhook carries a signature but no secret is configured, treating as unsigned");
                self.allow_unsigned()
            }
            (None, _) => self.allow_unsigned(),
        }
    }

    fn allow_unsigned(&self) -> Result<bool, WebhookError> {
        if self.settings.require_signature {
            tracing::warn!(security_event = true, "Rejected unsigned webhook");
            return Err(WebhookError::MissingSignature);
        }
        tracing::warn!(security_event = true, "Accepting unsigned webhook outside production");
        Ok(false)
    }

    /// Ledger first; payload identity only when the payload was signed.
    async fn resolve_user(
        &self,
        webhook: &InboundWebhook,
        verified: bool,
    ) -> Result<Option<UserId>, WebhookError> {
        let entry = self
            .ledger
            .lookup(&webhook.transaction_id)
            .await
            .map_err(|e| WebhookError::Internal(e.to_string()))?;

        if let Some(entry) = entry {
            return Ok(Some(entry.user_id));
        }

        match (&webhook.claimed_user_id, verified) {
            (Some(user_id), true) => {
                tracing::info!(
                    transaction_id = %webhook.transaction_id,
                    user_id = %user_id,
                    "Resolved user from signed webhook payload"
                );
                Ok(Some(user_id.clone()))
            }
            (Some(user_id), false) => {
                tracing::warn!(
                    transaction_id = %webhook.transaction_id,
                    claimed_user_id = %user_id,
                    "Ignoring user id from unsigned webhook payload"
                );
                Ok(None)
            }
            (None, _) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::InMemoryEntitlementAuditLog;
    use crate::adapters::ledger::{CachedTransactionLedger, InMemoryLedgerStore};
    use crate::adapters::profile::InMemoryProfileRepository;
    use crate::domain::payment::{Amount, TransactionUserLedgerEntry};
    use crate::ports::{EntitlementAuditLog, ProfileRepository};
    use serde_json::json;

    const SECRET: &str = "whsec_test";

    struct Fixture {
        handler: HandlePaymentWebhookHandler,
        ledger: Arc<CachedTransactionLedger<InMemoryLedgerStore>>,
        profiles: InMemoryProfileRepository,
        audit: InMemoryEntitlementAuditLog,
    }

    fn fixture(require_signature: bool) -> Fixture {
        let ledger = Arc::new(CachedTransactionLedger::new(InMemoryLedgerStore::new()));
        let profiles = InMemoryProfileRepository::new();
        let audit = InMemoryEntitlementAuditLog::new();
        let entitlements = Arc::new(EntitlementService::new(
            Arc::new(profiles.clone()),
            Arc::new(audit.clone()),
            "mobile_money",
        ));
        let handler = HandlePaymentWebhookHandler::new(
            ledger.clone(),
            entitlements,
            Some(WebhookSignatureVerifier::new(SECRET)),
            WebhookSettings {
                require_signature,
                default_currency: Currency::mzn(),
            },
        );
        Fixture {
            handler,
            ledger,
            profiles,
            audit,
        }
    }

    fn body(status: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "transactionId": "tx_1",
            "status": status,
            "amount": 499,
            "currency": "MZN",
            "context": "Plano Premium",
        }))
        .unwrap()
    }

    fn signed(payload: Vec<u8>) -> HandlePaymentWebhookCommand {
        let signature = WebhookSignatureVerifier::new(SECRET).sign(&payload).unwrap();
        HandlePaymentWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    fn user() -> UserId {
        UserId::new("user_1").unwrap()
    }

    fn tx() -> TransactionId {
        TransactionId::new("tx_1").unwrap()
    }

    async fn register(f: &Fixture) {
        f.ledger
            .register(TransactionUserLedgerEntry::new(tx(), user(), "a@b.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn approved_webhook_grants_and_clears_ledger() {
        let f = fixture(true);
        register(&f).await;

        let result = f.handler.handle(signed(body("completed"))).await.unwrap();

        assert_eq!(result.transaction_id, tx());
        assert_eq!(result.outcome, WebhookOutcome::EntitlementGranted { user_id: user() });

        let ent = f.profiles.find_entitlement(&user()).await.unwrap().unwrap();
        assert!(ent.is_paid);
        assert_eq!(ent.payment_amount, Some(Amount::whole(499)));
        assert_eq!(ent.transaction_id, Some(tx()));
        assert!(f.ledger.lookup(&tx()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_signature_never_grants() {
        let f = fixture(true);
        register(&f).await;

        let err = f
            .handler
            .handle(HandlePaymentWebhookCommand {
                payload: body("completed"),
                signature: Some("deadbeef".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(err, WebhookError::InvalidSignature);
        assert!(f.profiles.find_entitlement(&user()).await.unwrap().is_none());
        assert!(f.ledger.lookup(&tx()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unsigned_webhook_rejected_when_required() {
        let f = fixture(true);
        let err = f
            .handler
            .handle(HandlePaymentWebhookCommand { payload: body("completed"), signature: None })
            .await
            .unwrap_err();
        assert_eq!(err, WebhookError::MissingSignature);
    }

    #[tokio::test]
    async fn unsigned_webhook_tolerated_outside_production() {
        let f = fixture(false);
        register(&f).await;

        let result = f
            .handler
            .handle(HandlePaymentWebhookCommand { payload: body("approved"), signature: None })
            .await
            .unwrap();

        assert!(matches!(result.outcome, WebhookOutcome::EntitlementGranted { .. }));
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let f = fixture(false);
        let err = f
            .handler
            .handle(HandlePaymentWebhookCommand { payload: b"{not json".to_vec(), signature: None })
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn non_approved_status_changes_nothing() {
        let f = fixture(true);
        register(&f).await;

        let result = f.handler.handle(signed(body("failed"))).await.unwrap();

        assert_eq!(result.outcome, WebhookOutcome::NotApproved { status: "failed".to_string() });
        assert!(f.profiles.find_entitlement(&user()).await.unwrap().is_none());
        assert!(f.ledger.lookup(&tx()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ledger_miss_is_acknowledged() {
        let f = fixture(true);
        let result = f.handler.handle(signed(body("completed"))).await.unwrap();
        assert_eq!(result.outcome, WebhookOutcome::LedgerMiss);
    }

    #[tokio::test]
    async fn signed_payload_user_id_resolves_on_ledger_miss() {
        let f = fixture(true);
        let payload = serde_json::to_vec(&json!({
            "transactionId": "tx_1",
            "status": "completed",
            "amount": 499,
            "uid": "user_1",
        }))
        .unwrap();

        let result = f.handler.handle(signed(payload)).await.unwrap();

        assert_eq!(result.outcome, WebhookOutcome::EntitlementGranted { user_id: user() });
    }

    #[tokio::test]
    async fn unsigned_payload_user_id_is_not_trusted() {
        let f = fixture(false);
        let payload = serde_json::to_vec(&json!({
            "transactionId": "tx_1",
            "status": "completed",
            "amount": 499,
            "userId": "user_1",
        }))
        .unwrap();

        let result = f
            .handler
            .handle(HandlePaymentWebhookCommand { payload, signature: None })
            .await
            .unwrap();

        assert_eq!(result.outcome, WebhookOutcome::LedgerMiss);
        assert!(f.profiles.find_entitlement(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn redelivery_after_clear_degrades_to_ledger_miss() {
        let f = fixture(true);
        register(&f).await;

        f.handler.handle(signed(body("completed"))).await.unwrap();
        let second = f.handler.handle(signed(body("completed"))).await.unwrap();

        assert_eq!(second.outcome, WebhookOutcome::LedgerMiss);
        assert!(f.profiles.find_entitlement(&user()).await.unwrap().unwrap().is_paid);
        assert_eq!(f.audit.records_for_user(&user()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_defers_and_keeps_ledger_entry() {
        let f = fixture(true);
        register(&f).await;
        f.profiles.set_fail_writes(true);

        let result = f.handler.handle(signed(body("completed"))).await.unwrap();

        assert_eq!(result.outcome, WebhookOutcome::EntitlementDeferred { user_id: user() });
        assert!(f.ledger.lookup(&tx()).await.unwrap().is_some());

        f.profiles.set_fail_writes(false);
        let retry = f.handler.handle(signed(body("completed"))).await.unwrap();
        assert_eq!(retry.outcome, WebhookOutcome::EntitlementGranted { user_id: user() });
    }

    #[tokio::test]
    async fn concurrent_deliveries_apply_once() {
        let f = fixture(true);
        register(&f).await;

        let (a, b) = tokio::join!(
            f.handler.handle(signed(body("completed"))),
            f.handler.handle(signed(body("completed"))),
        );
        let granted = [a.unwrap().outcome, b.unwrap().outcome]
            .iter()
            .filter(|o| matches!(o, WebhookOutcome::EntitlementGranted { .. }))
            .count();

        assert_eq!(granted, 1);
        assert_eq!(f.audit.records_for_user(&user()).await.unwrap().len(), 1);
    }
}
