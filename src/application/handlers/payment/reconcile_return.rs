//! ReconcilePaymentReturnHandler - fallback when the browser comes back from checkout.
//!
//! Hosted mobile-money checkouts often redirect before the webhook arrives.
//! Without explicit return parameters the handler picks the user's most
//! recent ledger entry and grants access, optionally confirming with the
//! gateway first. It always answers with a redirect target and a delay.

use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::entitlement::EntitlementService;
use crate::domain::foundation::{AuthenticatedUser, Timestamp, TransactionId};
use crate::domain::payment::{
    Amount, ApplyOutcome, Currency, EntitlementSource, EntitlementUpdate, PaymentFlowError,
    PaymentStatus, TransactionUserLedgerEntry,
};
use crate::ports::{PaymentGateway, ProfileRepository, TransactionLedger};

/// Reconciler behaviour and redirect timing.
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Confirm with the gateway before granting access.
    pub verify_with_gateway: bool,
    /// Plan price used when nothing better is known.
    pub plan_amount: Amount,
    pub plan_context: Option<String>,
    pub currency: Currency,
    /// Countdown before the dashboard redirect.
    pub dashboard_countdown_secs: u64,
    /// Countdown before the payment-page redirect.
    pub payment_countdown_secs: u64,
    /// Delay before sending a user who was not paying back home.
    pub home_redirect_delay_secs: u64,
}

/// Query parameters the gateway may append to the return URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnParams {
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
}

impl ReturnParams {
    pub fn is_empty(&self) -> bool {
        [&self.transaction_id, &self.amount, &self.status]
            .iter()
            .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// Command to reconcile a return from checkout.
#[derive(Debug, Clone)]
pub struct ReconcileReturnCommand {
    pub user: AuthenticatedUser,
    pub params: ReturnParams,
}

/// Where the user goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    Dashboard,
    Payment,
    Home,
}

impl RedirectTarget {
    pub fn path(&self) -> &'static str {
        match self {
            RedirectTarget::Dashboard => "/dashboard",
            RedirectTarget::Payment => "/payment",
            RedirectTarget::Home => "/",
        }
    }
}

/// What reconciliation decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Already paid before this visit.
    AlreadyPaid,
    /// Gateway appended return parameters; reported only.
    ExplicitReturn {
        transaction_id: Option<String>,
        status: Option<PaymentStatus>,
    },
    /// No ledger entries: the user did not come from checkout.
    NotReturningFromPayment,
    /// Access granted from the most recent ledger entry.
    Granted { transaction_id: TransactionId },
    /// The webhook won the race; nothing changed.
    AlreadyGranted { transaction_id: TransactionId },
    /// The gateway reported the payment failed.
    PaymentFailed { transaction_id: TransactionId },
    /// The gateway has not settled yet; left for the webhook.
    AwaitingConfirmation { transaction_id: TransactionId },
}

/// Result of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReturnResult {
    pub outcome: ReconcileOutcome,
    pub is_paid: bool,
    pub redirect: RedirectTarget,
    pub redirect_after_secs: u64,
}

pub struct ReconcilePaymentReturnHandler {
    ledger: Arc<dyn TransactionLedger>,
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn PaymentGateway>,
    entitlements: Arc<EntitlementService>,
    settings: ReconcilerSettings,
}

impl ReconcilePaymentReturnHandler {
    pub fn new(
        ledger: Arc<dyn TransactionLedger>,
        profiles: Arc<dyn ProfileRepository>,
        gateway: Arc<dyn PaymentGateway>,
        entitlements: Arc<EntitlementService>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            ledger,
            profiles,
            gateway,
            entitlements,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileReturnCommand,
    ) -> Result<ReconcileReturnResult, PaymentFlowError> {
        let user_id = &cmd.user.id;

        // 1. Already paid: straight to the dashboard
        let is_paid = self
            .profiles
            .find_entitlement(user_id)
            .await?
            .map_or(false, |e| e.is_paid);
        if is_paid {
            return Ok(self.settled(ReconcileOutcome::AlreadyPaid, true));
        }

        // 2. Explicit return parameters: the webhook stays authoritative
        if !cmd.params.is_empty() {
            let status = cmd.params.status.as_deref().map(PaymentStatus::from_gateway);
            tracing::info!(
                user_id = %user_id,
                transaction_id = cmd.params.transaction_id.as_deref().unwrap_or(""),
                status = status.map(|s| s.as_str()).unwrap_or("unknown"),
                "Return with explicit payment parameters, skipping fallback"
            );
            let outcome = ReconcileOutcome::ExplicitReturn {
                transaction_id: cmd.params.transaction_id,
                status,
            };
            return Ok(self.settled(outcome, false));
        }

        // 3. Fallback over the ledger
        let swept = self.ledger.sweep_expired(Timestamp::now()).await?;
        if swept > 0 {
            tracing::debug!(swept, "Swept expired ledger entries on return");
        }

        let entries = self.ledger.entries_for_user(user_id).await?;
        let Some(latest) = entries.into_iter().next() else {
            tracing::info!(user_id = %user_id, "No pending transactions, not returning from payment");
            return Ok(ReconcileReturnResult {
                outcome: ReconcileOutcome::NotReturningFromPayment,
                is_paid: false,
                redirect: RedirectTarget::Home,
                redirect_after_secs: self.settings.home_redirect_delay_secs,
            });
        };

        if self.settings.verify_with_gateway {
            self.verify_then_apply(&cmd.user, latest).await
        } else {
            let update = self.update_for(&latest, None);
            self.apply(&cmd.user, latest.transaction_id, update).await
        }
    }

    async fn verify_then_apply(
        &self,
        user: &AuthenticatedUser,
        latest: TransactionUserLedgerEntry,
    ) -> Result<ReconcileReturnResult, PaymentFlowError> {
        let transaction_id = latest.transaction_id.clone();

        let report = match self.gateway.get_transaction_status(&transaction_id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    error = %e,
                    "Could not confirm payment with gateway, leaving it to the webhook"
                );
                return Ok(self.settled(ReconcileOutcome::AwaitingConfirmation { transaction_id }, false));
            }
        };

        match report.status {
            PaymentStatus::Completed => {
                let update = self.update_for(&latest, Some(&report.raw));
                self.apply(user, transaction_id, update).await
            }
            PaymentStatus::Failed => {
                tracing::info!(transaction_id = %transaction_id, "Gateway reports payment failed");
                self.ledger.clear(&transaction_id).await?;
                Ok(self.settled(ReconcileOutcome::PaymentFailed { transaction_id }, false))
            }
            PaymentStatus::Pending => {
                Ok(self.settled(ReconcileOutcome::AwaitingConfirmation { transaction_id }, false))
            }
        }
    }

    async fn apply(
        &self,
        user: &AuthenticatedUser,
        transaction_id: TransactionId,
        update: EntitlementUpdate,
    ) -> Result<ReconcileReturnResult, PaymentFlowError> {
        let applied = self
            .entitlements
            .apply(&user.id, &update, EntitlementSource::ReturnReconciler)
            .await?;

        let cleared = self.ledger.clear_for_user(&user.id).await?;
        tracing::info!(
            user_id = %user.id,
            transaction_id = %transaction_id,
            cleared,
            "Reconciled payment return"
        );

        let outcome = match applied {
            ApplyOutcome::Applied => ReconcileOutcome::Granted { transaction_id },
            ApplyOutcome::AlreadyApplied => ReconcileOutcome::AlreadyGranted { transaction_id },
        };
        Ok(self.settled(outcome, true))
    }

    fn update_for(
        &self,
        entry: &TransactionUserLedgerEntry,
        raw: Option<&serde_json::Value>,
    ) -> EntitlementUpdate {
        let reported = raw
            .and_then(|raw| raw.get("amount").or_else(|| raw.pointer("/data/amount")))
            .and_then(serde_json::Value::as_i64)
            .filter(|amount| *amount > 0)
            .map(Amount::whole);

        EntitlementUpdate {
            amount: reported.unwrap_or(self.settings.plan_amount),
            transaction_id: entry.transaction_id.clone(),
            currency: self.settings.currency.clone(),
            context: self.settings.plan_context.clone(),
        }
    }

    fn settled(&self, outcome: ReconcileOutcome, is_paid: bool) -> ReconcileReturnResult {
        let (redirect, redirect_after_secs) = if is_paid {
            (RedirectTarget::Dashboard, self.settings.dashboard_countdown_secs)
        } else {
            (RedirectTarget::Payment, self.settings.payment_countdown_secs)
        };
        ReconcileReturnResult {
            outcome,
            is_paid,
            redirect,
            redirect_after_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::InMemoryEntitlementAuditLog;
    use crate::adapters::gateway::MockPaymentGateway;
    use crate::adapters::ledger::{CachedTransactionLedger, InMemoryLedgerStore};
    use crate::adapters::profile::InMemoryProfileRepository;
    use crate::domain::foundation::UserId;
    use crate::domain::payment::UserEntitlement;
    use crate::ports::GatewayError;

    struct Fixture {
        handler: ReconcilePaymentReturnHandler,
        ledger: Arc<CachedTransactionLedger<InMemoryLedgerStore>>,
        profiles: InMemoryProfileRepository,
        gateway: MockPaymentGateway,
    }

    fn settings(verify_with_gateway: bool) -> ReconcilerSettings {
        ReconcilerSettings {
            verify_with_gateway,
            plan_amount: Amount::whole(499),
            plan_context: Some("Plano Premium".to_string()),
            currency: Currency::mzn(),
            dashboard_countdown_secs: 5,
            payment_countdown_secs: 5,
            home_redirect_delay_secs: 3,
        }
    }

    fn fixture(verify_with_gateway: bool) -> Fixture {
        let ledger = Arc::new(CachedTransactionLedger::new(InMemoryLedgerStore::new()));
        let profiles = InMemoryProfileRepository::new();
        let gateway = MockPaymentGateway::new();
        let entitlements = Arc::new(EntitlementService::new(
            Arc::new(profiles.clone()),
            Arc::new(InMemoryEntitlementAuditLog::new()),
            "mobile_money",
        ));
        let handler = ReconcilePaymentReturnHandler::new(
            ledger.clone(),
            Arc::new(profiles.clone()),
            Arc::new(gateway.clone()),
            entitlements,
            settings(verify_with_gateway),
        );
        Fixture {
            handler,
            ledger,
            profiles,
            gateway,
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("user_1").unwrap(), "a@b.com", None)
    }

    fn tx(id: &str) -> TransactionId {
        TransactionId::new(id).unwrap()
    }

    fn command(params: ReturnParams) -> ReconcileReturnCommand {
        ReconcileReturnCommand { user: user(), params }
    }

    async fn register_at(f: &Fixture, id: &str, minutes_ago: i64) {
        f.ledger
            .register(TransactionUserLedgerEntry::created_at(
                tx(id),
                user().id,
                "a@b.com",
                Timestamp::now().minus_minutes(minutes_ago),
            ))
            .await
            .unwrap();
    }

    async fn is_paid(f: &Fixture) -> bool {
        f.profiles
            .find_entitlement(&user().id)
            .await
            .unwrap()
            .map_or(false, |e| e.is_paid)
    }

    #[tokio::test]
    async fn no_entries_redirects_home_without_mutation() {
        let f = fixture(false);

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::NotReturningFromPayment);
        assert_eq!(result.redirect, RedirectTarget::Home);
        assert_eq!(result.redirect_after_secs, 3);
        assert!(f.profiles.find_entitlement(&user().id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn optimistic_fallback_grants_latest_and_clears_all() {
        let f = fixture(false);
        register_at(&f, "tx_old", 20).await;
        register_at(&f, "tx_new", 2).await;

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::Granted { transaction_id: tx("tx_new") });
        assert_eq!(result.redirect, RedirectTarget::Dashboard);
        assert!(result.is_paid);

        let ent = f.profiles.find_entitlement(&user().id).await.unwrap().unwrap();
        assert_eq!(ent.transaction_id, Some(tx("tx_new")));
        assert_eq!(ent.payment_amount, Some(Amount::whole(499)));
        assert!(f.ledger.entries_for_user(&user().id).await.unwrap().is_empty());
        assert_eq!(f.gateway.call_count("get_transaction_status"), 0);
    }

    #[tokio::test]
    async fn expired_entries_are_swept_before_fallback() {
        let f = fixture(false);
        register_at(&f, "tx_stale", 90).await;

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::NotReturningFromPayment);
        assert!(!is_paid(&f).await);
    }

    #[tokio::test]
    async fn explicit_params_skip_fallback() {
        let f = fixture(false);
        register_at(&f, "tx_1", 2).await;

        let params = ReturnParams {
            transaction_id: Some("tx_1".to_string()),
            amount: Some("499".to_string()),
            status: Some("completed".to_string()),
        };
        let result = f.handler.handle(command(params)).await.unwrap();

        assert_eq!(
            result.outcome,
            ReconcileOutcome::ExplicitReturn {
                transaction_id: Some("tx_1".to_string()),
                status: Some(PaymentStatus::Completed),
            }
        );
        assert_eq!(result.redirect, RedirectTarget::Payment);
        assert!(!is_paid(&f).await);
        assert_eq!(f.ledger.entries_for_user(&user().id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn already_paid_goes_to_dashboard() {
        let f = fixture(false);
        let mut paid = UserEntitlement::unpaid(user().id);
        paid.is_paid = true;
        f.profiles.insert(paid).await;
        register_at(&f, "tx_1", 2).await;

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::AlreadyPaid);
        assert_eq!(result.redirect.path(), "/dashboard");
    }

    #[tokio::test]
    async fn verified_completed_payment_is_granted() {
        let f = fixture(true);
        register_at(&f, "tx_1", 2).await;
        f.gateway.script_status("tx_1", [PaymentStatus::Completed]);

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::Granted { transaction_id: tx("tx_1") });
        assert!(is_paid(&f).await);
    }

    #[tokio::test]
    async fn verified_failed_payment_clears_without_granting() {
        let f = fixture(true);
        register_at(&f, "tx_1", 2).await;
        f.gateway.script_status("tx_1", [PaymentStatus::Failed]);

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::PaymentFailed { transaction_id: tx("tx_1") });
        assert_eq!(result.redirect, RedirectTarget::Payment);
        assert!(!is_paid(&f).await);
        assert!(f.ledger.lookup(&tx("tx_1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unconfirmed_payment_is_left_for_webhook() {
        let f = fixture(true);
        register_at(&f, "tx_1", 2).await;
        f.gateway.set_error(GatewayError::connectivity("offline"));

        let result = f.handler.handle(command(ReturnParams::default())).await.unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::AwaitingConfirmation { transaction_id: tx("tx_1") });
        assert!(!is_paid(&f).await);
        assert!(f.ledger.lookup(&tx("tx_1")).await.unwrap().is_some());
    }

    #[test]
    fn blank_params_count_as_absent() {
        let params = ReturnParams {
            transaction_id: Some("  ".to_string()),
            amount: None,
            status: Some(String::new()),
        };
        assert!(params.is_empty());
    }
}
