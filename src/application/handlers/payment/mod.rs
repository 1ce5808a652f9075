//! Payment handlers: creation, status, webhook ingestion and return reconciliation.

mod create_payment;
mod get_payment_status;
mod handle_payment_webhook;
mod poll_payment_status;
mod reconcile_return;

pub use create_payment::{
    CheckoutSettings, CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult,
};
pub use get_payment_status::{GetPaymentStatusHandler, GetPaymentStatusQuery};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    WebhookOutcome, WebhookSettings,
};
pub use poll_payment_status::{
    PaymentStatusPoller, PollOutcome, PollingSettings, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT,
};
pub use reconcile_return::{
    ReconcileOutcome, ReconcilePaymentReturnHandler, ReconcileReturnCommand,
    ReconcileReturnResult, RedirectTarget, ReconcilerSettings, ReturnParams,
};
