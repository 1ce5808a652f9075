//! Payment domain module.
//!
//! Payment intents, the transaction-to-user ledger entry, user entitlement and
//! the inbound webhook contract.
//!
//! # Module Structure
//!
//! - `money` - Currency, Amount and the legacy `format_amount` display
//! - `intent` - PaymentIntent and gateway PaymentStatus
//! - `ledger_entry` - Transaction-to-user mapping with expiry
//! - `entitlement` - UserEntitlement and idempotent apply
//! - `webhook` - Normalised inbound webhook payload
//! - `webhook_verifier` - HMAC-SHA256 signature verification

mod entitlement;
mod errors;
mod intent;
mod ledger_entry;
mod money;
mod webhook;
mod webhook_errors;
mod webhook_verifier;

pub use entitlement::{ApplyOutcome, EntitlementSource, EntitlementUpdate, UserEntitlement};
pub use errors::PaymentFlowError;
pub use intent::{PaymentIntent, PaymentStatus};
pub use ledger_entry::{
    retention_from_secs, TransactionUserLedgerEntry, DEFAULT_LEDGER_RETENTION_SECS,
};
pub use money::{format_amount, Amount, AmountUnit, Currency, LEGACY_MINOR_UNIT_THRESHOLD};
pub use webhook::InboundWebhook;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{
    gateway_signature_header, WebhookSignatureVerifier, GENERIC_SIGNATURE_HEADER,
};
