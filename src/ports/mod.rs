//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `PaymentGateway` - Hosted-checkout gateway (create payment, status)
//! - `TransactionLedger` - Transaction-to-user mapping with expiry
//! - `LedgerSnapshotStore` - Durable snapshot behind the cached ledger
//!
//! ## Entitlement Ports
//!
//! - `ProfileRepository` - Entitlement fields on the user profile
//! - `EntitlementAuditLog` - One record per effective entitlement change
//!
//! ## Auth Ports
//!
//! - `SessionValidator` - Bearer token validation

mod entitlement_audit_log;
mod ledger_snapshot_store;
mod payment_gateway;
mod profile_repository;
mod session_validator;
mod transaction_ledger;

pub use entitlement_audit_log::{EntitlementAuditLog, EntitlementAuditRecord};
pub use ledger_snapshot_store::{
    LedgerSnapshot, LedgerSnapshotStore, SnapshotRecord, LEDGER_STORAGE_KEY,
};
pub use payment_gateway::{
    CreatePaymentRequest, CreatedPayment, GatewayError, GatewayErrorCode, PaymentGateway,
    TransactionStatusReport,
};
pub use profile_repository::ProfileRepository;
pub use session_validator::SessionValidator;
pub use transaction_ledger::{LedgerError, TransactionLedger};
