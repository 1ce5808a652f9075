//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `payment` - Payment intents, ledger entries, entitlement and webhooks
//!
//! Nothing in here performs I/O.

pub mod foundation;
pub mod payment;
