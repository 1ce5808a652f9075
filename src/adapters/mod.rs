//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `gateway` - Hosted-checkout payment gateway (HTTP, mock)
//! - `ledger` - Transaction-user ledger (file/in-memory snapshot, Redis)
//! - `profile` - Entitlement store (PostgreSQL, in-memory)
//! - `audit` - Entitlement audit log
//! - `auth` - Identity token validation (JWT, mock)
//! - `http` - axum REST surface

pub mod audit;
pub mod auth;
pub mod gateway;
pub mod http;
pub mod ledger;
pub mod profile;
