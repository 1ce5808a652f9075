//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 tokens signed by the identity provider
//! - `mock` - Fixed token table for tests and local development

mod jwt;
mod mock;

pub use jwt::{IdentityClaims, JwtConfig, JwtSessionValidator};
pub use mock::MockSessionValidator;
