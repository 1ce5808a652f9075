//! Profile store adapters for user entitlement.

mod in_memory;
mod postgres_repository;

pub use in_memory::InMemoryProfileRepository;
pub use postgres_repository::PostgresProfileRepository;
