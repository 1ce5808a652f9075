//! Transaction ledger adapters.
//!
//! - `CachedTransactionLedger` - in-process cache over a snapshot store
//! - `FileLedgerStore` - single JSON file snapshot
//! - `InMemoryLedgerStore` - raw-string snapshot for tests and development
//! - `RedisTransactionLedger` - shared ledger for multi-instance deployments

mod cached_ledger;
mod document;
mod file_store;
mod in_memory_store;
mod redis_ledger;

pub use cached_ledger::CachedTransactionLedger;
pub use file_store::FileLedgerStore;
pub use in_memory_store::InMemoryLedgerStore;
pub use redis_ledger::RedisTransactionLedger;
