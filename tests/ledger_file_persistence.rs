//! Integration tests for the file-backed transaction ledger.
//!
//! A fresh `CachedTransactionLedger` over the same file stands in for a
//! process restart.

use chrono::Duration;
use tempfile::TempDir;

use amsync_payments::adapters::ledger::{CachedTransactionLedger, FileLedgerStore};
use amsync_payments::domain::foundation::{Timestamp, TransactionId, UserId};
use amsync_payments::domain::payment::TransactionUserLedgerEntry;
use amsync_payments::ports::TransactionLedger;

fn ledger_at(dir: &TempDir) -> CachedTransactionLedger<FileLedgerStore> {
    CachedTransactionLedger::new(FileLedgerStore::new(dir.path().join("data").join("ledger.json")))
}

fn entry(tx: &str, user: &str) -> TransactionUserLedgerEntry {
    TransactionUserLedgerEntry::new(
        TransactionId::new(tx).unwrap(),
        UserId::new(user).unwrap(),
        format!("{}@example.com", user),
    )
}

#[tokio::test]
async fn entries_survive_restart() {
    let dir = TempDir::new().unwrap();
    ledger_at(&dir).register(entry("tx_1", "user_1")).await.unwrap();

    let restarted = ledger_at(&dir);
    let found = restarted
        .lookup(&TransactionId::new("tx_1").unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.user_id.as_str(), "user_1");
    assert_eq!(found.user_email, "user_1@example.com");
}

#[tokio::test]
async fn clear_is_persisted() {
    let dir = TempDir::new().unwrap();
    let ledger = ledger_at(&dir);
    ledger.register(entry("tx_1", "user_1")).await.unwrap();
    ledger.clear(&TransactionId::new("tx_1").unwrap()).await.unwrap();

    let restarted = ledger_at(&dir);
    assert!(restarted
        .lookup(&TransactionId::new("tx_1").unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn two_instances_do_not_lose_each_others_writes() {
    let dir = TempDir::new().unwrap();
    let a = ledger_at(&dir);
    let b = ledger_at(&dir);

    a.register(entry("tx_1", "user_1")).await.unwrap();
    b.register(entry("tx_2", "user_2")).await.unwrap();

    let restarted = ledger_at(&dir);
    assert!(restarted.lookup(&TransactionId::new("tx_1").unwrap()).await.unwrap().is_some());
    assert!(restarted.lookup(&TransactionId::new("tx_2").unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn corrupt_file_reads_as_empty_and_is_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let ledger = CachedTransactionLedger::new(FileLedgerStore::new(&path));
    assert!(ledger
        .lookup(&TransactionId::new("tx_1").unwrap())
        .await
        .unwrap()
        .is_none());

    ledger.register(entry("tx_1", "user_1")).await.unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("amsync_tx_user_map"));
    assert!(raw.contains("tx_1"));
}

#[tokio::test]
async fn expired_entries_are_swept_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    let ledger = CachedTransactionLedger::with_retention(FileLedgerStore::new(&path), Duration::hours(1));

    ledger.register(entry("tx_1", "user_1")).await.unwrap();
    let later = Timestamp::now().plus_secs(2 * 3600);
    let removed = ledger.sweep_expired(later).await.unwrap();

    assert_eq!(removed, 1);
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("tx_1"));
}

#[tokio::test]
async fn entries_for_user_only_returns_that_user() {
    let dir = TempDir::new().unwrap();
    let ledger = ledger_at(&dir);
    ledger.register(entry("tx_1", "user_1")).await.unwrap();
    ledger.register(entry("tx_2", "user_2")).await.unwrap();
    ledger.register(entry("tx_3", "user_1")).await.unwrap();

    let entries = ledger
        .entries_for_user(&UserId::new("user_1").unwrap())
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.user_id.as_str() == "user_1"));
}
