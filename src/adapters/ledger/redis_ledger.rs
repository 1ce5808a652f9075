//! Redis-backed transaction ledger for multi-instance deployments.
//!
//! Layout:
//! - `{prefix}:tx:{transaction_id}` holds the JSON record, with `EX` set to
//!   the retention window so Redis expires entries on its own
//! - `{prefix}:user:{user_id}` is a set of the user's transaction ids
//!
//! Registration writes both keys in one `MULTI` block.

use async_trait::async_trait;
use chrono::Duration;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{Timestamp, TransactionId, UserId};
use crate::domain::payment::{
    retention_from_secs, TransactionUserLedgerEntry, DEFAULT_LEDGER_RETENTION_SECS,
};
use crate::ports::{LedgerError, SnapshotRecord, TransactionLedger};

const DEFAULT_KEY_PREFIX: &str = "amsync:ledger";

fn unavailable(e: redis::RedisError) -> LedgerError {
    LedgerError::Unavailable(e.to_string())
}

/// Shared ledger in Redis.
#[derive(Clone)]
pub struct RedisTransactionLedger {
    conn: MultiplexedConnection,
    prefix: String,
    retention: Duration,
}

impl RedisTransactionLedger {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            retention: retention_from_secs(DEFAULT_LEDGER_RETENTION_SECS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn tx_key(&self, transaction_id: &str) -> String {
        format!("{}:tx:{}", self.prefix, transaction_id)
    }

    fn user_key(&self, user_id: &str) -> String {
        format!("{}:user:{}", self.prefix, user_id)
    }

    fn retention_secs(&self) -> i64 {
        self.retention.num_seconds().max(1)
    }

    async fn read_record(
        &self,
        conn: &mut MultiplexedConnection,
        transaction_id: &str,
    ) -> Result<Option<SnapshotRecord>, LedgerError> {
        let raw: Option<String> = conn.get(self.tx_key(transaction_id)).await.map_err(unavailable)?;
        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(transaction_id, error = %e, "Unreadable ledger record in Redis");
                None
            }
        }))
    }

    async fn remove(
        &self,
        conn: &mut MultiplexedConnection,
        transaction_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut pipe = redis::pipe();
        pipe.atomic().del(self.tx_key(transaction_id)).ignore();
        if let Some(user_id) = user_id {
            pipe.srem(self.user_key(user_id), transaction_id).ignore();
        }
        pipe.query_async::<_, ()>(conn).await.map_err(unavailable)
    }
}

#[async_trait]
impl TransactionLedger for RedisTransactionLedger {
    async fn register(&self, entry: TransactionUserLedgerEntry) -> Result<(), LedgerError> {
        let record = serde_json::to_string(&SnapshotRecord::from(&entry))
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let user_key = self.user_key(entry.user_id.as_str());
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(self.tx_key(entry.transaction_id.as_str()))
            .arg(record)
            .arg("EX")
            .arg(self.retention_secs())
            .ignore()
            .sadd(&user_key, entry.transaction_id.as_str())
            .ignore()
            .expire(&user_key, self.retention_secs())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)?;

        tracing::info!(
            transaction_id = %entry.transaction_id,
            user_id = %entry.user_id,
            "Registered transaction in Redis ledger"
        );
        Ok(())
    }

    async fn lookup(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionUserLedgerEntry>, LedgerError> {
        let mut conn = self.conn.clone();
        let Some(record) = self.read_record(&mut conn, transaction_id.as_str()).await? else {
            return Ok(None);
        };

        match record.to_entry(transaction_id.as_str()) {
            Some(entry) if !entry.is_expired(Timestamp::now(), self.retention) => Ok(Some(entry)),
            _ => {
                self.remove(&mut conn, transaction_id.as_str(), Some(&record.user_id))
                    .await?;
                Ok(None)
            }
        }
    }

    async fn clear(&self, transaction_id: &TransactionId) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();
        let record = self.read_record(&mut conn, transaction_id.as_str()).await?;
        self.remove(
            &mut conn,
            transaction_id.as_str(),
            record.as_ref().map(|r| r.user_id.as_str()),
        )
        .await
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<usize, LedgerError> {
        let mut conn = self.conn.clone();

        let user_keys: Vec<String> = {
            let mut iter = conn
                .scan_match::<_, String>(format!("{}:user:*", self.prefix))
                .await
                .map_err(unavailable)?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let mut removed = 0;
        for user_key in user_keys {
            let members: Vec<String> = conn.smembers(&user_key).await.map_err(unavailable)?;
            for transaction_id in members {
                let live = self
                    .read_record(&mut conn, &transaction_id)
                    .await?
                    .and_then(|record| record.to_entry(&transaction_id))
                    .map(|entry| !entry.is_expired(now, self.retention))
                    .unwrap_or(false);

                if !live {
                    redis::pipe()
                        .atomic()
                        .del(self.tx_key(&transaction_id))
                        .ignore()
                        .srem(&user_key, &transaction_id)
                        .ignore()
                        .query_async::<_, ()>(&mut conn)
                        .await
                        .map_err(unavailable)?;
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Swept expired Redis ledger entries");
        }
        Ok(removed)
    }

    async fn entries_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TransactionUserLedgerEntry>, LedgerError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .smembers(self.user_key(user_id.as_str()))
            .await
            .map_err(unavailable)?;

        let now = Timestamp::now();
        let mut entries = Vec::with_capacity(members.len());
        for transaction_id in members {
            let entry = self
                .read_record(&mut conn, &transaction_id)
                .await?
                .and_then(|record| record.to_entry(&transaction_id))
                .filter(|entry| &entry.user_id == user_id && !entry.is_expired(now, self.retention));
            match entry {
                Some(entry) => entries.push(entry),
                None => {
                    conn.srem::<_, _, ()>(self.user_key(user_id.as_str()), &transaction_id)
                        .await
                        .map_err(unavailable)?;
                }
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn clear_for_user(&self, user_id: &UserId) -> Result<usize, LedgerError> {
        let mut conn = self.conn.clone();
        let user_key = self.user_key(user_id.as_str());
        let members: Vec<String> = conn.smembers(&user_key).await.map_err(unavailable)?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for transaction_id in &members {
            pipe.del(self.tx_key(transaction_id)).ignore();
        }
        pipe.del(&user_key).ignore();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(unavailable)?;

        Ok(members.len())
    }
}

impl std::fmt::Debug for RedisTransactionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTransactionLedger")
            .field("prefix", &self.prefix)
            .field("retention_secs", &self.retention.num_seconds())
            .finish_non_exhaustive()
    }
}
