//! Encoding of the persisted ledger document.
//!
//! The document is a JSON object with a single namespaced key:
//!
//! ```json
//! { "amsync_tx_user_map": { "tx_1": { "userId": "u1", "userEmail": "a@b.com", "timestamp": 1700000000000 } } }
//! ```

use serde_json::{Map, Value};

use crate::ports::{LedgerError, LedgerSnapshot, LEDGER_STORAGE_KEY};

/// Decodes a raw document. Corrupt or unexpected content is an empty ledger.
pub fn decode_document(raw: &str) -> LedgerSnapshot {
    if raw.trim().is_empty() {
        return LedgerSnapshot::new();
    }

    let mut document: Map<String, Value> = match serde_json::from_str(raw) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(error = %e, "Ledger document is not valid JSON, treating as empty");
            return LedgerSnapshot::new();
        }
    };

    match document.remove(LEDGER_STORAGE_KEY) {
        None | Some(Value::Null) => LedgerSnapshot::new(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ledger map has unexpected shape, treating as empty");
            LedgerSnapshot::new()
        }),
    }
}

/// Encodes a snapshot as a full document.
pub fn encode_document(snapshot: &LedgerSnapshot) -> Result<String, LedgerError> {
    let mut document = Map::new();
    document.insert(
        LEDGER_STORAGE_KEY.to_string(),
        serde_json::to_value(snapshot).map_err(|e| LedgerError::Serialization(e.to_string()))?,
    );
    serde_json::to_string_pretty(&Value::Object(document))
        .map_err(|e| LedgerError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SnapshotRecord;

    #[test]
    fn decodes_namespaced_map() {
        let raw = r#"{"amsync_tx_user_map":{"tx_1":{"userId":"user_1","userEmail":"a@b.com","timestamp":1700000000000}}}"#;
        let snapshot = decode_document(raw);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["tx_1"].user_id, "user_1");
    }

    #[test]
    fn corrupt_json_is_empty() {
        assert!(decode_document("{not json").is_empty());
        assert!(decode_document("").is_empty());
        assert!(decode_document(r#"{"amsync_tx_user_map":"oops"}"#).is_empty());
        assert!(decode_document(r#"{"other_key":{}}"#).is_empty());
    }

    #[test]
    fn encode_then_decode_preserves_records() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.insert(
            "tx_1".to_string(),
            SnapshotRecord {
                user_id: "user_1".to_string(),
                user_email: "a@b.com".to_string(),
                timestamp: 42,
            },
        );

        let raw = encode_document(&snapshot).unwrap();
        assert!(raw.contains(LEDGER_STORAGE_KEY));
        assert_eq!(decode_document(&raw), snapshot);
    }
}
