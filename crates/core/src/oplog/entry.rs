//! Oplog entry and per-node hash chain (spec §3, §4.2).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::hlc::HlcTimestamp;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Op {
    Put,
    Delete,
}

impl Op {
    /// Culture-invariant, fixed representation used in the hash input
    /// (spec §4.2: "formatted with a culture-invariant, fixed
    /// representation").
    fn canonical_tag(self) -> &'static str {
        match self {
            Op::Put => "PUT",
            Op::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OplogEntry {
    pub collection: String,
    pub key: String,
    pub op: Op,
    pub payload: Option<Value>,
    pub timestamp: HlcTimestamp,
    pub previous_hash: String,
    pub hash: String,
}

impl OplogEntry {
    /// Builds an entry and computes its `hash`. `previous_hash` is
    /// supplied by the caller (the Oplog store), per spec §4.2: "Oplog
    /// entry is a pure function of the fields; hash is always recomputed,
    /// previousHash is supplied by the caller".
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<String>,
        op: Op,
        payload: Option<Value>,
        timestamp: HlcTimestamp,
        previous_hash: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        let key = key.into();
        let previous_hash = previous_hash.into();
        let hash =
            compute_hash(&collection, &key, op, payload.as_ref(), &timestamp, &previous_hash);
        Self { collection, key, op, payload, timestamp, previous_hash, hash }
    }

    /// An entry is "valid" iff recomputing its hash matches the stored one
    /// (spec §3 invariant, §8 property 2).
    pub fn is_valid(&self) -> bool {
        let recomputed = compute_hash(
            &self.collection,
            &self.key,
            self.op,
            self.payload.as_ref(),
            &self.timestamp,
            &self.previous_hash,
        );
        recomputed == self.hash
    }
}

/// `hash = SHA-256(collection | key | op | payloadRawText | timestamp |
/// previousHash)`, hex-lowercase. The payload is hashed via its raw
/// canonical JSON bytes — numbers not reformatted, keys not reordered — so
/// every node that serializes identically produces the same hash.
fn compute_hash(
    collection: &str,
    key: &str,
    op: Op,
    payload: Option<&Value>,
    timestamp: &HlcTimestamp,
    previous_hash: &str,
) -> String {
    let payload_raw_text = match payload {
        Some(value) => serde_json::to_string(value).expect("Value always serializes"),
        None => String::new(),
    };
    let mut hasher = Sha256::new();
    hasher.update(collection.as_bytes());
    hasher.update(b"|");
    hasher.update(key.as_bytes());
    hasher.update(b"|");
    hasher.update(op.canonical_tag().as_bytes());
    hasher.update(b"|");
    hasher.update(payload_raw_text.as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_entry_is_self_consistent() {
        let ts = HlcTimestamp::new(100, 0, "a");
        let entry =
            OplogEntry::new("users", "u1", Op::Put, Some(json!({"name": "Alice"})), ts, "");
        assert!(entry.is_valid());
    }

    #[test]
    fn tampering_invalidates_the_entry() {
        let ts = HlcTimestamp::new(100, 0, "a");
        let mut entry =
            OplogEntry::new("users", "u1", Op::Put, Some(json!({"name": "Alice"})), ts, "");
        entry.payload = Some(json!({"name": "Mallory"}));
        assert!(!entry.is_valid());
    }

    #[test]
    fn chain_links_match_previous_hash() {
        let ts0 = HlcTimestamp::new(100, 0, "a");
        let genesis = OplogEntry::new("users", "u1", Op::Put, Some(json!({"n": 1})), ts0, "");
        let ts1 = HlcTimestamp::new(101, 0, "a");
        let second =
            OplogEntry::new("users", "u1", Op::Put, Some(json!({"n": 2})), ts1, &genesis.hash);
        assert_eq!(second.previous_hash, genesis.hash);
        assert!(genesis.previous_hash.is_empty());
    }

    #[test]
    fn same_fields_produce_same_hash_deterministically() {
        let ts = HlcTimestamp::new(100, 0, "a");
        let e1 = OplogEntry::new("users", "u1", Op::Put, Some(json!({"a": 1})), ts.clone(), "");
        let e2 = OplogEntry::new("users", "u1", Op::Put, Some(json!({"a": 1})), ts, "");
        assert_eq!(e1.hash, e2.hash);
    }
}
