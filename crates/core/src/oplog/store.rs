//! Oplog store (spec §4.6): persists entries, answers chain/range queries,
//! prunes under snapshot. `OplogStore` is the seam a physical storage
//! backend would implement — the backend itself is out of scope (spec §1).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::hlc::HlcTimestamp;
use crate::oplog::entry::OplogEntry;

pub trait OplogStore: Send + Sync {
    /// O(1) insert. `previous_hash` must match the Vector Clock's current
    /// last-hash for `entry.timestamp.node_id`; the store itself persists
    /// verbatim (CDC is responsible for supplying it correctly, spec
    /// §4.6).
    fn append(&self, entry: OplogEntry) -> CoreResult<()>;

    /// Entries strictly greater than `timestamp` (total order), optionally
    /// filtered to a set of collections, ascending.
    fn oplog_after(&self, timestamp: &HlcTimestamp, collections: Option<&[String]>) -> Vec<OplogEntry>;

    /// Same, filtered to a single originating node.
    fn oplog_for_node_after(
        &self,
        node_id: &str,
        since: &HlcTimestamp,
        collections: Option<&[String]>,
    ) -> Vec<OplogEntry>;

    /// Entries of the originating node of `start_hash`, strictly greater
    /// than start and less-than-or-equal to end, ascending.
    fn chain_range(&self, start_hash: &str, end_hash: &str) -> Vec<OplogEntry>;

    fn entry_by_hash(&self, hash: &str) -> Option<OplogEntry>;

    /// Cache lookup for `GetLastHash(nodeId)`, falling through to an Oplog
    /// scan. The SnapshotMetadata fallback (for pruned chains) lives one
    /// layer up, in the engine that owns both stores (spec §4.6).
    fn last_hash_for_node(&self, node_id: &str) -> Option<String>;

    fn last_timestamp_for_node(&self, node_id: &str) -> Option<HlcTimestamp>;

    /// Deletes entries with `timestamp <= cutoff`. Callers must have
    /// persisted a SnapshotMetadata covering the pruned region first.
    fn prune(&self, cutoff: &HlcTimestamp) -> CoreResult<usize>;

    /// Idempotent: entries whose hash already exists are dropped. Returns
    /// the entries that were newly persisted.
    fn merge(&self, entries: Vec<OplogEntry>) -> CoreResult<Vec<OplogEntry>>;

    /// Wipes every chain (spec §4.7 `ReplaceDatabase`).
    fn clear(&self) -> CoreResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory reference implementation. Ordered per-node so chain queries
/// stay O(chain length); a full scan backs the cross-node queries.
#[derive(Default)]
pub struct MemoryOplogStore {
    by_node: Mutex<HashMap<String, Vec<OplogEntry>>>,
}

impl MemoryOplogStore {
    pub fn new() -> Self {
        Self { by_node: Mutex::new(HashMap::new()) }
    }
}

impl OplogStore for MemoryOplogStore {
    fn append(&self, entry: OplogEntry) -> CoreResult<()> {
        let mut by_node = self.by_node.lock().expect("oplog mutex poisoned");
        let chain = by_node.entry(entry.timestamp.node_id.clone()).or_default();
        if let Some(last) = chain.last() {
            if last.timestamp >= entry.timestamp {
                return Err(CoreError::Chain(format!(
                    "out-of-order append for node {}: {} is not after {}",
                    entry.timestamp.node_id, entry.timestamp, last.timestamp
                )));
            }
        }
        chain.push(entry);
        Ok(())
    }

    fn oplog_after(&self, timestamp: &HlcTimestamp, collections: Option<&[String]>) -> Vec<OplogEntry> {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        let mut out: Vec<OplogEntry> = by_node
            .values()
            .flatten()
            .filter(|e| &e.timestamp > timestamp)
            .filter(|e| collections.is_none_or(|cs| cs.iter().any(|c| c == &e.collection)))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        out
    }

    fn oplog_for_node_after(
        &self,
        node_id: &str,
        since: &HlcTimestamp,
        collections: Option<&[String]>,
    ) -> Vec<OplogEntry> {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        by_node
            .get(node_id)
            .map(|chain| {
                chain
                    .iter()
                    .filter(|e| &e.timestamp > since)
                    .filter(|e| collections.is_none_or(|cs| cs.iter().any(|c| c == &e.collection)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn chain_range(&self, start_hash: &str, end_hash: &str) -> Vec<OplogEntry> {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        let Some(chain) = by_node.values().find(|chain| chain.iter().any(|e| e.hash == start_hash))
        else {
            return Vec::new();
        };
        let start_ts = chain.iter().find(|e| e.hash == start_hash).map(|e| e.timestamp.clone());
        let Some(start_ts) = start_ts else { return Vec::new() };
        let end_ts = chain.iter().find(|e| e.hash == end_hash).map(|e| e.timestamp.clone());
        chain
            .iter()
            .filter(|e| e.timestamp > start_ts)
            .filter(|e| end_ts.as_ref().is_none_or(|end| e.timestamp <= *end))
            .cloned()
            .collect()
    }

    fn entry_by_hash(&self, hash: &str) -> Option<OplogEntry> {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        by_node.values().flatten().find(|e| e.hash == hash).cloned()
    }

    fn last_hash_for_node(&self, node_id: &str) -> Option<String> {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        by_node.get(node_id).and_then(|chain| chain.last()).map(|e| e.hash.clone())
    }

    fn last_timestamp_for_node(&self, node_id: &str) -> Option<HlcTimestamp> {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        by_node.get(node_id).and_then(|chain| chain.last()).map(|e| e.timestamp.clone())
    }

    fn prune(&self, cutoff: &HlcTimestamp) -> CoreResult<usize> {
        let mut by_node = self.by_node.lock().expect("oplog mutex poisoned");
        let mut pruned = 0;
        for chain in by_node.values_mut() {
            let before = chain.len();
            chain.retain(|e| e.timestamp > *cutoff);
            pruned += before - chain.len();
        }
        Ok(pruned)
    }

    fn merge(&self, entries: Vec<OplogEntry>) -> CoreResult<Vec<OplogEntry>> {
        let mut by_node = self.by_node.lock().expect("oplog mutex poisoned");
        let mut newly_persisted = Vec::new();
        for entry in entries {
            let chain = by_node.entry(entry.timestamp.node_id.clone()).or_default();
            if chain.iter().any(|e| e.hash == entry.hash) {
                continue;
            }
            chain.push(entry.clone());
            chain.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            newly_persisted.push(entry);
        }
        Ok(newly_persisted)
    }

    fn clear(&self) -> CoreResult<()> {
        self.by_node.lock().expect("oplog mutex poisoned").clear();
        Ok(())
    }

    fn len(&self) -> usize {
        let by_node = self.by_node.lock().expect("oplog mutex poisoned");
        by_node.values().map(|c| c.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::entry::Op;
    use serde_json::json;

    fn put(node: &str, phys: i64, collection: &str, key: &str, prev: &str) -> OplogEntry {
        OplogEntry::new(
            collection,
            key,
            Op::Put,
            Some(json!({"v": phys})),
            HlcTimestamp::new(phys, 0, node),
            prev,
        )
    }

    #[test]
    fn append_and_scan_back() {
        let store = MemoryOplogStore::new();
        let e1 = put("a", 100, "users", "u1", "");
        store.append(e1.clone()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.last_hash_for_node("a").unwrap(), e1.hash);
    }

    #[test]
    fn merge_is_idempotent() {
        let store = MemoryOplogStore::new();
        let e1 = put("a", 100, "users", "u1", "");
        let inserted_first = store.merge(vec![e1.clone()]).unwrap();
        let inserted_second = store.merge(vec![e1]).unwrap();
        assert_eq!(inserted_first.len(), 1);
        assert_eq!(inserted_second.len(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn prune_removes_up_to_cutoff() {
        let store = MemoryOplogStore::new();
        for i in 1..=5 {
            store.append(put("a", i * 10, "users", "u1", "")).unwrap();
        }
        let pruned = store.prune(&HlcTimestamp::new(30, 0, "a")).unwrap();
        assert_eq!(pruned, 3);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn chain_range_scoped_to_originating_node() {
        let store = MemoryOplogStore::new();
        let e1 = put("a", 10, "users", "u1", "");
        store.append(e1.clone()).unwrap();
        let e2 = put("a", 20, "users", "u1", &e1.hash);
        store.append(e2.clone()).unwrap();
        let e3 = put("a", 30, "users", "u1", &e2.hash);
        store.append(e3.clone()).unwrap();

        let range = store.chain_range(&e1.hash, &e3.hash);
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].hash, e2.hash);
        assert_eq!(range[1].hash, e3.hash);
    }
}
