//! Document store with Change-Data-Capture (spec §4.5, §4.12).

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Semaphore};

use crate::error::{CoreError, CoreResult};
use crate::gap::GapTracker;
use crate::hlc::{HlcGenerator, HlcTimestamp};
use crate::oplog::{Op, OplogEntry, OplogStore};
use crate::resolver::{self, Resolution};
use crate::snapshot::SnapshotMetadata;
use crate::value::Value;
use crate::vector_clock::VectorClockService;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub collection: String,
    pub key: String,
    pub content: Value,
    pub updated_at: HlcTimestamp,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub collection: String,
    pub key: String,
    pub updated_at: HlcTimestamp,
    pub is_deleted: bool,
}

impl From<&Document> for DocumentMetadata {
    fn from(doc: &Document) -> Self {
        Self {
            collection: doc.collection.clone(),
            key: doc.key.clone(),
            updated_at: doc.updated_at.clone(),
            is_deleted: doc.is_deleted,
        }
    }
}

/// Which resolver the remote-apply path folds Puts through (spec §4.3
/// describes both; a real deployment picks one per collection — we expose
/// it per store instance to keep the surface small).
#[derive(Debug, Clone, Copy)]
pub enum ResolverStrategy {
    LastWriteWins,
    RecursiveMerge,
}

fn resolve(strategy: ResolverStrategy, local: Option<&Document>, remote: &OplogEntry) -> Resolution {
    match strategy {
        ResolverStrategy::LastWriteWins => resolver::resolve_lww(local, remote),
        ResolverStrategy::RecursiveMerge => resolver::resolve_recursive_merge(local, remote),
    }
}

type DocKey = (String, String);

pub struct DocumentStore {
    node_id: String,
    hlc: Arc<HlcGenerator>,
    oplog: Arc<dyn OplogStore>,
    vector_clock: Arc<VectorClockService>,
    documents: DashMap<DocKey, Document>,
    strategy: ResolverStrategy,
    /// Remote-sync guard (spec §4.12): a binary semaphore acquired for the
    /// duration of `apply_batch`/import. CDC observers check it before
    /// emitting any Oplog entry.
    remote_guard: Arc<Semaphore>,
    changes_applied: broadcast::Sender<Vec<OplogEntry>>,
    /// Durable per-node `SnapshotMetadata` (spec §4.6 `GetLastHash`
    /// fallback): survives Vector Clock invalidation and Oplog pruning, so
    /// a node whose own tail (or a remote node's tail) has been pruned
    /// still knows the real previous hash instead of treating the next
    /// write as a fresh chain.
    snapshot_metadata: DashMap<String, SnapshotMetadata>,
    gap: GapTracker,
}

impl DocumentStore {
    pub fn new(
        node_id: impl Into<String>,
        hlc: Arc<HlcGenerator>,
        oplog: Arc<dyn OplogStore>,
        vector_clock: Arc<VectorClockService>,
        strategy: ResolverStrategy,
    ) -> Self {
        let (changes_applied, _rx) = broadcast::channel(256);
        Self {
            node_id: node_id.into(),
            hlc,
            oplog,
            vector_clock,
            documents: DashMap::new(),
            strategy,
            remote_guard: Arc::new(Semaphore::new(1)),
            changes_applied,
            snapshot_metadata: DashMap::new(),
            gap: GapTracker::new(),
        }
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<Vec<OplogEntry>> {
        self.changes_applied.subscribe()
    }

    pub fn get(&self, collection: &str, key: &str) -> Option<Document> {
        self.documents.get(&(collection.to_string(), key.to_string())).map(|d| d.clone())
    }

    /// All materialized (non-deleted) documents in a collection. Used e.g.
    /// to expose the `RemotePeerConfiguration` collection, which spec §3
    /// requires to be "synchronized through the same Oplog machinery as
    /// user data" rather than held in a bespoke table.
    pub fn list_collection(&self, collection: &str) -> Vec<Document> {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection && !entry.value().is_deleted)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn guard_held(&self) -> bool {
        self.remote_guard.available_permits() == 0
    }

    fn previous_hash_for_self(&self) -> String {
        self.last_hash_for_node(&self.node_id).unwrap_or_default()
    }

    /// `GetLastHash(nodeId)` (spec §4.6): Vector Clock cache first, then a
    /// durable Oplog scan, then the last persisted `SnapshotMetadata` — the
    /// fallback that keeps working once a node's tail has been pruned.
    pub fn last_hash_for_node(&self, node_id: &str) -> Option<String> {
        self.vector_clock
            .last_hash(node_id)
            .or_else(|| self.oplog.last_hash_for_node(node_id))
            .or_else(|| self.snapshot_metadata.get(node_id).map(|m| m.hash.clone()))
    }

    pub fn gap(&self) -> &GapTracker {
        &self.gap
    }

    /// Records `SnapshotMetadata` durably, keeping only the
    /// highest-timestamp record per node (spec §4.6/§4.7). Must be called
    /// before pruning the region it covers, or the prune-safety guarantee
    /// in `last_hash_for_node` breaks.
    pub fn record_snapshot_metadata(&self, metadata: &[SnapshotMetadata]) {
        for entry in metadata {
            self.snapshot_metadata
                .entry(entry.node_id.clone())
                .and_modify(|existing| {
                    if entry.timestamp > existing.timestamp {
                        *existing = entry.clone();
                    }
                })
                .or_insert_with(|| entry.clone());
        }
    }

    /// Local write path (spec §4.5): mutate storage, then (unless the
    /// remote-sync guard is held — defensive, since callers should never
    /// reach this path mid-apply) generate an HLC tick, build the chained
    /// Oplog entry, persist it, and advance the Vector Clock.
    pub fn put_local(&self, collection: &str, key: &str, payload: Value) -> CoreResult<Document> {
        self.write_local(collection, key, Op::Put, Some(payload))
    }

    pub fn delete_local(&self, collection: &str, key: &str) -> CoreResult<Document> {
        self.write_local(collection, key, Op::Delete, None)
    }

    fn write_local(
        &self,
        collection: &str,
        key: &str,
        op: Op,
        payload: Option<Value>,
    ) -> CoreResult<Document> {
        let doc_key = (collection.to_string(), key.to_string());
        let document = Document {
            collection: collection.to_string(),
            key: key.to_string(),
            content: payload.clone().unwrap_or(Value::Null),
            updated_at: HlcTimestamp::zero(),
            is_deleted: op == Op::Delete,
        };

        if self.guard_held() {
            // Guard correctness (spec §8 property 7): CDC never emits
            // during a remote-apply scope, even if reached re-entrantly.
            return Ok(document);
        }

        let timestamp = self.hlc.generate();
        let previous_hash = self.previous_hash_for_self();
        let entry = OplogEntry::new(collection, key, op, payload, timestamp.clone(), previous_hash);
        self.oplog.append(entry.clone())?;

        let document = Document {
            collection: collection.to_string(),
            key: key.to_string(),
            content: entry.payload.clone().unwrap_or(Value::Null),
            updated_at: timestamp.clone(),
            is_deleted: op == Op::Delete,
        };
        self.documents.insert(doc_key, document.clone());
        self.gap.advance_from_batch(std::slice::from_ref(&entry));
        self.vector_clock.update_node(&self.node_id, timestamp, entry.hash.clone());
        let _ = self.changes_applied.send(vec![entry]);
        Ok(document)
    }

    /// Remote apply path (spec §4.5 `ApplyBatch`).
    pub fn apply_batch(&self, entries: Vec<OplogEntry>) -> CoreResult<()> {
        let permit = self
            .remote_guard
            .clone()
            .try_acquire_owned()
            .map_err(|_| CoreError::Concurrency("remote-sync guard already held".into()))?;

        let result = self.apply_batch_inner(entries);
        drop(permit); // released on every exit path, including the error case below
        result
    }

    fn apply_batch_inner(&self, entries: Vec<OplogEntry>) -> CoreResult<()> {
        let mut groups: HashMap<DocKey, Vec<OplogEntry>> = HashMap::new();
        for entry in &entries {
            groups
                .entry((entry.collection.clone(), entry.key.clone()))
                .or_default()
                .push(entry.clone());
        }

        for (doc_key, mut group) in groups {
            group.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            self.apply_group(doc_key, group)?;
        }

        // Chain/hash verification (spec §4.13, §8 property 2): an entry that
        // fails `is_valid()` is rejected outright, not merely kept out of
        // the materialized document — it must never reach the durable
        // Oplog, or the stored chain itself is corrupted.
        let valid_entries: Vec<OplogEntry> = entries
            .into_iter()
            .filter(|e| {
                let ok = e.is_valid();
                if !ok {
                    log::warn!("rejecting invalid oplog entry {} from durable merge", e.hash);
                }
                ok
            })
            .collect();

        let persisted = match self.oplog.merge(valid_entries) {
            Ok(persisted) => persisted,
            Err(err) => {
                // Persistence failure: invalidate the cache so it cannot
                // diverge from durable state (spec §4.13).
                self.vector_clock.invalidate();
                return Err(err);
            }
        };

        self.vector_clock.invalidate();
        self.reseed_vector_clock(&persisted);
        self.gap.advance_from_batch(&persisted);

        if !persisted.is_empty() {
            let _ = self.changes_applied.send(persisted);
        }
        Ok(())
    }

    fn apply_group(&self, doc_key: DocKey, group: Vec<OplogEntry>) -> CoreResult<()> {
        let current = self.documents.get(&doc_key).map(|d| d.clone());

        if let Some(delete_entry) = group.iter().filter(|e| e.op == Op::Delete).max_by_key(|e| e.timestamp.clone()) {
            let resolution = resolver::resolve_lww(current.as_ref(), delete_entry);
            if resolution.apply {
                self.documents.remove(&doc_key);
            }
            return Ok(());
        }

        let mut working = current;
        for entry in &group {
            if !entry.is_valid() {
                // Chain/hash verification failure (spec §4.13): reject
                // this entry, keep processing the rest of the batch.
                log::warn!("rejecting invalid oplog entry {} for {:?}", entry.hash, doc_key);
                continue;
            }
            let resolution = resolve(self.strategy, working.as_ref(), entry);
            if resolution.apply {
                working = resolution.merged;
            }
        }

        match working {
            Some(doc) => {
                self.documents.insert(doc_key, doc);
            }
            None => {
                self.documents.remove(&doc_key);
            }
        }
        Ok(())
    }

    /// Re-seeds the (just-invalidated) Vector Clock cache for every node
    /// touched by this batch, reading the durable last-hash/timestamp back
    /// out of the Oplog store (spec §4.5 step 5, §4.6 `GetLastHash`
    /// fallback chain).
    fn reseed_vector_clock(&self, persisted: &[OplogEntry]) {
        let mut seen = std::collections::HashSet::new();
        for entry in persisted {
            if !seen.insert(entry.timestamp.node_id.clone()) {
                continue;
            }
            let node_id = &entry.timestamp.node_id;
            if let (Some(ts), Some(hash)) = (
                self.oplog.last_timestamp_for_node(node_id),
                self.oplog.last_hash_for_node(node_id),
            ) {
                self.vector_clock.update_node(node_id, ts, hash);
            }
        }
    }

    pub fn oplog(&self) -> &Arc<dyn OplogStore> {
        &self.oplog
    }

    pub fn vector_clock(&self) -> &Arc<VectorClockService> {
        &self.vector_clock
    }

    /// `CreateSnapshot` (spec §4.7): full dump of live documents, the
    /// entire retained Oplog, and per-node snapshot metadata.
    pub fn export_snapshot(&self) -> crate::snapshot::Snapshot {
        let documents: Vec<Document> = self.documents.iter().map(|entry| entry.value().clone()).collect();
        let oplog_entries = self.oplog.oplog_after(&HlcTimestamp::new(0, 0, ""), None);
        let snapshot_metadata = crate::snapshot::Snapshot::metadata_for(&oplog_entries);
        // A node that creates a snapshot of its own state should remember
        // the same fallback record it's handing out, so its own later
        // pruning stays safe even if the Vector Clock cache is invalidated
        // in between (spec §4.6).
        self.record_snapshot_metadata(&snapshot_metadata);
        crate::snapshot::Snapshot {
            format_version: 1,
            created_at: self.hlc.generate(),
            exporting_node_id: self.node_id.clone(),
            documents,
            oplog_entries,
            snapshot_metadata,
            remote_peers: Vec::new(),
        }
    }

    pub fn write_snapshot<W: std::io::Write>(&self, writer: W) -> CoreResult<()> {
        self.export_snapshot().write_to(writer)
    }

    /// `MergeSnapshot` (spec §4.7): applies the snapshot's Oplog entries
    /// through the normal remote-apply path so documents are reconstructed
    /// by the conflict resolver rather than overwritten verbatim — the
    /// bootstrap case, where the sending peer is merely ahead.
    pub fn merge_snapshot(&self, snapshot: crate::snapshot::Snapshot) -> CoreResult<()> {
        self.record_snapshot_metadata(&snapshot.snapshot_metadata);
        self.apply_batch(snapshot.oplog_entries)
    }

    /// `ReplaceDatabase` (spec §4.7): clears all local state and imports
    /// the snapshot verbatim — for a peer so far behind (or so diverged)
    /// that resolver-based reconstruction isn't meaningful.
    pub fn replace_database(&self, snapshot: crate::snapshot::Snapshot) -> CoreResult<()> {
        let permit = self
            .remote_guard
            .clone()
            .try_acquire_owned()
            .map_err(|_| CoreError::Concurrency("remote-sync guard already held".into()))?;

        self.oplog.clear()?;
        self.documents.clear();
        self.vector_clock.invalidate();
        self.snapshot_metadata.clear();

        let persisted = self.oplog.merge(snapshot.oplog_entries)?;
        for document in snapshot.documents {
            self.documents.insert((document.collection.clone(), document.key.clone()), document);
        }
        self.record_snapshot_metadata(&snapshot.snapshot_metadata);
        self.reseed_vector_clock(&persisted);
        self.gap.advance_from_batch(&persisted);

        drop(permit);
        if !persisted.is_empty() {
            let _ = self.changes_applied.send(persisted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::MemoryOplogStore;
    use serde_json::json;

    fn new_store(node: &str, strategy: ResolverStrategy) -> DocumentStore {
        DocumentStore::new(
            node,
            Arc::new(HlcGenerator::new(node)),
            Arc::new(MemoryOplogStore::new()),
            Arc::new(VectorClockService::new()),
            strategy,
        )
    }

    #[test]
    fn local_write_appends_chained_entry_and_materializes_document() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        let doc = store.put_local("users", "u1", json!({"name": "Alice"})).unwrap();
        assert_eq!(doc.content, json!({"name": "Alice"}));
        assert_eq!(store.oplog.len(), 1);
    }

    #[test]
    fn list_collection_returns_only_that_collection() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        store.put_local("peers", "p1", json!({"address": "10.0.0.1"})).unwrap();
        store.put_local("peers", "p2", json!({"address": "10.0.0.2"})).unwrap();
        store.put_local("users", "u1", json!({"name": "Alice"})).unwrap();
        let peers = store.list_collection("peers");
        assert_eq!(peers.len(), 2);
    }

    #[test]
    fn apply_batch_suppresses_cdc_reentrancy() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        let remote_entry = OplogEntry::new(
            "users",
            "u1",
            Op::Put,
            Some(json!({"name": "Bob"})),
            HlcTimestamp::new(100, 0, "b"),
            "",
        );
        store.apply_batch(vec![remote_entry]).unwrap();
        // Applying remotely must not have appended anything to this
        // node's own chain.
        assert_eq!(store.oplog.last_hash_for_node("a"), None);
        assert_eq!(store.get("users", "u1").unwrap().content, json!({"name": "Bob"}));
    }

    #[test]
    fn apply_batch_is_idempotent() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        let remote_entry = OplogEntry::new(
            "users",
            "u1",
            Op::Put,
            Some(json!({"name": "Bob"})),
            HlcTimestamp::new(100, 0, "b"),
            "",
        );
        store.apply_batch(vec![remote_entry.clone()]).unwrap();
        store.apply_batch(vec![remote_entry]).unwrap();
        assert_eq!(store.oplog.len(), 1);
    }

    #[test]
    fn apply_batch_delete_wins_over_puts_in_same_group() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        let put_entry = OplogEntry::new(
            "users",
            "u1",
            Op::Put,
            Some(json!({"name": "Bob"})),
            HlcTimestamp::new(100, 0, "b"),
            "",
        );
        let delete_entry =
            OplogEntry::new("users", "u1", Op::Delete, None, HlcTimestamp::new(200, 0, "b"), "");
        store.apply_batch(vec![put_entry, delete_entry]).unwrap();
        assert!(store.get("users", "u1").is_none());
    }

    #[test]
    fn apply_batch_rejects_tampered_entry_from_the_durable_oplog() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        let mut tampered =
            OplogEntry::new("users", "u1", Op::Put, Some(json!({"name": "Bob"})), HlcTimestamp::new(100, 0, "b"), "");
        tampered.hash = "not-the-real-hash".into();
        store.apply_batch(vec![tampered]).unwrap();
        assert!(store.get("users", "u1").is_none());
        assert_eq!(store.oplog.len(), 0, "a hash-invalid entry must never reach the durable oplog");
    }

    #[test]
    fn last_hash_for_node_falls_back_to_snapshot_metadata_after_prune() {
        let store = new_store("a", ResolverStrategy::RecursiveMerge);
        store.put_local("users", "u1", json!({"name": "Alice"})).unwrap();
        let own_hash = store.oplog.last_hash_for_node("a").unwrap();

        store.export_snapshot(); // persists SnapshotMetadata covering this entry
        store.oplog.prune(&HlcTimestamp::new(i64::MAX, 0, "\u{10FFFF}")).unwrap();
        store.vector_clock.invalidate();

        assert_eq!(store.oplog.last_hash_for_node("a"), None);
        assert_eq!(store.last_hash_for_node("a"), Some(own_hash));
    }

    #[test]
    fn replace_database_imports_snapshot_verbatim() {
        let source = new_store("a", ResolverStrategy::RecursiveMerge);
        source.put_local("users", "u1", json!({"name": "Alice"})).unwrap();
        let snapshot = source.export_snapshot();

        let target = new_store("b", ResolverStrategy::RecursiveMerge);
        target.put_local("users", "stale", json!({"name": "ShouldBeGone"})).unwrap();
        target.replace_database(snapshot).unwrap();

        assert!(target.get("users", "stale").is_none());
        assert_eq!(target.get("users", "u1").unwrap().content, json!({"name": "Alice"}));
        assert_eq!(target.oplog.len(), 1);
    }

    #[test]
    fn merge_snapshot_reconstructs_through_the_resolver() {
        let source = new_store("a", ResolverStrategy::RecursiveMerge);
        source.put_local("users", "u1", json!({"name": "Alice"})).unwrap();
        let snapshot = source.export_snapshot();

        let target = new_store("b", ResolverStrategy::RecursiveMerge);
        target.merge_snapshot(snapshot).unwrap();

        assert_eq!(target.get("users", "u1").unwrap().content, json!({"name": "Alice"}));
        assert_eq!(target.last_hash_for_node("a"), source.last_hash_for_node("a"));
    }
}
