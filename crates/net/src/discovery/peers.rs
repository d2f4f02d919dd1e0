//! Persistent remote peers (spec §4.9, §3 `RemotePeerConfiguration`).
//!
//! Grounded on `discovery::persistent::PersistentDataManager`'s
//! load/refresh/broadcast-change shape, adapted from a TOML file (the
//! teacher's form) to the normal replicated Oplog (spec §9 open question:
//! "this spec treats them as replicated through the normal Oplog — the
//! stronger guarantee").

use std::sync::Arc;
use std::time::Duration;

use replidb_core::{Document, DocumentStore, RemotePeerConfiguration};

const COLLECTION: &str = "system.remote_peers";

pub struct PersistentPeerRegistry {
    store: Arc<DocumentStore>,
    refresh_interval: Duration,
}

impl PersistentPeerRegistry {
    pub fn new(store: Arc<DocumentStore>, refresh_interval: Duration) -> Self {
        Self { store, refresh_interval }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Upserts a peer configuration as a normal local write — it flows
    /// through CDC and the hash chain exactly like user data (spec
    /// invariant 5).
    pub fn upsert(&self, peer: &RemotePeerConfiguration) -> Result<(), replidb_core::CoreError> {
        let payload = serde_json::to_value(peer)
            .map_err(|e| replidb_core::CoreError::Configuration(format!("bad peer config: {e}")))?;
        self.store.put_local(COLLECTION, &peer.node_id, payload)?;
        Ok(())
    }

    pub fn remove(&self, node_id: &str) -> Result<(), replidb_core::CoreError> {
        self.store.delete_local(COLLECTION, node_id)?;
        Ok(())
    }

    /// The enabled subset, each surfaced with `lastSeen = now` (spec
    /// §4.9: "a refresher reads the enabled subset every N minutes and
    /// exposes them as active peers with lastSeen = now").
    pub fn enabled_peers(&self) -> Vec<RemotePeerConfiguration> {
        self.store
            .list_collection(COLLECTION)
            .iter()
            .filter_map(document_to_peer)
            .filter(|peer| peer.is_enabled)
            .collect()
    }
}

fn document_to_peer(doc: &Document) -> Option<RemotePeerConfiguration> {
    serde_json::from_value(doc.content.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use replidb_core::{HlcGenerator, MemoryOplogStore, RemotePeerType, ResolverStrategy, VectorClockService};

    fn new_store() -> Arc<DocumentStore> {
        Arc::new(DocumentStore::new(
            "a",
            Arc::new(HlcGenerator::new("a")),
            Arc::new(MemoryOplogStore::new()),
            Arc::new(VectorClockService::new()),
            ResolverStrategy::RecursiveMerge,
        ))
    }

    #[test]
    fn upsert_and_list_enabled_peers() {
        let registry = PersistentPeerRegistry::new(new_store(), Duration::from_secs(300));
        registry
            .upsert(&RemotePeerConfiguration {
                node_id: "b".into(),
                address: "10.0.0.2:9000".into(),
                peer_type: RemotePeerType::StaticRemote,
                oauth2_issuer: None,
                is_enabled: true,
            })
            .unwrap();
        registry
            .upsert(&RemotePeerConfiguration {
                node_id: "c".into(),
                address: "10.0.0.3:9000".into(),
                peer_type: RemotePeerType::StaticRemote,
                oauth2_issuer: None,
                is_enabled: false,
            })
            .unwrap();

        let enabled = registry.enabled_peers();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].node_id, "b");
    }

    #[test]
    fn removed_peer_disappears_from_enabled_list() {
        let registry = PersistentPeerRegistry::new(new_store(), Duration::from_secs(300));
        registry
            .upsert(&RemotePeerConfiguration {
                node_id: "b".into(),
                address: "10.0.0.2:9000".into(),
                peer_type: RemotePeerType::CloudRemote,
                oauth2_issuer: Some("https://issuer.example".into()),
                is_enabled: true,
            })
            .unwrap();
        registry.remove("b").unwrap();
        assert!(registry.enabled_peers().is_empty());
    }
}
