//! Discovery (spec §4.9): unifies the ephemeral UDP beacon and the
//! database-backed persistent remote peers behind one `active_peers()`
//! view.

pub mod beacon;
pub mod peers;

use std::net::SocketAddr;
use std::sync::Arc;

pub use beacon::{BeaconPayload, UdpBeacon};
pub use peers::PersistentPeerRegistry;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PeerOrigin {
    LanDiscovered,
    Persistent,
}

#[derive(Debug, Clone)]
pub struct ActivePeer {
    pub node_id: String,
    pub address: SocketAddr,
    pub origin: PeerOrigin,
}

pub struct Discovery {
    beacon: Arc<UdpBeacon>,
    peers: Arc<PersistentPeerRegistry>,
    self_node_id: String,
}

impl Discovery {
    pub fn new(beacon: Arc<UdpBeacon>, peers: Arc<PersistentPeerRegistry>, self_node_id: impl Into<String>) -> Self {
        Self { beacon, peers, self_node_id: self_node_id.into() }
    }

    /// `GetActivePeers()` (spec §4.9): LAN-discovered beacons plus the
    /// enabled persistent peer set, excluding self.
    pub async fn active_peers(&self) -> Vec<ActivePeer> {
        let mut out = Vec::new();
        for (node_id, address) in self.beacon.active_peers().await {
            if node_id != self.self_node_id {
                out.push(ActivePeer { node_id, address, origin: PeerOrigin::LanDiscovered });
            }
        }
        for peer in self.peers.enabled_peers() {
            if peer.node_id == self.self_node_id {
                continue;
            }
            if let Ok(address) = peer.address.parse::<SocketAddr>() {
                out.push(ActivePeer { node_id: peer.node_id, address, origin: PeerOrigin::Persistent });
            } else {
                log::warn!("skipping remote peer {} with unparseable address {}", peer.node_id, peer.address);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replidb_core::{HlcGenerator, MemoryOplogStore, RemotePeerConfiguration, RemotePeerType, ResolverStrategy, VectorClockService};
    use std::time::Duration;

    #[tokio::test]
    async fn active_peers_excludes_self_and_merges_both_sources() {
        let store = Arc::new(replidb_core::DocumentStore::new(
            "a",
            Arc::new(HlcGenerator::new("a")),
            Arc::new(MemoryOplogStore::new()),
            Arc::new(VectorClockService::new()),
            ResolverStrategy::RecursiveMerge,
        ));
        let registry = Arc::new(PersistentPeerRegistry::new(store, Duration::from_secs(300)));
        registry
            .upsert(&RemotePeerConfiguration {
                node_id: "c".into(),
                address: "10.0.0.3:9000".into(),
                peer_type: RemotePeerType::StaticRemote,
                oauth2_issuer: None,
                is_enabled: true,
            })
            .unwrap();

        let beacon = Arc::new(UdpBeacon::new("a", 9000, 0, Duration::from_secs(30)));
        let discovery = Discovery::new(beacon, registry, "a");
        let peers = discovery.active_peers().await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].node_id, "c");
    }
}
