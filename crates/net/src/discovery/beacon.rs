//! UDP beacon discovery (spec §4.9, §6). Grounded on
//! `discovery::udp_multicast::DiscoveryServiceImplementation` /
//! `discovery::protocol::DiscoveryService`: retry-guarded socket bring-up,
//! a per-socket listener task selecting on a cancellation token, and an
//! in-memory table of recently-seen peers. Simplified from the teacher's
//! per-interface multicast join to a single broadcast socket, since the
//! spec only requires "broadcast to a configurable port" (§6), not
//! multicast group membership.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use replidb_core::CoreError;

/// Beacon wire format: a JSON object with snake_case keys, per spec §4.9 /
/// §6: `{"node_id": string, "tcp_port": integer}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconPayload {
    pub node_id: String,
    pub tcp_port: u16,
}

#[derive(Debug, Clone)]
struct Sighting {
    address: SocketAddr,
    tcp_port: u16,
    last_seen: Instant,
}

pub struct UdpBeacon {
    node_id: String,
    tcp_port: u16,
    bind_port: u16,
    ttl: Duration,
    socket: AsyncMutex<Option<Arc<UdpSocket>>>,
    sightings: AsyncMutex<HashMap<String, Sighting>>,
    listener: AsyncMutex<Option<JoinHandle<()>>>,
    retry_policy: replidb_core::RetryPolicy,
}

impl UdpBeacon {
    pub fn new(node_id: impl Into<String>, tcp_port: u16, bind_port: u16, ttl: Duration) -> Self {
        Self {
            node_id: node_id.into(),
            tcp_port,
            bind_port,
            ttl,
            socket: AsyncMutex::new(None),
            sightings: AsyncMutex::new(HashMap::new()),
            listener: AsyncMutex::new(None),
            retry_policy: replidb_core::RetryPolicy::default(),
        }
    }

    async fn ensure_socket(&self) -> Result<Arc<UdpSocket>, CoreError> {
        let mut guard = self.socket.lock().await;
        if let Some(socket) = guard.as_ref() {
            return Ok(socket.clone());
        }
        let bind_port = self.bind_port;
        let socket = self
            .retry_policy
            .run(|| async move {
                let socket = UdpSocket::bind(("0.0.0.0", bind_port))
                    .await
                    .map_err(|e| CoreError::Network(format!("udp bind failed: {e}")))?;
                socket
                    .set_broadcast(true)
                    .map_err(|e| CoreError::Network(format!("set_broadcast: {e}")))?;
                Ok(Arc::new(socket))
            })
            .await?;
        *guard = Some(socket.clone());
        Ok(socket)
    }

    /// Sends one beacon datagram. Callers drive the fixed interval (spec
    /// §4.9: "at a fixed interval on a known port").
    pub async fn announce(&self) -> Result<(), CoreError> {
        let socket = self.ensure_socket().await?;
        let payload = BeaconPayload { node_id: self.node_id.clone(), tcp_port: self.tcp_port };
        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| CoreError::Network(format!("beacon encode failed: {e}")))?;
        socket
            .send_to(&bytes, ("255.255.255.255", self.bind_port))
            .await
            .map_err(|e| CoreError::Network(format!("beacon send failed: {e}")))?;
        Ok(())
    }

    /// Spawns the listener task. Received beacons whose `node_id` equals
    /// ours are ignored (spec §6).
    pub async fn listen(self: &Arc<Self>, cancel: CancellationToken) -> Result<(), CoreError> {
        let socket = self.ensure_socket().await?;
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = socket.recv_from(&mut buf) => {
                        match received {
                            Ok((len, from)) => this.handle_datagram(&buf[..len], from).await,
                            Err(e) => {
                                log::warn!("beacon recv error: {e}");
                                break;
                            }
                        }
                    }
                }
            }
        });
        *self.listener.lock().await = Some(handle);
        Ok(())
    }

    async fn handle_datagram(&self, bytes: &[u8], from: SocketAddr) {
        let Ok(payload) = serde_json::from_slice::<BeaconPayload>(bytes) else {
            return;
        };
        if payload.node_id == self.node_id {
            return;
        }
        let mut sightings = self.sightings.lock().await;
        sightings.insert(
            payload.node_id,
            Sighting { address: from, tcp_port: payload.tcp_port, last_seen: Instant::now() },
        );
    }

    /// Active peers discovered via the beacon within the TTL window (spec
    /// §4.9: "expired entries are removed").
    pub async fn active_peers(&self) -> Vec<(String, SocketAddr)> {
        let mut sightings = self.sightings.lock().await;
        let ttl = self.ttl;
        sightings.retain(|_, s| s.last_seen.elapsed() < ttl);
        sightings
            .iter()
            .map(|(node_id, s)| (node_id.clone(), SocketAddr::new(s.address.ip(), s.tcp_port)))
            .collect()
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ignores_self_announcements() {
        let beacon = Arc::new(UdpBeacon::new("a", 9000, 0, Duration::from_secs(30)));
        beacon
            .handle_datagram(
                &serde_json::to_vec(&BeaconPayload { node_id: "a".into(), tcp_port: 9000 }).unwrap(),
                "127.0.0.1:9000".parse().unwrap(),
            )
            .await;
        assert!(beacon.active_peers().await.is_empty());
    }

    #[tokio::test]
    async fn tracks_peer_announcements_and_expires_them() {
        let beacon = Arc::new(UdpBeacon::new("a", 9000, 0, Duration::from_millis(20)));
        beacon
            .handle_datagram(
                &serde_json::to_vec(&BeaconPayload { node_id: "b".into(), tcp_port: 9100 }).unwrap(),
                "127.0.0.1:5000".parse().unwrap(),
            )
            .await;
        let peers = beacon.active_peers().await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].0, "b");

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(beacon.active_peers().await.is_empty());
    }
}
