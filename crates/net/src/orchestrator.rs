//! Sync orchestrator (spec §4.10): periodic gossip loop with fanout F,
//! per-peer handshake/compare-clocks/push-pull, and a TCP client pool
//! keyed by NodeId. Grounded on the teacher's `sync::sync_scheduler`
//! periodic-task-runner shape and `discovery::udp_multicast`'s
//! cancellation-token listener pattern.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use replidb_core::{CoreError, DocumentStore, HlcTimestamp, OplogEntry, RetryPolicy, Snapshot};

use crate::discovery::Discovery;
use crate::health::{flush_offline_queue, HealthSnapshot};
use crate::protocol::{Request, Response};
use crate::transport;

/// One persistent connection to a peer. Owns its own write mutex so only
/// one request is in flight at a time on this connection (spec §5).
pub struct SyncClient {
    node_id: String,
    stream: AsyncMutex<TcpStream>,
}

impl SyncClient {
    pub async fn connect(node_id: impl Into<String>, addr: SocketAddr, credential: &str) -> Result<Self, CoreError> {
        let mut stream = TcpStream::connect(addr).await.map_err(|e| CoreError::Network(format!("connect {addr}: {e}")))?;
        let self_node_id = node_id.into();
        let handshake = Request::Handshake { node_id: self_node_id.clone(), credential: credential.to_string() };
        transport::write_plain_frame(&mut stream, &serde_json::to_vec(&handshake).unwrap()).await?;
        let reply: Response = serde_json::from_slice(&transport::read_plain_frame(&mut stream).await?)
            .map_err(|e| CoreError::Network(format!("bad handshake reply: {e}")))?;
        match reply {
            Response::HandshakeAccepted => Ok(Self { node_id: self_node_id, stream: AsyncMutex::new(stream) }),
            Response::HandshakeRejected { reason } => Err(CoreError::Auth(reason)),
            _ => Err(CoreError::Network("unexpected handshake reply".into())),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    async fn request(&self, request: &Request) -> Result<Response, CoreError> {
        let mut stream = self.stream.lock().await;
        transport::write_plain_frame(&mut *stream, &serde_json::to_vec(request).unwrap()).await?;
        let bytes = transport::read_plain_frame(&mut *stream).await?;
        serde_json::from_slice(&bytes).map_err(|e| CoreError::Network(format!("bad response frame: {e}")))
    }

    pub async fn get_clock(&self) -> Result<HlcTimestamp, CoreError> {
        match self.request(&Request::GetClock).await? {
            Response::Clock { timestamp } => Ok(timestamp),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected GetClock reply".into())),
        }
    }

    pub async fn get_vector_clock(&self) -> Result<HashMap<String, HlcTimestamp>, CoreError> {
        match self.request(&Request::GetVectorClock).await? {
            Response::VectorClock { entries } => Ok(entries),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected GetVectorClock reply".into())),
        }
    }

    pub async fn pull_changes(&self, since: HlcTimestamp) -> Result<Vec<OplogEntry>, CoreError> {
        match self.request(&Request::PullChanges { since }).await? {
            Response::Entries { entries } => Ok(entries),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected PullChanges reply".into())),
        }
    }

    pub async fn pull_for_node(&self, node_id: &str, since: HlcTimestamp) -> Result<Vec<OplogEntry>, CoreError> {
        match self.request(&Request::PullForNode { node_id: node_id.to_string(), since }).await? {
            Response::Entries { entries } => Ok(entries),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected PullForNode reply".into())),
        }
    }

    pub async fn push_changes(&self, entries: Vec<OplogEntry>) -> Result<(usize, usize), CoreError> {
        match self.request(&Request::PushChanges { entries }).await? {
            Response::PushAck { accepted, rejected } => Ok((accepted, rejected)),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected PushChanges reply".into())),
        }
    }

    pub async fn request_snapshot(&self) -> Result<Snapshot, CoreError> {
        match self.request(&Request::SnapshotRequest).await? {
            Response::SnapshotBytes { bytes } => Snapshot::read_from(bytes.as_slice()),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected SnapshotRequest reply".into())),
        }
    }

    pub async fn offer_snapshot(&self, snapshot: &Snapshot, replace: bool) -> Result<(), CoreError> {
        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes)?;
        match self.request(&Request::SnapshotOffer { bytes, replace }).await? {
            Response::SnapshotAccepted => Ok(()),
            Response::Error { message } => Err(CoreError::Network(message)),
            _ => Err(CoreError::Network("unexpected SnapshotOffer reply".into())),
        }
    }
}

pub struct SyncOrchestrator {
    store: Arc<DocumentStore>,
    discovery: Arc<Discovery>,
    credential: String,
    fanout: usize,
    gossip_interval: Duration,
    retry_policy: RetryPolicy,
    pool: AsyncMutex<HashMap<String, Arc<SyncClient>>>,
    health: Arc<HealthSnapshot>,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<DocumentStore>, discovery: Arc<Discovery>, credential: impl Into<String>, fanout: usize) -> Self {
        Self {
            store,
            discovery,
            credential: credential.into(),
            fanout,
            gossip_interval: Duration::from_secs(2),
            retry_policy: RetryPolicy::default(),
            pool: AsyncMutex::new(HashMap::new()),
            health: Arc::new(HealthSnapshot::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn health(&self) -> Arc<HealthSnapshot> {
        self.health.clone()
    }

    /// Feeds every locally-applied change (local write or remote merge)
    /// into the offline queue (spec §7: writes made while disconnected are
    /// gated here and flushed to the next peer we successfully reach).
    /// Harmless to run even while connected — the queue just empties again
    /// on the next successful `sync_with_peer`.
    pub async fn feed_offline_queue(self: Arc<Self>, cancel: CancellationToken) {
        let mut changes = self.store.subscribe_changes();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                received = changes.recv() => {
                    match received {
                        Ok(entries) => {
                            for entry in entries {
                                self.health.offline_queue().enqueue(entry);
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        }
    }

    /// Drives the periodic gossip loop until `cancel` fires (spec §4.10,
    /// §5: a single cancellation source shuts everything down).
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.gossip_interval) => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Picks up to `fanout` random peers and syncs with each concurrently
    /// (spec §4.10 step 3: "For each, concurrently").
    async fn run_cycle(self: &Arc<Self>) {
        let mut candidates = self.discovery.active_peers().await;
        candidates.shuffle(&mut StdRng::from_entropy());
        candidates.truncate(self.fanout);

        let mut tasks = tokio::task::JoinSet::new();
        for peer in candidates {
            let this = self.clone();
            tasks.spawn(async move { this.sync_with_peer(peer.node_id, peer.address).await });
        }
        while tasks.join_next().await.is_some() {}
    }

    async fn sync_with_peer(&self, node_id: String, addr: SocketAddr) {
        let client = match self.client_for(&node_id, addr).await {
            Ok(client) => client,
            Err(e) => {
                log::warn!("sync with {node_id} failed to connect: {e}");
                self.health.record_failure(&node_id);
                return;
            }
        };

        match self.exchange(&client).await {
            Ok(()) => {
                self.health.record_success(&node_id);
                let client_for_flush = client.clone();
                flush_offline_queue(self.health.offline_queue(), |entries| {
                    let client_for_flush = client_for_flush.clone();
                    async move { client_for_flush.push_changes(entries).await.map(|_| ()) }
                })
                .await;
            }
            Err(e) => {
                log::warn!("sync with {node_id} failed: {e}");
                self.health.record_failure(&node_id);
                self.pool.lock().await.remove(&node_id);
            }
        }
    }

    async fn client_for(&self, node_id: &str, addr: SocketAddr) -> Result<Arc<SyncClient>, CoreError> {
        let mut pool = self.pool.lock().await;
        if let Some(client) = pool.get(node_id) {
            return Ok(client.clone());
        }
        let credential = self.credential.clone();
        let node_id_owned = node_id.to_string();
        let client = self
            .retry_policy
            .run(|| {
                let node_id_owned = node_id_owned.clone();
                let credential = credential.clone();
                async move { SyncClient::connect(node_id_owned, addr, &credential).await }
            })
            .await?;
        let client = Arc::new(client);
        pool.insert(node_id.to_string(), client.clone());
        Ok(client)
    }

    /// Per-peer sync (spec §4.10): compare clocks, then pull or push.
    async fn exchange(&self, client: &SyncClient) -> Result<(), CoreError> {
        let peer_clock = client.get_clock().await?;
        let local_clock = self.store.vector_clock().latest_timestamp();

        if peer_clock > local_clock {
            let entries = client.pull_changes(local_clock).await?;
            if !entries.is_empty() {
                self.store.apply_batch(entries)?;
            }
        } else if local_clock > peer_clock {
            let entries = self.store.oplog().oplog_after(&peer_clock, None);
            if !entries.is_empty() {
                client.push_changes(entries).await?;
            }
        }

        // Richer convergence for concurrent vector clocks (spec §4.10):
        // per-originating-node pulls for nodes where the peer is ahead.
        let peer_vector_clock = client.get_vector_clock().await?;
        for (node_id, peer_ts) in peer_vector_clock {
            let local_ts = self.store.vector_clock().last_timestamp(&node_id);
            let is_behind = match &local_ts {
                Some(local_ts) => &peer_ts > local_ts,
                None => true,
            };
            if !is_behind {
                continue;
            }

            if local_ts.is_none() && self.store.gap().has_gap(&node_id, peer_ts.physical_time) {
                // We hold zero local history for this node at all, so an
                // incremental PullForNode(since=0) would trust the peer's
                // oldest retained entry as if it were the chain's genesis —
                // wrong if the peer itself already pruned earlier history.
                // Bootstrap this node's history via a full snapshot merge
                // instead (spec §4.7 MergeSnapshot).
                let snapshot = client.request_snapshot().await?;
                self.store.merge_snapshot(snapshot)?;
                continue;
            }

            let since = local_ts.unwrap_or_else(|| HlcTimestamp::new(0, 0, &node_id));
            let entries = client.pull_for_node(&node_id, since).await?;
            if !entries.is_empty() {
                self.store.apply_batch(entries)?;
            }
        }
        Ok(())
    }
}
