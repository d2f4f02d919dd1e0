//! Health surface (spec §7: "failures are observable through the health
//! endpoint"). Grounded on the teacher's `sync::sync_scheduler` job
//! success/failure accounting, generalized to per-peer state plus an
//! offline queue depth gauge.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use replidb_core::{CoreError, OplogEntry};

#[derive(Debug, Clone, Default)]
pub struct PeerHealth {
    pub reachable: bool,
    pub last_success: Option<Instant>,
    pub consecutive_failures: u32,
}

pub struct HealthSnapshot {
    peers: DashMap<String, PeerHealth>,
    offline_queue: OfflineQueue,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthSnapshot {
    pub fn new() -> Self {
        Self { peers: DashMap::new(), offline_queue: OfflineQueue::new(256) }
    }

    pub fn record_success(&self, node_id: &str) {
        let mut entry = self.peers.entry(node_id.to_string()).or_default();
        entry.reachable = true;
        entry.last_success = Some(Instant::now());
        entry.consecutive_failures = 0;
    }

    pub fn record_failure(&self, node_id: &str) {
        let mut entry = self.peers.entry(node_id.to_string()).or_default();
        entry.reachable = false;
        entry.consecutive_failures += 1;
    }

    pub fn peer_health(&self, node_id: &str) -> Option<PeerHealth> {
        self.peers.get(node_id).map(|e| e.clone())
    }

    pub fn all_peers(&self) -> Vec<(String, PeerHealth)> {
        self.peers.iter().map(|e| (e.key().clone(), e.value().clone())).collect()
    }

    pub fn offline_queue(&self) -> &OfflineQueue {
        &self.offline_queue
    }

    pub fn last_success_age(&self, node_id: &str) -> Option<Duration> {
        self.peer_health(node_id).and_then(|h| h.last_success).map(|t| t.elapsed())
    }
}

/// Bounded FIFO for local writes made while disconnected (spec §7):
/// oldest dropped with a warning on overflow, replayed on reconnect.
pub struct OfflineQueue {
    capacity: usize,
    entries: std::sync::Mutex<std::collections::VecDeque<OplogEntry>>,
}

impl OfflineQueue {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: std::sync::Mutex::new(std::collections::VecDeque::new()) }
    }

    pub fn enqueue(&self, entry: OplogEntry) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            if let Some(dropped) = entries.pop_front() {
                log::warn!("offline queue overflow: dropping entry {} for {}", dropped.hash, dropped.collection);
            }
        }
        entries.push_back(entry);
    }

    pub fn depth(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Drains and returns everything queued, for replay against a
    /// `DocumentStore::apply_batch`/orchestrator push once connectivity
    /// returns.
    pub fn drain(&self) -> Vec<OplogEntry> {
        self.entries.lock().unwrap().drain(..).collect()
    }
}

/// Runs `flush` once against every queued entry, re-enqueuing anything
/// that fails with a transient error so the next reconnect retries it.
pub async fn flush_offline_queue<F, Fut>(queue: &OfflineQueue, flush: F)
where
    F: Fn(Vec<OplogEntry>) -> Fut,
    Fut: std::future::Future<Output = Result<(), CoreError>>,
{
    let pending = queue.drain();
    if pending.is_empty() {
        return;
    }
    if let Err(e) = flush(pending.clone()).await {
        if e.is_transient() {
            for entry in pending {
                queue.enqueue(entry);
            }
        } else {
            log::warn!("offline queue flush failed permanently: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replidb_core::{HlcTimestamp, Op};
    use serde_json::json;

    fn entry(phys: i64) -> OplogEntry {
        OplogEntry::new("docs", "k", Op::Put, Some(json!({"v": phys})), HlcTimestamp::new(phys, 0, "a"), "")
    }

    #[test]
    fn overflow_drops_oldest_entry() {
        let queue = OfflineQueue::new(2);
        queue.enqueue(entry(1));
        queue.enqueue(entry(2));
        queue.enqueue(entry(3));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].timestamp.physical_time, 2);
        assert_eq!(drained[1].timestamp.physical_time, 3);
    }

    #[test]
    fn record_success_resets_failure_count() {
        let health = HealthSnapshot::new();
        health.record_failure("b");
        health.record_failure("b");
        health.record_success("b");
        let peer = health.peer_health("b").unwrap();
        assert!(peer.reachable);
        assert_eq!(peer.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn flush_requeues_on_transient_failure() {
        let queue = OfflineQueue::new(8);
        queue.enqueue(entry(1));
        flush_offline_queue(&queue, |_entries| async { Err(CoreError::Network("down".into())) }).await;
        assert_eq!(queue.depth(), 1);
    }
}
