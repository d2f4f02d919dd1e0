//! Gap detection (spec §4.8): tracks, per originating node, the highest
//! contiguous physical time known to have been applied locally.

use dashmap::DashMap;

use crate::oplog::{OplogEntry, OplogStore};

pub struct GapTracker {
    highest_applied: DashMap<String, i64>,
}

impl Default for GapTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GapTracker {
    pub fn new() -> Self {
        Self { highest_applied: DashMap::new() }
    }

    /// Seeds from the persisted Oplog on first use: `max(timestamp.physical_time)`
    /// per node.
    pub fn seed_from_oplog(&self, oplog: &dyn OplogStore, node_ids: &[String]) {
        for node_id in node_ids {
            if let Some(ts) = oplog.last_timestamp_for_node(node_id) {
                self.advance(node_id, ts.physical_time);
            }
        }
    }

    /// Advances the watermark for each node present in a successfully
    /// applied batch.
    pub fn advance_from_batch(&self, entries: &[OplogEntry]) {
        for entry in entries {
            self.advance(&entry.timestamp.node_id, entry.timestamp.physical_time);
        }
    }

    fn advance(&self, node_id: &str, physical_time: i64) {
        self.highest_applied
            .entry(node_id.to_string())
            .and_modify(|existing| *existing = (*existing).max(physical_time))
            .or_insert(physical_time);
    }

    pub fn highest_applied(&self, node_id: &str) -> Option<i64> {
        self.highest_applied.get(node_id).map(|v| *v)
    }

    /// Decides whether a peer's claimed latest physical time is reachable
    /// incrementally or requires a snapshot restore. A peer is considered
    /// incrementally reachable when we already have some state from it and
    /// its claim isn't further ahead than our watermark implies a gap; this
    /// tracker only records the watermark, the decision threshold (e.g.
    /// "gap larger than the retained Oplog window") is the orchestrator's.
    pub fn has_gap(&self, node_id: &str, peer_claimed_physical_time: i64) -> bool {
        match self.highest_applied(node_id) {
            Some(watermark) => peer_claimed_physical_time > watermark,
            None => peer_claimed_physical_time > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hlc::HlcTimestamp;
    use crate::oplog::Op;
    use serde_json::json;

    #[test]
    fn advances_monotonically_per_node() {
        let tracker = GapTracker::new();
        tracker.advance("a", 100);
        tracker.advance("a", 50);
        assert_eq!(tracker.highest_applied("a"), Some(100));
    }

    #[test]
    fn advance_from_batch_tracks_multiple_nodes() {
        let tracker = GapTracker::new();
        let entries = vec![
            OplogEntry::new("c", "k1", Op::Put, Some(json!(1)), HlcTimestamp::new(10, 0, "a"), ""),
            OplogEntry::new("c", "k2", Op::Put, Some(json!(2)), HlcTimestamp::new(20, 0, "b"), ""),
        ];
        tracker.advance_from_batch(&entries);
        assert_eq!(tracker.highest_applied("a"), Some(10));
        assert_eq!(tracker.highest_applied("b"), Some(20));
    }

    #[test]
    fn detects_a_gap_when_peer_claims_ahead_of_watermark() {
        let tracker = GapTracker::new();
        tracker.advance("a", 100);
        assert!(tracker.has_gap("a", 200));
        assert!(!tracker.has_gap("a", 100));
    }
}
