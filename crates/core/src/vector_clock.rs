//! Vector Clock service (spec §4.4): a thread-safe map from NodeId to the
//! latest HLC/hash known from that node, with monotonic updates.

use dashmap::DashMap;

use crate::hlc::HlcTimestamp;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Causality {
    Equal,
    StrictlyAhead,
    StrictlyBehind,
    Concurrent,
}

#[derive(Debug, Clone)]
struct Entry {
    timestamp: HlcTimestamp,
    hash: String,
}

/// Backed by a `DashMap` (teacher's `discovery::udp_multicast` uses
/// `DashMap` for its concurrent device table; spec §5 calls for "reader/
/// writer or single mutex; all mutations monotonic").
pub struct VectorClockService {
    entries: DashMap<String, Entry>,
}

impl Default for VectorClockService {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorClockService {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// `Update(entry)` / `UpdateNode(nodeId, ts, hash)`: replaces the
    /// stored timestamp only if strictly greater in the total order.
    pub fn update_node(&self, node_id: &str, timestamp: HlcTimestamp, hash: impl Into<String>) {
        let hash = hash.into();
        self.entries
            .entry(node_id.to_string())
            .and_modify(|existing| {
                if timestamp > existing.timestamp {
                    existing.timestamp = timestamp.clone();
                    existing.hash = hash.clone();
                }
            })
            .or_insert_with(|| Entry { timestamp, hash });
    }

    /// `GetVectorClock()`.
    pub fn snapshot(&self) -> Vec<(String, HlcTimestamp)> {
        self.entries.iter().map(|e| (e.key().clone(), e.value().timestamp.clone())).collect()
    }

    /// `GetLatestTimestamp()`: max over entries, or the zero timestamp if
    /// empty.
    pub fn latest_timestamp(&self) -> HlcTimestamp {
        self.entries
            .iter()
            .map(|e| e.value().timestamp.clone())
            .max()
            .unwrap_or_else(HlcTimestamp::zero)
    }

    /// `GetLastHash(nodeId)`.
    pub fn last_hash(&self, node_id: &str) -> Option<String> {
        self.entries.get(node_id).map(|e| e.hash.clone())
    }

    pub fn last_timestamp(&self, node_id: &str) -> Option<HlcTimestamp> {
        self.entries.get(node_id).map(|e| e.timestamp.clone())
    }

    /// `Invalidate()`: clears the cache; the next query re-seeds from the
    /// Oplog store / SnapshotMetadata (spec §4.4, §4.13 on persistence
    /// failure).
    pub fn invalidate(&self) {
        self.entries.clear();
    }

    /// Pointwise comparison across the union of keys (spec §3).
    pub fn compare(&self, other: &VectorClockService) -> Causality {
        let mut ahead = false;
        let mut behind = false;

        let mut node_ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        for key in other.entries.iter() {
            if !node_ids.contains(key.key()) {
                node_ids.push(key.key().clone());
            }
        }

        for node_id in node_ids {
            let ours = self.last_timestamp(&node_id);
            let theirs = other.last_timestamp(&node_id);
            match (ours, theirs) {
                (Some(a), Some(b)) if a > b => ahead = true,
                (Some(a), Some(b)) if a < b => behind = true,
                (Some(_), None) => ahead = true,
                (None, Some(_)) => behind = true,
                _ => {}
            }
        }

        match (ahead, behind) {
            (false, false) => Causality::Equal,
            (true, false) => Causality::StrictlyAhead,
            (false, true) => Causality::StrictlyBehind,
            (true, true) => Causality::Concurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_are_monotonic() {
        let vc = VectorClockService::new();
        vc.update_node("a", HlcTimestamp::new(100, 0, "a"), "h1");
        vc.update_node("a", HlcTimestamp::new(50, 0, "a"), "h0");
        assert_eq!(vc.last_timestamp("a").unwrap(), HlcTimestamp::new(100, 0, "a"));
        assert_eq!(vc.last_hash("a").unwrap(), "h1");
    }

    #[test]
    fn latest_timestamp_is_zero_when_empty() {
        let vc = VectorClockService::new();
        assert_eq!(vc.latest_timestamp(), HlcTimestamp::zero());
    }

    #[test]
    fn repeated_updates_to_the_same_node_do_not_deadlock() {
        let vc = VectorClockService::new();
        vc.update_node("a", HlcTimestamp::new(1, 0, "a"), "h0");
        vc.update_node("a", HlcTimestamp::new(2, 0, "a"), "h1");
        vc.update_node("a", HlcTimestamp::new(1, 0, "a"), "stale");
        assert_eq!(vc.last_timestamp("a").unwrap(), HlcTimestamp::new(2, 0, "a"));
        assert_eq!(vc.last_hash("a").unwrap(), "h1");
    }

    #[test]
    fn invalidate_clears_all_entries() {
        let vc = VectorClockService::new();
        vc.update_node("a", HlcTimestamp::new(100, 0, "a"), "h1");
        vc.invalidate();
        assert!(vc.last_hash("a").is_none());
    }

    #[test]
    fn compare_detects_concurrent_clocks() {
        let a = VectorClockService::new();
        a.update_node("a", HlcTimestamp::new(200, 0, "a"), "ha");
        a.update_node("b", HlcTimestamp::new(50, 0, "b"), "hb0");

        let b = VectorClockService::new();
        b.update_node("a", HlcTimestamp::new(100, 0, "a"), "ha0");
        b.update_node("b", HlcTimestamp::new(150, 0, "b"), "hb1");

        assert_eq!(a.compare(&b), Causality::Concurrent);
    }

    #[test]
    fn compare_detects_strictly_ahead() {
        let a = VectorClockService::new();
        a.update_node("a", HlcTimestamp::new(200, 0, "a"), "ha");
        let b = VectorClockService::new();
        b.update_node("a", HlcTimestamp::new(100, 0, "a"), "ha0");
        assert_eq!(a.compare(&b), Causality::StrictlyAhead);
        assert_eq!(b.compare(&a), Causality::StrictlyBehind);
    }
}
