//! Hybrid Logical Clock generator (spec §4.1).
//!
//! Grounded on `sync::hlc::HLC`/`HLC::generate` for the local-tick algorithm
//! and on the `HLC::update` receive-side rule from the spacedrive oplog
//! example, which the teacher's own `hlc.rs` does not implement.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// `(physicalTime, logicalCounter, nodeId)` triple, totally ordered by
/// physical time, then logical counter, then an ordinal string compare of
/// `node_id` (spec §3).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HlcTimestamp {
    pub physical_time: i64,
    pub logical_counter: u32,
    pub node_id: String,
}

impl HlcTimestamp {
    pub fn new(physical_time: i64, logical_counter: u32, node_id: impl Into<String>) -> Self {
        Self { physical_time, logical_counter, node_id: node_id.into() }
    }

    /// The zero value used by `GetLatestTimestamp()` when the Vector Clock
    /// cache is empty (spec §4.4).
    pub fn zero() -> Self {
        Self { physical_time: 0, logical_counter: 0, node_id: String::new() }
    }
}

impl Ord for HlcTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.physical_time
            .cmp(&other.physical_time)
            .then_with(|| self.logical_counter.cmp(&other.logical_counter))
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for HlcTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:08x}-{}", self.physical_time, self.logical_counter, self.node_id)
    }
}

impl FromStr for HlcTimestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let physical_time = parts
            .next()
            .ok_or_else(|| CoreError::Configuration("missing hlc physical time".into()))?
            .parse()
            .map_err(|e| CoreError::Configuration(format!("invalid hlc physical time: {e}")))?;
        let logical_counter = u32::from_str_radix(
            parts.next().ok_or_else(|| CoreError::Configuration("missing hlc counter".into()))?,
            16,
        )
        .map_err(|e| CoreError::Configuration(format!("invalid hlc counter: {e}")))?;
        let node_id = parts
            .next()
            .ok_or_else(|| CoreError::Configuration("missing hlc node id".into()))?
            .to_string();
        Ok(Self { physical_time, logical_counter, node_id })
    }
}

fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

struct State {
    last_physical_time: i64,
    logical_counter: u32,
}

/// Serializes local-tick and remote-advance under one mutex per spec §5
/// ("HLC state — mutex", "HLC generation is serialized per process").
pub struct HlcGenerator {
    node_id: String,
    state: Mutex<State>,
}

impl HlcGenerator {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            state: Mutex::new(State { last_physical_time: 0, logical_counter: 0 }),
        }
    }

    /// Local tick (spec §4.1 `GenerateTimestamp`).
    pub fn generate(&self) -> HlcTimestamp {
        let now = wall_clock_millis();
        let mut state = self.state.lock().expect("hlc mutex poisoned");
        if now > state.last_physical_time {
            state.last_physical_time = now;
            state.logical_counter = 0;
        } else {
            state.logical_counter += 1;
        }
        HlcTimestamp::new(state.last_physical_time, state.logical_counter, self.node_id.clone())
    }

    /// Advance on receipt of a remote timestamp (spec §4.1 receive rule).
    pub fn receive(&self, remote: &HlcTimestamp) -> HlcTimestamp {
        let now = wall_clock_millis();
        let mut state = self.state.lock().expect("hlc mutex poisoned");
        let new_physical = state.last_physical_time.max(now).max(remote.physical_time);
        if new_physical == remote.physical_time && new_physical == state.last_physical_time {
            state.logical_counter = state.logical_counter.max(remote.logical_counter) + 1;
        } else if new_physical == remote.physical_time {
            state.logical_counter = remote.logical_counter + 1;
        } else if new_physical == state.last_physical_time {
            state.logical_counter += 1;
        } else {
            state.logical_counter = 0;
        }
        state.last_physical_time = new_physical;
        HlcTimestamp::new(state.last_physical_time, state.logical_counter, self.node_id.clone())
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_totally_ordered() {
        let a = HlcTimestamp::new(100, 0, "a");
        let b = HlcTimestamp::new(100, 1, "a");
        let c = HlcTimestamp::new(200, 0, "a");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn display_round_trips() {
        let ts = HlcTimestamp::new(1234, 5, "node-a");
        let rendered = ts.to_string();
        let parsed: HlcTimestamp = rendered.parse().unwrap();
        assert_eq!(ts, parsed);
    }

    #[test]
    fn generator_is_strictly_increasing() {
        let gen = HlcGenerator::new("a");
        let mut last = gen.generate();
        for _ in 0..50 {
            let next = gen.generate();
            assert!(next > last, "{next:?} should be greater than {last:?}");
            last = next;
        }
    }

    #[test]
    fn receive_advances_past_remote() {
        let gen = HlcGenerator::new("a");
        let remote = HlcTimestamp::new(i64::MAX / 2, 7, "b");
        let advanced = gen.receive(&remote);
        assert!(advanced > remote);
        let next_local = gen.generate();
        assert!(next_local > advanced);
    }

    #[test]
    fn receive_is_monotonic_under_repeated_same_remote() {
        let gen = HlcGenerator::new("a");
        let remote = HlcTimestamp::new(5_000_000_000_000, 3, "b");
        let first = gen.receive(&remote);
        let second = gen.receive(&remote);
        assert!(second > first);
    }
}
