//! Periodic maintenance (spec §5: "periodic maintenance tasks (prune,
//! snapshot, vector-clock reseed)"). Grounded on the teacher's
//! `sync::sync_scheduler` periodic-job shape, generalized from table sync
//! jobs to a fixed three-step maintenance cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use replidb_core::{DocumentStore, HlcTimestamp};

pub struct MaintenanceTask {
    store: Arc<DocumentStore>,
    interval: Duration,
    retention: chrono::Duration,
}

impl MaintenanceTask {
    pub fn new(store: Arc<DocumentStore>, interval: Duration, retention_seconds: i64) -> Self {
        Self { store, interval, retention: chrono::Duration::seconds(retention_seconds) }
    }

    /// Runs until `cancel` fires. Each cycle: snapshot to establish a
    /// prune-safety watermark, prune entries older than the retention
    /// window, and invalidate+reseed the Vector Clock cache so it can't
    /// silently diverge from what remains on disk.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.interval) => {
                    self.run_cycle();
                }
            }
        }
    }

    fn run_cycle(&self) {
        // physical_time dominates the HLC ordering (spec §3), so a max
        // logical_counter/node_id only matters for same-millisecond ties.
        let cutoff_physical_time = chrono::Utc::now().timestamp_millis() - self.retention.num_milliseconds();
        let cutoff = HlcTimestamp::new(cutoff_physical_time, u32::MAX, "\u{10FFFF}");

        // `export_snapshot` persists a SnapshotMetadata record per node
        // covering everything currently in the Oplog (spec §4.6 caller
        // contract: "must have persisted a SnapshotMetadata covering the
        // pruned region first"). Without this, GetLastHash for a node whose
        // entire retained tail falls inside the cutoff would silently
        // return None/empty instead of the real last hash.
        self.store.export_snapshot();

        match self.store.oplog().prune(&cutoff) {
            Ok(pruned) if pruned > 0 => log::info!("maintenance: pruned {pruned} oplog entries older than retention window"),
            Ok(_) => {}
            Err(e) => log::warn!("maintenance: prune failed: {e}"),
        }

        self.store.vector_clock().invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replidb_core::{HlcGenerator, MemoryOplogStore, ResolverStrategy, VectorClockService};
    use std::time::Duration as StdDuration;

    #[test]
    fn cycle_prunes_entries_older_than_retention() {
        let store = Arc::new(DocumentStore::new(
            "a",
            Arc::new(HlcGenerator::new("a")),
            Arc::new(MemoryOplogStore::new()),
            Arc::new(VectorClockService::new()),
            ResolverStrategy::RecursiveMerge,
        ));
        store.put_local("docs", "old", serde_json::json!({"v": 1})).unwrap();
        assert_eq!(store.oplog().len(), 1);

        let task = MaintenanceTask::new(store.clone(), StdDuration::from_secs(60), -3600);
        task.run_cycle();

        assert_eq!(store.oplog().len(), 0, "entry predating a negative retention window should be pruned");
    }

    #[test]
    fn run_cycle_preserves_last_hash_via_snapshot_metadata() {
        let store = Arc::new(DocumentStore::new(
            "a",
            Arc::new(HlcGenerator::new("a")),
            Arc::new(MemoryOplogStore::new()),
            Arc::new(VectorClockService::new()),
            ResolverStrategy::RecursiveMerge,
        ));
        store.put_local("docs", "old", serde_json::json!({"v": 1})).unwrap();
        let hash_before_prune = store.oplog().last_hash_for_node("a").unwrap();

        let task = MaintenanceTask::new(store.clone(), StdDuration::from_secs(60), -3600);
        task.run_cycle();

        assert_eq!(store.oplog().last_hash_for_node("a"), None);
        assert_eq!(
            store.last_hash_for_node("a"),
            Some(hash_before_prune),
            "GetLastHash must still resolve via SnapshotMetadata once the Oplog tail is pruned"
        );
    }
}
