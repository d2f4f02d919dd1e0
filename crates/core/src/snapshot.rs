//! Snapshot store (spec §4.7): full-state export/import used for bootstrap
//! and catastrophic recovery, plus the prune-safety fallback record.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::hlc::HlcTimestamp;
use crate::oplog::OplogEntry;
use crate::store::Document;

const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Per-originating-node record marking the last Oplog entry included in
/// the most recent snapshot (spec §3). Required so `GetLastHash` keeps
/// working after the corresponding region of the Oplog has been pruned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotMetadata {
    pub node_id: String,
    pub timestamp: HlcTimestamp,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum RemotePeerType {
    LanDiscovered,
    StaticRemote,
    CloudRemote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemotePeerConfiguration {
    pub node_id: String,
    pub address: String,
    pub peer_type: RemotePeerType,
    pub oauth2_issuer: Option<String>,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub created_at: HlcTimestamp,
    pub exporting_node_id: String,
    pub documents: Vec<Document>,
    pub oplog_entries: Vec<OplogEntry>,
    pub snapshot_metadata: Vec<SnapshotMetadata>,
    pub remote_peers: Vec<RemotePeerConfiguration>,
}

impl Snapshot {
    /// Encoded as newline-delimited JSON rather than bincode: the payload
    /// tree embeds `serde_json::Value`, whose untyped `deserialize_any`
    /// bincode's data model can't express. JSON is still a versioned,
    /// self-describing format either way (spec §4.7).
    pub fn write_to<W: Write>(&self, writer: W) -> CoreResult<()> {
        serde_json::to_writer(writer, self)
            .map_err(|e| CoreError::Persistence(format!("snapshot encode failed: {e}")))
    }

    pub fn read_from<R: Read>(reader: R) -> CoreResult<Self> {
        let snapshot: Snapshot = serde_json::from_reader(reader)
            .map_err(|e| CoreError::Persistence(format!("snapshot decode failed: {e}")))?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CoreError::Persistence(format!(
                "unsupported snapshot format version {}",
                snapshot.format_version
            )));
        }
        Ok(snapshot)
    }

    /// Computes, for every NodeId present in the supplied Oplog entries,
    /// the `SnapshotMetadata` marking the highest-included
    /// timestamp/hash (spec §4.7).
    pub fn metadata_for(entries: &[OplogEntry]) -> Vec<SnapshotMetadata> {
        let mut by_node: std::collections::HashMap<String, &OplogEntry> = std::collections::HashMap::new();
        for entry in entries {
            by_node
                .entry(entry.timestamp.node_id.clone())
                .and_modify(|existing| {
                    if entry.timestamp > existing.timestamp {
                        *existing = entry;
                    }
                })
                .or_insert(entry);
        }
        by_node
            .into_values()
            .map(|entry| SnapshotMetadata {
                node_id: entry.timestamp.node_id.clone(),
                timestamp: entry.timestamp.clone(),
                hash: entry.hash.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::Op;
    use serde_json::json;

    fn entry(node: &str, phys: i64) -> OplogEntry {
        OplogEntry::new("users", "u1", Op::Put, Some(json!({"v": phys})), HlcTimestamp::new(phys, 0, node), "")
    }

    #[test]
    fn round_trips_through_bytes() {
        let snapshot = Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            created_at: HlcTimestamp::new(1, 0, "a"),
            exporting_node_id: "a".into(),
            documents: vec![],
            oplog_entries: vec![entry("a", 10)],
            snapshot_metadata: vec![],
            remote_peers: vec![],
        };
        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes).unwrap();
        let restored = Snapshot::read_from(bytes.as_slice()).unwrap();
        assert_eq!(restored.oplog_entries.len(), 1);
        assert_eq!(restored.exporting_node_id, "a");
    }

    #[test]
    fn metadata_for_picks_highest_timestamp_per_node() {
        let entries = vec![entry("a", 10), entry("a", 30), entry("b", 20)];
        let metadata = Snapshot::metadata_for(&entries);
        assert_eq!(metadata.len(), 2);
        let a_meta = metadata.iter().find(|m| m.node_id == "a").unwrap();
        assert_eq!(a_meta.timestamp, HlcTimestamp::new(30, 0, "a"));
    }
}
