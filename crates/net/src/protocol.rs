//! TCP sync protocol wire messages (spec §6, §4.11). Grounded on
//! `discovery::protocol::DiscoveryService` message-tag shape, adapted from
//! beacon payloads to the full sync request/response set. Messages are
//! JSON-tagged (`{"type": ..., ...}`) rather than the reference's binary
//! frame layout — spec §6 explicitly allows "any canonical serialization
//! provided both sides agree".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use replidb_core::{HlcTimestamp, OplogEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Handshake { node_id: String, credential: String },
    KeyExchange { ephemeral_public_key: [u8; 32] },
    GetClock,
    GetVectorClock,
    PullChanges { since: HlcTimestamp },
    PullForNode { node_id: String, since: HlcTimestamp },
    PushChanges { entries: Vec<OplogEntry> },
    SnapshotRequest,
    /// Push-style counterpart to `SnapshotRequest` (spec §4.11): the sender
    /// hands the receiver its own full snapshot rather than asking for
    /// one, for the catastrophic-recovery/bootstrap case where incremental
    /// per-node pulls can't safely catch a peer up.
    SnapshotOffer { bytes: Vec<u8>, replace: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    HandshakeAccepted,
    HandshakeRejected { reason: String },
    KeyExchange { ephemeral_public_key: [u8; 32] },
    Clock { timestamp: HlcTimestamp },
    VectorClock { entries: HashMap<String, HlcTimestamp> },
    Entries { entries: Vec<OplogEntry> },
    PushAck { accepted: usize, rejected: usize },
    SnapshotBytes { bytes: Vec<u8> },
    SnapshotAccepted,
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_request_round_trips_through_json() {
        let request = Request::Handshake { node_id: "a".into(), credential: "secret".into() };
        let bytes = serde_json::to_vec(&request).unwrap();
        let decoded: Request = serde_json::from_slice(&bytes).unwrap();
        match decoded {
            Request::Handshake { node_id, credential } => {
                assert_eq!(node_id, "a");
                assert_eq!(credential, "secret");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn push_ack_round_trips() {
        let response = Response::PushAck { accepted: 3, rejected: 1 };
        let bytes = serde_json::to_vec(&response).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();
        match decoded {
            Response::PushAck { accepted, rejected } => {
                assert_eq!(accepted, 3);
                assert_eq!(rejected, 1);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn snapshot_offer_round_trips() {
        let request = Request::SnapshotOffer { bytes: vec![1, 2, 3], replace: true };
        let bytes = serde_json::to_vec(&request).unwrap();
        let decoded: Request = serde_json::from_slice(&bytes).unwrap();
        match decoded {
            Request::SnapshotOffer { bytes, replace } => {
                assert_eq!(bytes, vec![1, 2, 3]);
                assert!(replace);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
