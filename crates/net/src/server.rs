//! Sync server (spec §4.11): accepts TCP connections, each driven by an
//! independent per-connection handler. Grounded on
//! `discovery::udp_multicast::DiscoveryServiceImplementation`'s
//! accept-loop/cancellation shape, generalized from UDP receive to a TCP
//! accept loop with one spawned task per connection.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use replidb_core::{CoreError, DocumentStore, HlcTimestamp, Snapshot};

use crate::auth::Authenticator;
use crate::protocol::{Request, Response};
use crate::transport::{self, EphemeralKeyExchange, SessionKeys};

pub struct SyncServer {
    store: Arc<DocumentStore>,
    authenticator: Arc<Authenticator>,
    require_encryption: bool,
}

impl SyncServer {
    pub fn new(store: Arc<DocumentStore>, authenticator: Arc<Authenticator>, require_encryption: bool) -> Self {
        Self { store, authenticator, require_encryption }
    }

    /// Binds and runs the accept loop until `cancel` fires (spec §5: "a
    /// single shared cancellation source shuts everything down").
    pub async fn serve(self: Arc<Self>, bind_addr: &str, cancel: CancellationToken) -> Result<(), CoreError> {
        let listener =
            TcpListener::bind(bind_addr).await.map_err(|e| CoreError::Network(format!("bind {bind_addr} failed: {e}")))?;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let this = self.clone();
                            let handler_cancel = cancel.clone();
                            tokio::spawn(async move {
                                if let Err(e) = this.handle_connection(stream, handler_cancel).await {
                                    log::warn!("sync connection from {peer_addr} ended: {e}");
                                }
                            });
                        }
                        Err(e) => log::warn!("accept failed: {e}"),
                    }
                }
            }
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream, cancel: CancellationToken) -> Result<(), CoreError> {
        let (node_id, credential) = self.read_handshake(&mut stream).await?;
        if let Err(e) = self.authenticator.authenticate(&credential) {
            self.send_plain(&mut stream, &Response::HandshakeRejected { reason: e.to_string() }).await?;
            return Err(e);
        }
        self.send_plain(&mut stream, &Response::HandshakeAccepted).await?;
        log::info!("handshake accepted for node {node_id}");

        let session_keys = if self.require_encryption {
            Some(self.perform_key_exchange(&mut stream).await?)
        } else {
            None
        };

        self.request_loop(stream, session_keys, cancel).await
    }

    async fn read_handshake(&self, stream: &mut TcpStream) -> Result<(String, String), CoreError> {
        let bytes = transport::read_plain_frame(stream).await?;
        let request: Request =
            serde_json::from_slice(&bytes).map_err(|e| CoreError::Network(format!("bad handshake frame: {e}")))?;
        match request {
            Request::Handshake { node_id, credential } => Ok((node_id, credential)),
            _ => Err(CoreError::Auth("expected handshake as first message".into())),
        }
    }

    async fn perform_key_exchange(&self, stream: &mut TcpStream) -> Result<SessionKeys, CoreError> {
        let bytes = transport::read_plain_frame(stream).await?;
        let request: Request =
            serde_json::from_slice(&bytes).map_err(|e| CoreError::Network(format!("bad key exchange frame: {e}")))?;
        let Request::KeyExchange { ephemeral_public_key } = request else {
            return Err(CoreError::Crypto("expected KeyExchange after handshake".into()));
        };

        let ours = EphemeralKeyExchange::generate();
        let our_public = ours.public_key;
        self.send_plain(stream, &Response::KeyExchange { ephemeral_public_key: our_public }).await?;

        Ok(ours.derive_session_keys(ephemeral_public_key, false))
    }

    async fn request_loop(
        &self,
        mut stream: TcpStream,
        session_keys: Option<SessionKeys>,
        cancel: CancellationToken,
    ) -> Result<(), CoreError> {
        loop {
            let bytes = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                frame = self.read_request_frame(&mut stream, session_keys.as_ref()) => frame?,
            };
            let request: Request =
                serde_json::from_slice(&bytes).map_err(|e| CoreError::Network(format!("bad request frame: {e}")))?;
            let response = self.handle_request(request);
            self.write_response_frame(&mut stream, session_keys.as_ref(), &response).await?;
        }
    }

    fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::GetClock => Response::Clock { timestamp: self.store.vector_clock().latest_timestamp() },
            Request::GetVectorClock => {
                let entries: HashMap<String, HlcTimestamp> = self.store.vector_clock().snapshot().into_iter().collect();
                Response::VectorClock { entries }
            }
            Request::PullChanges { since } => {
                Response::Entries { entries: self.store.oplog().oplog_after(&since, None) }
            }
            Request::PullForNode { node_id, since } => {
                Response::Entries { entries: self.store.oplog().oplog_for_node_after(&node_id, &since, None) }
            }
            Request::PushChanges { entries } => {
                let submitted = entries.len();
                match self.store.apply_batch(entries) {
                    Ok(()) => Response::PushAck { accepted: submitted, rejected: 0 },
                    Err(e) => {
                        log::warn!("apply_batch failed on push: {e}");
                        Response::Error { message: e.to_string() }
                    }
                }
            }
            Request::SnapshotRequest => {
                let mut bytes = Vec::new();
                match self.store.write_snapshot(&mut bytes) {
                    Ok(()) => Response::SnapshotBytes { bytes },
                    Err(e) => Response::Error { message: e.to_string() },
                }
            }
            Request::SnapshotOffer { bytes, replace } => {
                let result = Snapshot::read_from(bytes.as_slice()).and_then(|snapshot| {
                    if replace {
                        self.store.replace_database(snapshot)
                    } else {
                        self.store.merge_snapshot(snapshot)
                    }
                });
                match result {
                    Ok(()) => Response::SnapshotAccepted,
                    Err(e) => {
                        log::warn!("snapshot offer rejected: {e}");
                        Response::Error { message: e.to_string() }
                    }
                }
            }
            Request::Handshake { .. } | Request::KeyExchange { .. } => {
                Response::Error { message: "handshake/key exchange already complete".into() }
            }
        }
    }

    async fn send_plain(&self, stream: &mut TcpStream, response: &Response) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(response).map_err(|e| CoreError::Network(format!("encode failed: {e}")))?;
        transport::write_plain_frame(stream, &bytes).await
    }

    async fn read_request_frame(&self, stream: &mut TcpStream, keys: Option<&SessionKeys>) -> Result<Vec<u8>, CoreError> {
        match keys {
            Some(keys) => transport::read_encrypted_frame(stream, &keys.decrypt_key).await,
            None => transport::read_plain_frame(stream).await,
        }
    }

    async fn write_response_frame(
        &self,
        stream: &mut TcpStream,
        keys: Option<&SessionKeys>,
        response: &Response,
    ) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(response).map_err(|e| CoreError::Network(format!("encode failed: {e}")))?;
        match keys {
            Some(keys) => transport::write_encrypted_frame(stream, &keys.encrypt_key, &bytes).await,
            None => transport::write_plain_frame(stream, &bytes).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replidb_core::{HlcGenerator, MemoryOplogStore, ResolverStrategy, VectorClockService};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpStream as ClientStream;

    fn new_store(node_id: &str) -> Arc<DocumentStore> {
        Arc::new(DocumentStore::new(
            node_id,
            Arc::new(HlcGenerator::new(node_id)),
            Arc::new(MemoryOplogStore::new()),
            Arc::new(VectorClockService::new()),
            ResolverStrategy::RecursiveMerge,
        ))
    }

    #[tokio::test]
    async fn handshake_then_get_clock_round_trip() {
        let store = new_store("server");
        store.put_local("docs", "a", serde_json::json!({"v": 1})).unwrap();
        let server = Arc::new(SyncServer::new(store, Arc::new(Authenticator::shared_secret("s3cr3t")), false));
        let cancel = CancellationToken::new();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_for_task = server.clone();
        let cancel_for_task = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_for_task.cancelled() => break,
                    accepted = listener.accept() => {
                        if let Ok((stream, _)) = accepted {
                            let srv = server_for_task.clone();
                            let c = cancel_for_task.clone();
                            tokio::spawn(async move { let _ = srv.handle_connection(stream, c).await; });
                        }
                    }
                }
            }
        });

        let mut client = ClientStream::connect(addr).await.unwrap();
        let handshake = Request::Handshake { node_id: "client".into(), credential: "s3cr3t".into() };
        transport::write_plain_frame(&mut client, &serde_json::to_vec(&handshake).unwrap()).await.unwrap();
        let reply: Response = serde_json::from_slice(&transport::read_plain_frame(&mut client).await.unwrap()).unwrap();
        assert!(matches!(reply, Response::HandshakeAccepted));

        transport::write_plain_frame(&mut client, &serde_json::to_vec(&Request::GetClock).unwrap()).await.unwrap();
        let reply: Response = serde_json::from_slice(&transport::read_plain_frame(&mut client).await.unwrap()).unwrap();
        match reply {
            Response::Clock { timestamp } => assert_eq!(timestamp.node_id, "server"),
            other => panic!("unexpected response: {other:?}"),
        }

        client.shutdown().await.ok();
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn bad_credential_is_rejected_and_connection_closed() {
        let store = new_store("server");
        let server = Arc::new(SyncServer::new(store, Arc::new(Authenticator::shared_secret("s3cr3t")), false));
        let cancel = CancellationToken::new();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_for_task = server.clone();
        let cancel_for_task = cancel.clone();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = server_for_task.handle_connection(stream, cancel_for_task).await;
            }
        });

        let mut client = ClientStream::connect(addr).await.unwrap();
        let handshake = Request::Handshake { node_id: "client".into(), credential: "wrong".into() };
        transport::write_plain_frame(&mut client, &serde_json::to_vec(&handshake).unwrap()).await.unwrap();
        let reply: Response = serde_json::from_slice(&transport::read_plain_frame(&mut client).await.unwrap()).unwrap();
        assert!(matches!(reply, Response::HandshakeRejected { .. }));
        cancel.cancel();
    }
}
