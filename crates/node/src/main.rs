mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::EnvFilter;

use replidb_core::{DocumentStore, HlcGenerator, MemoryOplogStore, ResolverStrategy, VectorClockService};
use replidb_net::discovery::{Discovery, PersistentPeerRegistry, UdpBeacon};
use replidb_net::{Authenticator, MaintenanceTask, SyncOrchestrator, SyncServer};

use config::NodeConfig;

/// Exit codes per spec §6.
const EXIT_OK: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 1;
const EXIT_PERSISTENCE_FAILURE: u8 = 2;
const EXIT_NETWORK_BIND_FAILURE: u8 = 3;

#[derive(Parser)]
#[command(name = "replidb")]
#[command(about = "Peer-to-peer replicated document database node", long_about = None)]
struct Cli {
    /// Path to the node's TOML configuration file.
    #[arg(short, long, default_value = "replidb.toml")]
    config: PathBuf,

    /// Override the TCP bind address from the config file.
    #[arg(long)]
    tcp_bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new("info")).init();

    let cli = Cli::parse();
    let mut node_config = match NodeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if let Some(addr) = cli.tcp_bind_addr {
        node_config.tcp_bind_addr = addr;
    }

    run(node_config).await
}

async fn run(node_config: NodeConfig) -> ExitCode {
    let node_id = node_config.node_id.clone();
    let store = Arc::new(DocumentStore::new(
        node_id.clone(),
        Arc::new(HlcGenerator::new(node_id.clone())),
        Arc::new(MemoryOplogStore::new()),
        Arc::new(VectorClockService::new()),
        ResolverStrategy::RecursiveMerge,
    ));

    let registry = Arc::new(PersistentPeerRegistry::new(store.clone(), std::time::Duration::from_secs(300)));
    for peer in &node_config.known_peers {
        if let Err(e) = registry.upsert(&replidb_core::RemotePeerConfiguration {
            node_id: peer.node_id.clone(),
            address: peer.address.clone(),
            peer_type: replidb_core::RemotePeerType::StaticRemote,
            oauth2_issuer: node_config.oauth2_issuer.clone(),
            is_enabled: true,
        }) {
            tracing::error!("failed to persist known peer {}: {e}", peer.node_id);
            return ExitCode::from(EXIT_PERSISTENCE_FAILURE);
        }
    }

    let tcp_port = match parse_port(&node_config.tcp_bind_addr) {
        Ok(port) => port,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let beacon =
        Arc::new(UdpBeacon::new(node_id.clone(), tcp_port, node_config.udp_beacon_port, node_config.beacon_ttl()));
    let cancel = CancellationToken::new();

    if let Err(e) = beacon.listen(cancel.clone()).await {
        tracing::error!("network bind failure for udp beacon: {e}");
        return ExitCode::from(EXIT_NETWORK_BIND_FAILURE);
    }

    let discovery = Arc::new(Discovery::new(beacon.clone(), registry, node_id.clone()));

    let authenticator = Arc::new(match &node_config.oauth2_issuer {
        Some(issuer) => Authenticator::jwt_hmac(
            issuer,
            node_config.oauth2_audience.as_deref().unwrap_or("replidb"),
            node_config.shared_secret.as_bytes(),
        ),
        None => Authenticator::shared_secret(node_config.shared_secret.clone()),
    });

    let server = Arc::new(SyncServer::new(store.clone(), authenticator, node_config.require_encryption));
    let server_cancel = cancel.clone();
    let bind_addr = node_config.tcp_bind_addr.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.serve(&bind_addr, server_cancel).await {
            tracing::error!("sync server stopped: {e}");
        }
    });

    let orchestrator = Arc::new(
        SyncOrchestrator::new(store.clone(), discovery.clone(), node_config.shared_secret.clone(), node_config.gossip_fanout)
            .with_retry_policy(node_config.retry_policy()),
    );
    let orchestrator_for_task = orchestrator.clone();
    let orchestrator_cancel = cancel.clone();
    let orchestrator_task = tokio::spawn(async move { orchestrator_for_task.run(orchestrator_cancel).await });

    let offline_queue_feed_cancel = cancel.clone();
    let offline_queue_task = tokio::spawn(orchestrator.clone().feed_offline_queue(offline_queue_feed_cancel));

    let beacon_for_task = beacon.clone();
    let beacon_cancel = cancel.clone();
    let beacon_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = beacon_cancel.cancelled() => break,
                _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => {
                    if let Err(e) = beacon_for_task.announce().await {
                        tracing::warn!("beacon announce failed: {e}");
                    }
                }
            }
        }
    });

    let maintenance = Arc::new(MaintenanceTask::new(
        store.clone(),
        std::time::Duration::from_secs(60),
        node_config.oplog_retention_seconds,
    ));
    let maintenance_cancel = cancel.clone();
    let maintenance_task = tokio::spawn(async move { maintenance.run(maintenance_cancel).await });

    tracing::info!("replidb node {node_id} listening on {}", node_config.tcp_bind_addr);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();
    beacon.shutdown().await;
    let _ = tokio::join!(server_task, orchestrator_task, offline_queue_task, beacon_task, maintenance_task);

    ExitCode::from(EXIT_OK)
}

fn parse_port(bind_addr: &str) -> Result<u16, String> {
    bind_addr
        .rsplit(':')
        .next()
        .ok_or_else(|| format!("invalid bind address {bind_addr}"))?
        .parse::<u16>()
        .map_err(|e| format!("invalid port in {bind_addr}: {e}"))
}
