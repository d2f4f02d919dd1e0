//! Node configuration (spec §6: "Environment inputs: node id, TCP port, ...").
//! Grounded on `discovery::persistent::PersistentDataManager`'s TOML
//! load/default shape, simplified here to a one-shot load at startup (the
//! teacher's file-watcher/broadcast machinery is for runtime-mutable state;
//! node config is read once at process start).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: String,
    pub tcp_bind_addr: String,
    pub udp_beacon_port: u16,
    pub shared_secret: String,
    pub oauth2_issuer: Option<String>,
    pub oauth2_audience: Option<String>,
    pub known_peers: Vec<KnownPeer>,
    pub gossip_fanout: usize,
    pub beacon_ttl_seconds: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_millis: u64,
    pub oplog_retention_seconds: i64,
    pub require_encryption: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownPeer {
    pub node_id: String,
    pub address: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: uuid::Uuid::new_v4().to_string(),
            tcp_bind_addr: "0.0.0.0:0".into(),
            udp_beacon_port: 47921,
            shared_secret: String::new(),
            oauth2_issuer: None,
            oauth2_audience: None,
            known_peers: Vec::new(),
            gossip_fanout: 3,
            beacon_ttl_seconds: 30,
            retry_max_attempts: 3,
            retry_base_delay_millis: 200,
            oplog_retention_seconds: 7 * 24 * 3600,
            require_encryption: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("node_id must not be empty")]
    MissingNodeId,
    #[error("shared_secret must not be empty unless an OAuth2 issuer is configured")]
    MissingCredential,
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.display().to_string(), source: e })?;
        let config: NodeConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse { path: path.display().to_string(), source: e })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_id.trim().is_empty() {
            return Err(ConfigError::MissingNodeId);
        }
        if self.shared_secret.is_empty() && self.oauth2_issuer.is_none() {
            return Err(ConfigError::MissingCredential);
        }
        Ok(())
    }

    pub fn beacon_ttl(&self) -> Duration {
        Duration::from_secs(self.beacon_ttl_seconds)
    }

    pub fn retry_policy(&self) -> replidb_core::RetryPolicy {
        replidb_core::RetryPolicy::exponential(self.retry_max_attempts, Duration::from_millis(self.retry_base_delay_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_credential() {
        let config = NodeConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredential)));
    }

    #[test]
    fn config_with_shared_secret_validates() {
        let mut config = NodeConfig::default();
        config.shared_secret = "s3cr3t".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = NodeConfig::default();
        config.shared_secret = "s3cr3t".into();
        config.known_peers.push(KnownPeer { node_id: "b".into(), address: "10.0.0.2:9000".into() });
        let text = toml::to_string(&config).unwrap();
        let restored: NodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(restored.known_peers.len(), 1);
        assert_eq!(restored.node_id, config.node_id);
    }
}
