//! Environment-variable configuration for the node driver (spec §6
//! "Configuration (environment)"), resolved the way
//! `original_source/ex03/client/src/env.py` resolves its own: read once at
//! startup, fail fatally on anything required that's missing.

use cluster_core::{ClusterConfig, NodeId};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for environment variable {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// The subset of spec §6's environment surface the driver itself needs:
/// this node's identity and the cluster's address list. KV-specific
/// variables (`zookeeper`, `node_name`, `root_node`) are resolved
/// separately by `cluster-store`/`cluster-node`, which only the binary
/// crate needs to wire together.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cluster: ClusterConfig,
    pub api_port: u16,
    pub startup_delay: Duration,
    pub docker: bool,
}

impl EngineConfig {
    /// Loads from the process environment. `node_idx` (preferred) or
    /// `node_addr` supplies this node's index; `node_addrs` is a
    /// comma-separated `host:port` list in address-list order. When
    /// `docker` is present, addresses are left as configured (container
    /// DNS names) rather than rewritten to localhost.
    pub fn from_env() -> Result<Self, ConfigError> {
        let node_idx = env::var("node_idx")
            .or_else(|_| env::var("node_addr"))
            .map_err(|_| ConfigError::Missing("node_idx"))?;
        let node_idx: u32 = node_idx
            .parse()
            .map_err(|_| ConfigError::Invalid { name: "node_idx", value: node_idx.clone() })?;

        let node_addrs = env::var("node_addrs").map_err(|_| ConfigError::Missing("node_addrs"))?;
        let addrs: Vec<String> = node_addrs
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if addrs.is_empty() {
            return Err(ConfigError::Invalid { name: "node_addrs", value: node_addrs });
        }

        let api_port = match env::var("api_port") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "api_port", value: v })?,
            Err(_) => 8080,
        };

        let startup_delay = match env::var("startup_delay") {
            Ok(v) => {
                let secs: u64 = v
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name: "startup_delay", value: v })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(0),
        };

        let docker = env::var("docker").is_ok();

        Ok(Self {
            cluster: ClusterConfig::new(NodeId::new(node_idx), addrs),
            api_port,
            startup_delay,
            docker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn parses_a_minimal_valid_environment() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("node_idx", "1");
        env::set_var("node_addrs", "a:1,b:2,c:3");
        env::remove_var("api_port");
        env::remove_var("startup_delay");
        env::remove_var("docker");

        let cfg = EngineConfig::from_env().unwrap();
        assert_eq!(cfg.cluster.self_id, NodeId::new(1));
        assert_eq!(cfg.cluster.node_count(), 3);
        assert_eq!(cfg.api_port, 8080);
        assert!(!cfg.docker);

        env::remove_var("node_idx");
        env::remove_var("node_addrs");
    }

    #[test]
    fn missing_node_addrs_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("node_idx", "0");
        env::remove_var("node_addrs");
        assert!(EngineConfig::from_env().is_err());
        env::remove_var("node_idx");
    }
}
