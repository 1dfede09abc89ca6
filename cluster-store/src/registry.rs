//! The Registry collaborator (spec §4.7) and the join-time handshake that
//! uses it. Treated as an external collaborator per spec §1's explicit
//! scoping; grounded in
//! `original_source/ex03/client/src/cluster/zookeeper_connector.py`'s
//! poll/retry/fatal-exit protocol, trait-ized so the real ZooKeeper
//! client can be swapped in without touching the join logic.

use async_trait::async_trait;
use cluster_core::{ClusterError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

#[async_trait]
pub trait Registry: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    /// Fails if `path` already exists.
    async fn create(&self, path: &str) -> Result<()>;
}

/// An in-process stand-in for a real registry (e.g. ZooKeeper), used in
/// tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRegistry {
    paths: Mutex<HashSet<String>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn exists(&self, path: &str) -> bool {
        self.paths.lock().unwrap().contains(path)
    }

    async fn create(&self, path: &str) -> Result<()> {
        let mut paths = self.paths.lock().unwrap();
        if !paths.insert(path.to_string()) {
            return Err(ClusterError::registry(format!("path {path} already exists")));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

/// Talks to an out-of-process registry over HTTP. The node process that
/// owns the registry (the root, in this deployment — see
/// `cluster-node/src/main.rs`) exposes it at `/registry/exists` and
/// `/registry/create`; every other process reaches it through this
/// client instead of holding its own [`InMemoryRegistry`], which is what
/// actually lets `register_root`/`register_joining_node` observe each
/// other across process boundaries. Shaped like `parent.rs`'s
/// `HttpParentClient`.
pub struct HttpRegistry {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn exists(&self, path: &str) -> bool {
        let url = format!("{}/registry/exists", self.base_url.trim_end_matches('/'));
        let resp = match self.client.get(url).query(&[("path", path)]).send().await {
            Ok(resp) => resp,
            Err(err) => {
                debug!(path, %err, "registry exists check failed, treating as absent");
                return false;
            }
        };
        match resp.json::<ExistsResponse>().await {
            Ok(body) => body.exists,
            Err(err) => {
                debug!(path, %err, "malformed registry exists response, treating as absent");
                false
            }
        }
    }

    async fn create(&self, path: &str) -> Result<()> {
        let url = format!("{}/registry/create", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(url)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| ClusterError::registry(format!("registry unreachable: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else if resp.status().as_u16() == 409 {
            Err(ClusterError::registry(format!("path {path} already exists")))
        } else {
            Err(ClusterError::registry(format!(
                "unexpected registry status {}",
                resp.status()
            )))
        }
    }
}

/// Registers the root node's path unconditionally; fatal if it already
/// exists (spec §4.7: "The root creates `/rootName` unconditionally at
/// startup and fails if it already exists").
pub async fn register_root(registry: &dyn Registry, root_path: &str) -> Result<()> {
    info!(path = root_path, "registering root node");
    registry.create(root_path).await
}

/// Polls for `parent_path` up to `retries` times, `wait_interval` apart,
/// then registers `own_path`. Fatal (per spec §4.7/§7.4) if the parent
/// never appears.
pub async fn register_joining_node(
    registry: &dyn Registry,
    own_path: &str,
    parent_path: &str,
    retries: u32,
    wait_interval: Duration,
) -> Result<()> {
    for attempt in 0..retries {
        if registry.exists(parent_path).await {
            return registry.create(own_path).await;
        }
        debug!(parent_path, attempt, "parent not yet registered, retrying");
        tokio::time::sleep(wait_interval).await;
    }
    Err(ClusterError::registry(format!(
        "parent path {parent_path} never appeared after {retries} retries"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_registers_unconditionally() {
        let registry = InMemoryRegistry::new();
        register_root(&registry, "/root").await.unwrap();
        assert!(registry.exists("/root").await);
    }

    #[tokio::test]
    async fn root_registration_fails_if_path_exists() {
        let registry = InMemoryRegistry::new();
        registry.create("/root").await.unwrap();
        assert!(register_root(&registry, "/root").await.is_err());
    }

    #[tokio::test]
    async fn joining_node_waits_for_parent_then_registers() {
        let registry = InMemoryRegistry::new();
        registry.create("/root").await.unwrap();
        register_joining_node(&registry, "/root/A", "/root", 3, Duration::from_millis(5))
            .await
            .unwrap();
        assert!(registry.exists("/root/A").await);
    }

    #[tokio::test]
    async fn joining_node_fails_fatally_if_parent_never_appears() {
        let registry = InMemoryRegistry::new();
        let result =
            register_joining_node(&registry, "/root/A", "/root", 2, Duration::from_millis(5))
                .await;
        assert!(result.is_err());
        assert!(!registry.exists("/root/A").await);
    }
}
