//! The node process: one binary that runs both halves of the system
//! described in `cluster-engine`/`cluster-store` — the election/coloring
//! driver over a TCP transport, and the hierarchical KV store behind an
//! `axum` HTTP server.
//!
//! Startup sequence is grounded in
//! `original_source/ex03/client/src/main.py`: the root node registers its
//! tree position unconditionally before anything else starts; a non-root
//! node sleeps `startup_delay`, asks the root for its tree position over
//! HTTP, then joins the registry under that position before serving
//! traffic. Logging setup follows `spineldb-spineldb/src/main.rs`'s
//! `tracing_subscriber::registry()` + layered-filter idiom, with the file
//! layer's non-blocking writer grounded in the `tracing_appender` usage
//! seen in the broader example pack's stress-test binaries.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cluster_core::Inbox;
use cluster_election::ElectionTimings;
use cluster_engine::{EngineConfig, NodeDriver};
use cluster_network::TcpTransport;
use cluster_store::{
    register_joining_node, register_root, AppState, HttpParentClient, HttpRegistry,
    InMemoryRegistry, Registry, Store, TreePositionService,
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// Constants mirror `zookeeper_connector.py`'s `N_RETRIES`/
/// `WAIT_INTERVAL_SECS` — the registry join handshake's retry budget is
/// not itself part of the environment surface (spec §6's configuration
/// table only lists the registry's endpoint, not its retry policy).
const REGISTRY_RETRIES: u32 = 5;
const REGISTRY_WAIT_INTERVAL: Duration = Duration::from_secs(5);

/// KV-specific environment resolution (spec §6): the subset of the
/// configuration surface `EngineConfig` deliberately leaves to the
/// binary, since it is meaningful only to the store/tree/registry layer.
struct KvEnv {
    node_name: String,
    root_node: String,
    n_nodes: usize,
    registry_endpoint: String,
    debug: bool,
    log_dir: String,
}

impl KvEnv {
    fn from_env() -> Result<Self> {
        let node_name = std::env::var("node_name").context("missing required env var node_name")?;
        let root_node = std::env::var("root_node").context("missing required env var root_node")?;
        let n_nodes: usize = std::env::var("n_nodes")
            .context("missing required env var n_nodes")?
            .parse()
            .context("n_nodes must be a positive integer")?;
        let registry_endpoint = std::env::var("zookeeper")
            .or_else(|_| std::env::var("registry_endpoint"))
            .unwrap_or_default();
        let debug = std::env::var("debug").is_ok();
        let log_dir = std::env::var("log_dir").unwrap_or_else(|_| ".".to_string());

        Ok(Self {
            node_name,
            root_node,
            n_nodes,
            registry_endpoint,
            debug,
            log_dir,
        })
    }

    fn dump(&self, node_idx: u32) {
        if !self.debug {
            return;
        }
        info!(
            node_idx,
            node_name = %self.node_name,
            root_node = %self.root_node,
            n_nodes = self.n_nodes,
            registry_endpoint = %self.registry_endpoint,
            log_dir = %self.log_dir,
            "resolved environment"
        );
    }
}

/// Installs stdout + truncated-per-node-file logging (spec §6 "Persisted
/// log layout"). Returns the non-blocking writer's flush guard, which the
/// caller must keep alive for the process's lifetime.
fn init_logging(node_idx: u32, log_dir: &str) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = format!("{}/NODE-{node_idx}.log", log_dir.trim_end_matches('/'));
    let file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {log_path}"))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let env_filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_ansi(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let engine_config = EngineConfig::from_env().context("failed to resolve engine configuration")?;
    let kv_env = KvEnv::from_env().context("failed to resolve store configuration")?;
    let _log_guard = init_logging(engine_config.cluster.self_id.value(), &kv_env.log_dir)?;
    kv_env.dump(engine_config.cluster.self_id.value());

    info!(
        id = %engine_config.cluster.self_id,
        node_name = %kv_env.node_name,
        "starting cluster node"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let http_shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    let inbox = Inbox::new(cluster_core::DEFAULT_INBOX_CAPACITY);
    let transport = TcpTransport::bind(engine_config.cluster.clone(), inbox.sender())
        .await
        .context("failed to bind election/coloring transport")?;

    let (driver, _status) = NodeDriver::new(
        engine_config.cluster.clone(),
        Arc::new(transport) as Arc<dyn cluster_core::Transport>,
        inbox,
        ElectionTimings::default(),
    );
    tokio::spawn(driver.run());

    // The registry is process-local on whichever node hosts it (the
    // root, in this deployment — see `register_root` below) and reached
    // over HTTP by everyone else, since `cluster-node` runs one OS
    // process per address and an in-memory registry cannot otherwise be
    // observed across processes (spec §4.7). A node-local
    // `registry_endpoint`/`zookeeper` value, if set, points at that
    // external registry instead of the root's own HTTP surface.
    let is_root = kv_env.node_name == kv_env.root_node;
    let root_registry = Arc::new(InMemoryRegistry::new());
    let registry: Arc<dyn Registry> = if is_root {
        root_registry.clone()
    } else if !kv_env.registry_endpoint.is_empty() {
        Arc::new(HttpRegistry::new(kv_env.registry_endpoint.clone()))
    } else {
        let root_url = format!("http://{}:{}", kv_env.root_node, engine_config.api_port);
        Arc::new(HttpRegistry::new(root_url))
    };

    let (queue, _queue_worker) = cluster_store::BackgroundQueue::spawn();

    let app_state = if is_root {
        let root_path = format!("/{}", kv_env.node_name);
        register_root(registry.as_ref(), &root_path)
            .await
            .context("failed to register root node in the registry")?;
        let tree = Arc::new(TreePositionService::new(kv_env.n_nodes, kv_env.node_name.clone()));
        let store = Arc::new(Store::new(None, queue));
        AppState {
            store,
            tree: Some(tree),
            registry: Some(root_registry),
        }
    } else {
        tokio::time::sleep(engine_config.startup_delay).await;

        let root_url = format!(
            "http://{}:{}",
            kv_env.root_node, engine_config.api_port
        );
        let http_client = reqwest::Client::new();
        let parent_resp = http_client
            .get(format!("{root_url}/nodes/parent/{}", kv_env.node_name))
            .send()
            .await
            .context("failed to reach root node for tree position assignment")?;
        if !parent_resp.status().is_success() {
            anyhow::bail!(
                "root node rejected tree position request with status {}",
                parent_resp.status()
            );
        }
        #[derive(serde::Deserialize)]
        struct ParentPathResponse {
            path: String,
        }
        let parent_path = parent_resp
            .json::<ParentPathResponse>()
            .await
            .context("malformed tree position response from root")?
            .path;

        let own_path = format!("{parent_path}/{}", kv_env.node_name);
        register_joining_node(
            registry.as_ref(),
            &own_path,
            &parent_path,
            REGISTRY_RETRIES,
            REGISTRY_WAIT_INTERVAL,
        )
        .await
        .with_context(|| format!("failed to register node at {own_path}"))?;

        let parent_name = parent_path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&kv_env.root_node);
        let parent_url = format!("http://{parent_name}:{}", engine_config.api_port);
        let parent_client = Arc::new(HttpParentClient::new(parent_url));
        let store = Arc::new(Store::new(Some(parent_client), queue));

        info!(node_name = %kv_env.node_name, path = %own_path, "node registered, ready to serve");
        AppState {
            store,
            tree: None,
            registry: None,
        }
    };

    cluster_store::serve(app_state, engine_config.api_port, http_shutdown_rx)
        .await
        .context("store HTTP server exited with an error")?;

    Ok(())
}
