//! Spins up a simulated cluster of [`NodeDriver`]s wired over an
//! [`InMemoryTransport`] hub, for exercising election/coloring/liveness
//! end-to-end without any sockets. New; there is no teacher counterpart
//! to the Bully protocol itself, but the spawn-and-watch shape mirrors
//! `rabia-testing`'s harnesses of single-process multi-node clusters.

use cluster_core::{ClusterConfig, Inbox, NodeId, DEFAULT_INBOX_CAPACITY};
use cluster_election::ElectionTimings;
use cluster_engine::{NodeDriver, StatusWatcher};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::network::{InMemoryHub, InMemoryTransport};

pub struct SimulatedNode {
    pub status: StatusWatcher,
    pub handle: JoinHandle<()>,
}

/// A cluster of `node_count` addresses, with drivers spawned for however
/// many nodes are currently "present". Nodes not yet present still have
/// a slot in `addrs` (so present nodes can address them) but no driver
/// task and no inbox registered in the hub, matching a process that
/// hasn't started yet.
pub struct SimulatedCluster {
    pub hub: Arc<InMemoryHub>,
    addrs: Vec<String>,
    timings: ElectionTimings,
    nodes: HashMap<NodeId, SimulatedNode>,
}

impl SimulatedCluster {
    /// Spawns drivers for every id in `active`, out of `node_count` total
    /// addresses.
    pub fn spawn_subset(node_count: u32, active: &[u32], timings: ElectionTimings) -> Self {
        let addrs: Vec<String> = (0..node_count).map(|i| format!("node-{i}")).collect();
        let mut cluster = Self {
            hub: InMemoryHub::new(),
            addrs,
            timings,
            nodes: HashMap::new(),
        };
        for &id in active {
            cluster.join(NodeId::new(id));
        }
        cluster
    }

    /// Spawns drivers for every node up front (the common case).
    pub fn spawn(node_count: u32, timings: ElectionTimings) -> Self {
        let active: Vec<u32> = (0..node_count).collect();
        Self::spawn_subset(node_count, &active, timings)
    }

    /// Starts a driver for a node that wasn't active yet, simulating a
    /// fresh process join (spec §8 scenario 4).
    pub fn join(&mut self, self_id: NodeId) {
        let config = ClusterConfig::new(self_id, self.addrs.clone());
        let inbox = Inbox::new(DEFAULT_INBOX_CAPACITY);
        self.hub.register(self_id, inbox.sender());
        let peers: Vec<NodeId> = config.all_peer_ids().collect();
        let transport = Arc::new(InMemoryTransport::new(self_id, peers, self.hub.clone()));
        let (driver, status) = NodeDriver::new(config, transport, inbox, self.timings.clone());
        let driver = driver.with_seed(self_id.value() as u64);
        let handle = tokio::spawn(driver.run());
        self.nodes.insert(self_id, SimulatedNode { status, handle });
    }

    pub fn status_of(&self, id: NodeId) -> cluster_engine::NodeStatus {
        self.nodes
            .get(&id)
            .map(|n| n.status.current())
            .unwrap_or_else(cluster_engine::NodeStatus::initial)
    }

    pub fn set_down(&self, id: NodeId, down: bool) {
        self.hub.set_down(id, down);
    }

    pub fn shutdown(self) {
        for node in self.nodes.into_values() {
            node.handle.abort();
        }
    }
}

/// Polls `predicate` against the cluster until it holds or `timeout`
/// elapses, returning whether it converged. Deterministic end-state
/// assertions in the scenarios below all funnel through this.
pub async fn wait_until(
    cluster: &SimulatedCluster,
    timeout: Duration,
    mut predicate: impl FnMut(&SimulatedCluster) -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate(cluster) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
