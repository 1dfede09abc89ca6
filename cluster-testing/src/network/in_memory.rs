//! An in-process [`Transport`] that delivers directly into peer inboxes,
//! with a shared "down" set standing in for crashed or partitioned
//! nodes. Kept in shape from `rabia-testing/src/network/in_memory.rs`'s
//! hub-and-spoke design, retyped onto `cluster-core`'s `Message`/
//! `NodeId`/`Transport` and simplified: no separate message-bus task is
//! needed since delivery is just a direct `InboxSender::try_push`.

use async_trait::async_trait;
use cluster_core::{InboxSender, Message, NodeId, Result, Transport};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Shared registry of every node's inbox plus which nodes are currently
/// unreachable. One hub is shared by every [`InMemoryTransport`] in a
/// simulated cluster.
#[derive(Default)]
pub struct InMemoryHub {
    inboxes: RwLock<HashMap<NodeId, InboxSender>>,
    down: RwLock<HashSet<NodeId>>,
}

impl InMemoryHub {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn register(&self, id: NodeId, sender: InboxSender) {
        self.inboxes.write().unwrap().insert(id, sender);
    }

    /// Marks `id` down (crashed or partitioned away): messages to and
    /// from it are silently dropped, matching the real transport's
    /// fire-and-forget failure mode.
    pub fn set_down(&self, id: NodeId, down: bool) {
        let mut set = self.down.write().unwrap();
        if down {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    fn is_down(&self, id: NodeId) -> bool {
        self.down.read().unwrap().contains(&id)
    }
}

pub struct InMemoryTransport {
    self_id: NodeId,
    peers: Vec<NodeId>,
    hub: Arc<InMemoryHub>,
}

impl InMemoryTransport {
    pub fn new(self_id: NodeId, peers: Vec<NodeId>, hub: Arc<InMemoryHub>) -> Self {
        Self {
            self_id,
            peers,
            hub,
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send_to(&self, target: NodeId, message: Message) {
        if self.hub.is_down(self.self_id) || self.hub.is_down(target) {
            return;
        }
        let inboxes = self.hub.inboxes.read().unwrap();
        if let Some(sender) = inboxes.get(&target) {
            sender.try_push(message);
        }
    }

    fn peers(&self) -> Vec<NodeId> {
        self.peers.clone()
    }

    async fn is_connected(&self, node_id: NodeId) -> bool {
        !self.hub.is_down(node_id) && self.hub.inboxes.read().unwrap().contains_key(&node_id)
    }

    async fn get_connected_nodes(&self) -> Result<HashSet<NodeId>> {
        let inboxes = self.hub.inboxes.read().unwrap();
        Ok(self
            .peers
            .iter()
            .copied()
            .filter(|id| inboxes.contains_key(id) && !self.hub.is_down(*id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_core::{Inbox, MessageValue};
    use std::time::Duration;

    #[tokio::test]
    async fn message_is_delivered_to_the_target_inbox() {
        let hub = InMemoryHub::new();
        let mut inbox_b = Inbox::new(8);
        hub.register(NodeId::new(1), inbox_b.sender());

        let transport_a =
            InMemoryTransport::new(NodeId::new(0), vec![NodeId::new(1)], hub.clone());
        transport_a
            .send_to(
                NodeId::new(1),
                Message::heartbeat(MessageValue::HeartbeatRequest, NodeId::new(0)),
            )
            .await;

        let got = inbox_b.pop(Duration::from_millis(100)).await;
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn messages_to_a_down_node_are_dropped() {
        let hub = InMemoryHub::new();
        let mut inbox_b = Inbox::new(8);
        hub.register(NodeId::new(1), inbox_b.sender());
        hub.set_down(NodeId::new(1), true);

        let transport_a =
            InMemoryTransport::new(NodeId::new(0), vec![NodeId::new(1)], hub.clone());
        transport_a
            .send_to(
                NodeId::new(1),
                Message::heartbeat(MessageValue::HeartbeatRequest, NodeId::new(0)),
            )
            .await;

        let got = inbox_b.pop(Duration::from_millis(20)).await;
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn get_connected_nodes_excludes_down_peers() {
        let hub = InMemoryHub::new();
        let inbox_a = Inbox::new(8);
        let inbox_b = Inbox::new(8);
        hub.register(NodeId::new(0), inbox_a.sender());
        hub.register(NodeId::new(1), inbox_b.sender());
        hub.set_down(NodeId::new(1), true);

        let transport =
            InMemoryTransport::new(NodeId::new(0), vec![NodeId::new(1)], hub.clone());
        let connected = transport.get_connected_nodes().await.unwrap();
        assert!(connected.is_empty());
    }
}
