//! The transport abstraction nodes use to exchange [`Message`]s, and the
//! static cluster addressing shared by every participant.

use crate::error::Result;
use crate::messages::Message;
use crate::types::NodeId;
use async_trait::async_trait;
use std::collections::HashSet;

/// The statically known, ordered list of peer addresses. The node's id is
/// its index into this list; the list itself never changes at runtime —
/// Bully tolerates peers going up and down, not the list being resized.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub self_id: NodeId,
    pub addrs: Vec<String>,
}

impl ClusterConfig {
    pub fn new(self_id: NodeId, addrs: Vec<String>) -> Self {
        Self { self_id, addrs }
    }

    pub fn node_count(&self) -> usize {
        self.addrs.len()
    }

    pub fn max_id(&self) -> u32 {
        self.addrs.len() as u32 - 1
    }

    pub fn addr_of(&self, id: NodeId) -> Option<&str> {
        self.addrs.get(id.value() as usize).map(String::as_str)
    }

    pub fn all_peer_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let self_id = self.self_id;
        (0..self.addrs.len() as u32)
            .map(NodeId::new)
            .filter(move |id| *id != self_id)
    }

    pub fn peer_ids_above_self(&self) -> impl Iterator<Item = NodeId> + '_ {
        let self_id = self.self_id;
        ((self_id.value() + 1)..self.addrs.len() as u32).map(NodeId::new)
    }
}

/// Fire-and-forget message transport. Sends must never block the driver;
/// implementations hand work off to a small pool of worker participants.
/// Failures are swallowed — the protocol tolerates loss via timeouts.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_to(&self, target: NodeId, message: Message);

    async fn broadcast(&self, message: Message) {
        for target in self.peers() {
            self.send_to(target, message.clone()).await;
        }
    }

    fn peers(&self) -> Vec<NodeId>;

    async fn is_connected(&self, node_id: NodeId) -> bool;

    async fn get_connected_nodes(&self) -> Result<HashSet<NodeId>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_ids_above_self_excludes_lower_and_equal() {
        let cfg = ClusterConfig::new(NodeId::new(1), vec!["a".into(), "b".into(), "c".into()]);
        let above: Vec<_> = cfg.peer_ids_above_self().collect();
        assert_eq!(above, vec![NodeId::new(2)]);
    }

    #[test]
    fn all_peer_ids_excludes_self_only() {
        let cfg = ClusterConfig::new(NodeId::new(1), vec!["a".into(), "b".into(), "c".into()]);
        let all: Vec<_> = cfg.all_peer_ids().collect();
        assert_eq!(all, vec![NodeId::new(0), NodeId::new(2)]);
    }

    #[test]
    fn max_id_is_len_minus_one() {
        let cfg = ClusterConfig::new(NodeId::new(0), vec!["a".into(), "b".into()]);
        assert_eq!(cfg.max_id(), 1);
    }
}
