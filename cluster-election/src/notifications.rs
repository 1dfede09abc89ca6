//! A small broadcast bus for election/coloring/liveness events, kept for
//! observability (the HTTP health surface, logging, and tests) rather than
//! for driving protocol logic — nothing in this crate's state machines
//! reads from it.

use cluster_core::{Color, NodeId};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum ElectionEvent {
    ElectionStarted,
    BecameLeader { id: NodeId },
    BecameFollower { master_id: NodeId },
    ElectionUnsuccessful,
    ClusterReset,
    FollowerDied { id: NodeId },
    MasterDisconnected { master_id: NodeId },
    ColoringComplete { colors: Vec<(NodeId, Color)> },
}

/// Cloneable handle; every subscriber gets its own receiver and sees every
/// event published after it subscribed.
pub struct ElectionNotificationBus {
    tx: broadcast::Sender<ElectionEvent>,
}

impl ElectionNotificationBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: ElectionEvent) {
        // No subscribers is a normal, not an error, state.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ElectionEvent> {
        self.tx.subscribe()
    }
}

impl Default for ElectionNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = ElectionNotificationBus::new();
        let mut rx = bus.subscribe();
        bus.publish(ElectionEvent::BecameLeader { id: NodeId::new(2) });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ElectionEvent::BecameLeader { id } if id == NodeId::new(2)));
    }
}
