//! Read-only status mirror published by the driver for the HTTP layer —
//! the same "status snapshot" shape the teacher crate used for engine
//! statistics, repurposed here for mode/master/color introspection.

use cluster_core::{Color, NodeId, NodeMode};
use std::collections::HashMap;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct NodeStatus {
    pub mode: NodeMode,
    pub master_id: Option<NodeId>,
    pub color: Color,
    pub node_colors: HashMap<NodeId, Color>,
}

impl NodeStatus {
    pub fn initial() -> Self {
        Self {
            mode: NodeMode::Electing,
            master_id: None,
            color: Color::Init,
            node_colors: HashMap::new(),
        }
    }
}

/// A single-writer/multi-reader snapshot channel. The driver owns the
/// sender; HTTP handlers and tests clone the receiver.
pub struct StatusPublisher {
    tx: watch::Sender<NodeStatus>,
}

#[derive(Clone)]
pub struct StatusWatcher {
    rx: watch::Receiver<NodeStatus>,
}

impl StatusPublisher {
    pub fn new() -> (Self, StatusWatcher) {
        let (tx, rx) = watch::channel(NodeStatus::initial());
        (Self { tx }, StatusWatcher { rx })
    }

    pub fn publish(&self, status: NodeStatus) {
        let _ = self.tx.send(status);
    }
}

impl StatusWatcher {
    pub fn current(&self) -> NodeStatus {
        self.rx.borrow().clone()
    }
}
