//! Mutable state owned by a single node's driver participant (spec §5:
//! "all node state... is owned by the driver participant and not shared").

use cluster_core::{Color, NodeId, NodeMode, Timeout};
use std::collections::HashMap;

/// Everything the election/coloring/liveness procedures read and mutate.
/// Lives for the whole process; rebuilt fields (`alive_nodes`,
/// `node_colors`, `nodes_to_color`) are cleared at the start of each new
/// epoch rather than replaced, so outstanding references stay valid.
#[derive(Debug)]
pub struct NodeState {
    pub mode: NodeMode,
    pub master_id: Option<NodeId>,
    pub color: Color,
    /// Leader-only: follower liveness deadlines.
    pub alive_nodes: HashMap<NodeId, Timeout>,
    /// Leader-only: authoritative color of every live node, including self.
    pub node_colors: HashMap<NodeId, Color>,
    /// Leader-only: color assignments awaiting a follower's ack.
    pub nodes_to_color: HashMap<NodeId, Color>,
}

impl NodeState {
    pub fn new() -> Self {
        Self {
            mode: NodeMode::Electing,
            master_id: None,
            color: Color::Init,
            alive_nodes: HashMap::new(),
            node_colors: HashMap::new(),
            nodes_to_color: HashMap::new(),
        }
    }

    /// Spec §4.2 step 1 — entered at the top of every election attempt.
    pub fn reset_for_election(&mut self) {
        self.mode = NodeMode::Electing;
        self.master_id = None;
        self.color = Color::Init;
        self.alive_nodes.clear();
        self.node_colors.clear();
        self.nodes_to_color.clear();
    }

    pub fn become_leader(&mut self, self_id: NodeId) {
        self.mode = NodeMode::Leader;
        self.master_id = Some(self_id);
        self.color = Color::Master;
    }

    pub fn become_follower(&mut self, master_id: NodeId) {
        self.mode = NodeMode::Follower;
        self.master_id = Some(master_id);
        self.color = Color::Slave;
    }

    pub fn is_leader(&self) -> bool {
        matches!(self.mode, NodeMode::Leader)
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_leader_bookkeeping() {
        let mut s = NodeState::new();
        s.alive_nodes.insert(NodeId::new(1), Timeout::new(std::time::Duration::from_secs(1)));
        s.node_colors.insert(NodeId::new(1), Color::Green);
        s.become_leader(NodeId::new(0));
        s.reset_for_election();
        assert!(s.alive_nodes.is_empty());
        assert!(s.node_colors.is_empty());
        assert_eq!(s.master_id, None);
        assert_eq!(s.color, Color::Init);
    }

    #[test]
    fn leader_invariant_mode_matches_master_id() {
        let mut s = NodeState::new();
        s.become_leader(NodeId::new(3));
        assert!(s.is_leader());
        assert_eq!(s.master_id, Some(NodeId::new(3)));
    }
}
