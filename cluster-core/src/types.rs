//! Core identity and protocol-level value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node's identity: the index of its address in the statically ordered
/// address list supplied at startup. Bully precedence is a direct
/// consequence of this ordering — the highest id wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NODE-{}", self.0 + 1)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        NodeId(v)
    }
}

impl From<usize> for NodeId {
    fn from(v: usize) -> Self {
        NodeId(v as u32)
    }
}

/// The node's role in the Bully cluster.
///
/// Invariant: `mode == NodeMode::Leader` iff `master_id == Some(self_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    Electing,
    Leader,
    Follower,
}

/// The coloring assigned to a node during a coloring epoch.
///
/// Transitions are monotone within one epoch; a new election resets every
/// node to `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Init,
    Green,
    Red,
    Master,
    Slave,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Init => "init",
            Color::Green => "green",
            Color::Red => "red",
            Color::Master => "master",
            Color::Slave => "slave",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "init" => Some(Color::Init),
            "green" => Some(Color::Green),
            "red" => Some(Color::Red),
            "master" => Some(Color::Master),
            "slave" => Some(Color::Slave),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
