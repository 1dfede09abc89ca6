//! The wire-level message envelope shared by the election, coloring and
//! heartbeat channels.

use crate::types::{Color, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The logical channel a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Election,
    Heartbeat,
    Color,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Election => "election",
            Channel::Heartbeat => "heartbeat",
            Channel::Color => "color",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel-specific payloads. `election` carries either a candidate id,
/// `Victory`, or `Surrender`; `heartbeat` carries `Request`/`Response`;
/// `color` carries an assignment or a follower's echoed-back color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageValue {
    ElectionId(NodeId),
    Victory,
    Surrender,
    HeartbeatRequest,
    HeartbeatResponse,
    ColorAssignment(Color),
}

/// An immutable `(channel, value, sender_id)` triple. Created on transport
/// receipt, consumed exactly once by the driver, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub channel: Channel,
    pub value: MessageValue,
    pub sender_id: NodeId,
}

impl Message {
    pub fn new(channel: Channel, value: MessageValue, sender_id: NodeId) -> Self {
        Self {
            channel,
            value,
            sender_id,
        }
    }

    pub fn election(value: MessageValue, sender_id: NodeId) -> Self {
        Self::new(Channel::Election, value, sender_id)
    }

    pub fn heartbeat(value: MessageValue, sender_id: NodeId) -> Self {
        Self::new(Channel::Heartbeat, value, sender_id)
    }

    pub fn color(value: MessageValue, sender_id: NodeId) -> Self {
        Self::new(Channel::Color, value, sender_id)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message(channel={}, value={:?}, sender_id={})",
            self.channel, self.value, self.sender_id
        )
    }
}
