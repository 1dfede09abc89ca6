//! # cluster-core
//!
//! Core types and traits shared by every crate in this workspace: node
//! identity and coloring, the message envelope, the control-flow signals
//! that drive the election/leader/follower loops, the transport trait, the
//! bounded inbox, and the timeout primitive used throughout.
//!
//! ## Key components
//!
//! - **Types** — [`NodeId`], [`Color`], [`NodeMode`]
//! - **Messages** — [`Message`], [`Channel`], [`MessageValue`]
//! - **Control signals** — [`ControlSignal`], distinct from [`ClusterError`]
//! - **Transport** — the [`Transport`] trait and [`ClusterConfig`]
//! - **Inbox** — the bounded mailbox with `pop(timeout)`
//! - **Timeout** — start-instant-plus-duration timer with `extend`/`reset`

pub mod control;
pub mod error;
pub mod inbox;
pub mod messages;
pub mod network;
pub mod timeout;
pub mod types;

pub use control::{ControlSignal, LoopOutcome};
pub use error::{ClusterError, Result};
pub use inbox::{Inbox, InboxSender, DEFAULT_INBOX_CAPACITY};
pub use messages::{Channel, Message, MessageValue};
pub use network::{ClusterConfig, Transport};
pub use timeout::Timeout;
pub use types::{Color, NodeId, NodeMode};
