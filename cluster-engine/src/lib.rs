//! # cluster-engine
//!
//! The node driver: the top-level mode loop (spec §4.1) that ties
//! `cluster-election`'s state machines to a concrete transport, plus
//! environment-variable configuration loading and a read-only status
//! mirror for the HTTP layer.
//!
//! ## Key components
//!
//! - [`engine::NodeDriver`] — owns the mode loop
//! - [`config::EngineConfig`] — spec §6 environment resolution
//! - [`status::NodeStatus`] / [`status::StatusWatcher`] — published snapshot

pub mod config;
pub mod engine;
pub mod status;

pub use config::{ConfigError, EngineConfig};
pub use engine::NodeDriver;
pub use status::{NodeStatus, StatusPublisher, StatusWatcher};
