//! # cluster-election
//!
//! The Bully leader election state machine, the leader's red/green
//! coloring protocol, and the heartbeat-driven failure detectors that
//! maintain liveness on both sides (spec §4.2–§4.5).
//!
//! ## Key components
//!
//! - [`state::NodeState`] — the mutable state a driver owns across modes
//! - [`election::run_election`] — the candidate procedure
//! - [`coloring::run_coloring_epoch`] — discover/assign/distribute/await
//! - [`liveness::run_leader_loop`] / [`liveness::run_follower_loop`] —
//!   the steady-state loops for each mode
//! - [`guard::handle_cluster_change`] — the shared re-election trigger
//! - [`context::ElectionContext`] — the collaborators every procedure needs
//! - [`notifications::ElectionNotificationBus`] — observability events

pub mod coloring;
pub mod context;
pub mod election;
pub mod guard;
pub mod liveness;
pub mod notifications;
pub mod state;
pub mod timings;

pub use coloring::{assign_colors, await_color_acks, discover_alive_followers, run_coloring_epoch};
pub use context::ElectionContext;
pub use election::{run_election, ElectionOutcome};
pub use guard::handle_cluster_change;
pub use liveness::{run_follower_loop, run_leader_loop};
pub use notifications::{ElectionEvent, ElectionNotificationBus};
pub use state::NodeState;
pub use timings::ElectionTimings;
