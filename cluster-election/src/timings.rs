//! Timing parameters for the election, coloring and liveness state machines.
//!
//! All of these are wall-clock durations (spec §4.4: "absolute, not step
//! counts"). Defaults are picked inside the ranges the spec gives for each
//! constant; every field is overridable so tests can shrink the whole
//! protocol to millisecond scale.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ElectionTimings {
    /// §4.2 step 3 — how long a candidate waits for a victory/surrender
    /// before deciding the election itself.
    pub max_election_duration: Duration,
    /// §4.2 step 4 — added to the election timeout the first time this node
    /// surrenders, to give the eventual winner room to announce.
    pub election_extension: Duration,
    /// §4.3 step 1 — how long the leader waits while discovering live
    /// followers before finalizing `alive_nodes`.
    pub node_alive_timeout: Duration,
    /// §4.3 step 4 — how long the leader waits for every follower to ack
    /// its color assignment.
    pub max_color_assignment_duration: Duration,
    /// §4.4 — cadence at which a follower pings its master.
    pub heartbeat_interval: Duration,
    /// §4.4 — how long a follower waits without hearing from its master
    /// before declaring it disconnected.
    pub master_timeout: Duration,
    /// §4.4 — gates how often the leader scans `alive_nodes` for expired
    /// deadlines; defaults to half of `node_alive_timeout`.
    pub check_dead_interval: Duration,
    /// §4.1 — how long the driver sleeps after an unsuccessful election
    /// before retrying.
    pub election_unsuccessful_sleep: Duration,
    /// Inbox poll granularity used while a loop is also watching one or
    /// more wall-clock deadlines that aren't themselves `inbox.pop`.
    pub poll_interval: Duration,
}

impl Default for ElectionTimings {
    fn default() -> Self {
        Self {
            max_election_duration: Duration::from_secs(12),
            election_extension: Duration::from_secs(5),
            node_alive_timeout: Duration::from_secs(5),
            max_color_assignment_duration: Duration::from_secs(8),
            heartbeat_interval: Duration::from_secs(5),
            master_timeout: Duration::from_secs(10),
            check_dead_interval: Duration::from_secs(2),
            election_unsuccessful_sleep: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl ElectionTimings {
    /// Shrinks every duration by `factor` (e.g. 20 for fast unit tests),
    /// keeping their relative proportions intact.
    pub fn scaled(factor: u32) -> Self {
        let base = Self::default();
        let div = |d: Duration| d / factor;
        Self {
            max_election_duration: div(base.max_election_duration),
            election_extension: div(base.election_extension),
            node_alive_timeout: div(base.node_alive_timeout),
            max_color_assignment_duration: div(base.max_color_assignment_duration),
            heartbeat_interval: div(base.heartbeat_interval),
            master_timeout: div(base.master_timeout),
            check_dead_interval: div(base.check_dead_interval),
            election_unsuccessful_sleep: div(base.election_unsuccessful_sleep),
            poll_interval: div(base.poll_interval).max(Duration::from_millis(1)),
        }
    }
}
