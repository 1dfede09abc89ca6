//! Named control-flow signals used to unwind the election, leader and
//! follower loops back to the driver.
//!
//! These are semantic signals, not failures — deliberately not a
//! `std::error::Error` and never threaded through `?` alongside genuine
//! errors from [`crate::error::ClusterError`].

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// The election timed out while this node had surrendered to a higher
    /// id that never announced victory. The driver sleeps and retries.
    ElectionUnsuccessful,
    /// An inbound `election` message observed during the leader or follower
    /// loop implies the cluster must re-form. The driver re-enters mode
    /// selection from the top.
    ClusterReset,
    /// The follower's master timeout elapsed. The driver clears `master_id`
    /// and triggers a new election.
    MasterDisconnected,
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ControlSignal::ElectionUnsuccessful => {
                "election unsuccessful, will retry"
            }
            ControlSignal::ClusterReset => "cluster reset due to election activity",
            ControlSignal::MasterDisconnected => "master did not respond, starting an election",
        };
        write!(f, "{msg}")
    }
}

/// The outcome of a loop iteration that can either keep running or unwind
/// via a [`ControlSignal`].
pub type LoopOutcome<T> = Result<T, ControlSignal>;
