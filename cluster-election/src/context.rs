//! The bundle of collaborators every election/coloring/liveness procedure
//! needs: cluster addressing, the transport, this node's inbox, timing
//! parameters, a seedable RNG for the coloring shuffle, and the
//! notification bus. Grouped here so driver code in `cluster-engine`
//! doesn't have to thread six parameters through every call.

use crate::notifications::ElectionNotificationBus;
use crate::timings::ElectionTimings;
use cluster_core::{ClusterConfig, Inbox, NodeId, Transport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

pub struct ElectionContext<'a> {
    pub self_id: NodeId,
    pub cluster: &'a ClusterConfig,
    pub transport: Arc<dyn Transport>,
    pub inbox: &'a mut Inbox,
    pub timings: &'a ElectionTimings,
    pub events: &'a ElectionNotificationBus,
    pub rng: StdRng,
}

impl<'a> ElectionContext<'a> {
    pub fn new(
        self_id: NodeId,
        cluster: &'a ClusterConfig,
        transport: Arc<dyn Transport>,
        inbox: &'a mut Inbox,
        timings: &'a ElectionTimings,
        events: &'a ElectionNotificationBus,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            self_id,
            cluster,
            transport,
            inbox,
            timings,
            events,
            rng,
        }
    }
}
