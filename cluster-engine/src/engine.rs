//! The node driver: the top-level mode loop of spec §4.1, wiring
//! `cluster-election`'s state machines to a concrete transport and inbox.

use crate::status::{NodeStatus, StatusPublisher, StatusWatcher};
use cluster_core::{ClusterConfig, ControlSignal, Inbox, Transport};
use cluster_election::{
    run_election, run_follower_loop, run_leader_loop, ElectionContext, ElectionNotificationBus,
    ElectionOutcome, ElectionTimings, NodeState,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct NodeDriver {
    self_id: cluster_core::NodeId,
    cluster: ClusterConfig,
    transport: Arc<dyn Transport>,
    inbox: Inbox,
    timings: ElectionTimings,
    events: ElectionNotificationBus,
    seed: Option<u64>,
    state: NodeState,
    status: StatusPublisher,
}

impl NodeDriver {
    pub fn new(
        cluster: ClusterConfig,
        transport: Arc<dyn Transport>,
        inbox: Inbox,
        timings: ElectionTimings,
    ) -> (Self, StatusWatcher) {
        let (status, watcher) = StatusPublisher::new();
        let self_id = cluster.self_id;
        let driver = Self {
            self_id,
            cluster,
            transport,
            inbox,
            timings,
            events: ElectionNotificationBus::new(),
            seed: None,
            state: NodeState::new(),
            status,
        };
        (driver, watcher)
    }

    /// Pins the coloring shuffle's RNG seed — used by tests that need
    /// deterministic color assignment (SPEC_FULL §9, "Randomness in
    /// coloring").
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn events(&self) -> &ElectionNotificationBus {
        &self.events
    }

    fn publish_status(&self) {
        self.status.publish(NodeStatus {
            mode: self.state.mode,
            master_id: self.state.master_id,
            color: self.state.color,
            node_colors: self.state.node_colors.clone(),
        });
    }

    /// Runs the outer loop forever (spec §4.1). Only returns via a fatal
    /// error from the caller cancelling the enclosing task — the loop
    /// itself has no exit condition.
    pub async fn run(mut self) {
        info!(id = %self.self_id, "starting node driver");
        loop {
            if self.state.master_id.is_none() {
                let outcome = {
                    let mut ctx = ElectionContext::new(
                        self.self_id,
                        &self.cluster,
                        self.transport.clone(),
                        &mut self.inbox,
                        &self.timings,
                        &self.events,
                        self.seed,
                    );
                    run_election(&mut ctx, &mut self.state).await
                };
                match outcome {
                    Ok(ElectionOutcome::BecameLeader) | Ok(ElectionOutcome::AdoptedMaster(_)) => {}
                    Err(ControlSignal::ElectionUnsuccessful) => {
                        self.publish_status();
                        warn!("election unsuccessful, retrying after sleep");
                        tokio::time::sleep(self.timings.election_unsuccessful_sleep).await;
                        continue;
                    }
                    Err(other) => {
                        warn!(?other, "unexpected signal from election, retrying");
                        continue;
                    }
                }
            }

            self.publish_status();

            if self.state.is_leader() {
                let outcome = {
                    let mut ctx = ElectionContext::new(
                        self.self_id,
                        &self.cluster,
                        self.transport.clone(),
                        &mut self.inbox,
                        &self.timings,
                        &self.events,
                        self.seed,
                    );
                    run_leader_loop(&mut ctx, &mut self.state).await
                };
                match outcome {
                    Err(ControlSignal::ClusterReset) => {
                        info!("leader loop reset, re-entering mode selection");
                    }
                    Err(other) => {
                        warn!(?other, "unexpected signal from leader loop");
                    }
                    Ok(()) => unreachable!("leader loop only exits via a control signal"),
                }
            } else {
                let master_id = self.state.master_id.expect("follower branch requires a master");
                let outcome = {
                    let mut ctx = ElectionContext::new(
                        self.self_id,
                        &self.cluster,
                        self.transport.clone(),
                        &mut self.inbox,
                        &self.timings,
                        &self.events,
                        self.seed,
                    );
                    run_follower_loop(&mut ctx, &mut self.state, master_id).await
                };
                match outcome {
                    Err(ControlSignal::MasterDisconnected) | Err(ControlSignal::ClusterReset) => {
                        info!("follower loop exited, clearing master and re-electing");
                        self.state.master_id = None;
                    }
                    Err(other) => {
                        warn!(?other, "unexpected signal from follower loop");
                        self.state.master_id = None;
                    }
                    Ok(()) => unreachable!("follower loop only exits via a control signal"),
                }
            }
        }
    }
}
