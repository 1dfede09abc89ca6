//! The Bully leader election procedure (spec §4.2).

use crate::context::ElectionContext;
use crate::notifications::ElectionEvent;
use crate::state::NodeState;
use cluster_core::{Channel, ControlSignal, LoopOutcome, Message, MessageValue, Timeout};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionOutcome {
    BecameLeader,
    AdoptedMaster(cluster_core::NodeId),
}

/// Runs one full election attempt to completion. Returns `Ok` with the
/// outcome, or `Err(ControlSignal::ElectionUnsuccessful)` if this node
/// surrendered and the winner never announced itself (spec §4.2 step 5).
pub async fn run_election(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
) -> LoopOutcome<ElectionOutcome> {
    // Step 1: reset.
    state.reset_for_election();
    ctx.events.publish(ElectionEvent::ElectionStarted);

    // N=1 boundary: there is only one node in the entire cluster, so
    // there is no one to send election(self.id) to and nothing to wait
    // for. Any node holding the max id in a larger cluster still has
    // peers below it that may send election messages it must surrender
    // replies to, so this short-circuit must not fire for it — it goes
    // through steps 2-4 like everyone else (spec §8 scenario 1).
    if ctx.cluster.node_count() == 1 {
        return declare_self_leader(ctx, state).await;
    }

    // Step 2: send election(self.id) to every peer with id > self.id.
    for peer in ctx.cluster.peer_ids_above_self() {
        ctx.transport
            .send_to(
                peer,
                Message::election(MessageValue::ElectionId(ctx.self_id), ctx.self_id),
            )
            .await;
    }

    // Step 3: start the election timeout.
    let mut timeout = Timeout::new(ctx.timings.max_election_duration);
    let mut surrendered = false;

    // Step 4: drain the inbox until the timeout fires.
    while !timeout.timed_out() {
        let wait = timeout.remaining().min(ctx.timings.poll_interval);
        let Some(msg) = ctx.inbox.pop(wait).await else {
            continue;
        };
        if msg.channel != Channel::Election {
            debug!(channel = %msg.channel, "ignoring non-election message during election");
            continue;
        }
        match msg.value {
            MessageValue::Victory => {
                if msg.sender_id.value() > ctx.self_id.value() {
                    info!(leader = %msg.sender_id, "adopting announced victor");
                    state.become_follower(msg.sender_id);
                    ctx.events.publish(ElectionEvent::BecameFollower {
                        master_id: msg.sender_id,
                    });
                    return Ok(ElectionOutcome::AdoptedMaster(msg.sender_id));
                }
                // A victory from an id <= ours is never promoted (spec
                // §4.2 tie-breaking note): ignore.
                warn!(sender = %msg.sender_id, "ignoring victory from non-higher id");
            }
            MessageValue::Surrender => {
                if !surrendered {
                    surrendered = true;
                    timeout.extend(ctx.timings.election_extension);
                    debug!("first surrender received, extending election timeout");
                }
            }
            MessageValue::ElectionId(v) => {
                if v.value() < ctx.self_id.value() {
                    ctx.transport
                        .send_to(
                            msg.sender_id,
                            Message::election(MessageValue::Surrender, ctx.self_id),
                        )
                        .await;
                }
                // v > self.id: no implicit action (§4.2 step 4).
                // v == self.id: treated as a no-op (SPEC_FULL open question).
            }
            _ => {}
        }
    }

    // Step 5: timeout fired.
    if surrendered {
        ctx.events.publish(ElectionEvent::ElectionUnsuccessful);
        Err(ControlSignal::ElectionUnsuccessful)
    } else {
        declare_self_leader(ctx, state).await
    }
}

async fn declare_self_leader(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
) -> LoopOutcome<ElectionOutcome> {
    state.become_leader(ctx.self_id);
    ctx.transport
        .broadcast(Message::election(MessageValue::Victory, ctx.self_id))
        .await;
    info!(id = %ctx.self_id, "declared self leader");
    ctx.events.publish(ElectionEvent::BecameLeader { id: ctx.self_id });
    Ok(ElectionOutcome::BecameLeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::ElectionNotificationBus;
    use crate::timings::ElectionTimings;
    use cluster_core::{ClusterConfig, Inbox, NodeId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingTransport {
        sent: Arc<std::sync::Mutex<Vec<Message>>>,
        sent_count: AtomicUsize,
        peers: Vec<NodeId>,
    }

    #[async_trait::async_trait]
    impl cluster_core::Transport for RecordingTransport {
        async fn send_to(&self, _target: NodeId, message: Message) {
            self.sent_count.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(message);
        }
        fn peers(&self) -> Vec<NodeId> {
            self.peers.clone()
        }
        async fn is_connected(&self, _node_id: NodeId) -> bool {
            true
        }
        async fn get_connected_nodes(&self) -> cluster_core::Result<std::collections::HashSet<NodeId>> {
            Ok(self.peers.iter().copied().collect())
        }
    }

    #[tokio::test]
    async fn single_node_cluster_becomes_leader_immediately() {
        let cluster = ClusterConfig::new(NodeId::new(0), vec!["a".into()]);
        let transport = Arc::new(RecordingTransport {
            sent: Arc::new(std::sync::Mutex::new(vec![])),
            sent_count: AtomicUsize::new(0),
            peers: vec![],
        });
        let mut inbox = Inbox::new(16);
        let timings = ElectionTimings::scaled(50);
        let events = ElectionNotificationBus::new();
        let mut ctx = ElectionContext::new(
            NodeId::new(0),
            &cluster,
            transport,
            &mut inbox,
            &timings,
            &events,
            Some(1),
        );
        let mut state = NodeState::new();
        let outcome = run_election(&mut ctx, &mut state).await.unwrap();
        assert_eq!(outcome, ElectionOutcome::BecameLeader);
        assert!(state.is_leader());
    }

    #[tokio::test]
    async fn lower_id_surrenders_to_higher_candidate() {
        let cluster = ClusterConfig::new(NodeId::new(0), vec!["a".into(), "b".into()]);
        let transport = Arc::new(RecordingTransport {
            sent: Arc::new(std::sync::Mutex::new(vec![])),
            sent_count: AtomicUsize::new(0),
            peers: vec![NodeId::new(1)],
        });
        let mut inbox = Inbox::new(16);
        let timings = ElectionTimings::scaled(50);
        let events = ElectionNotificationBus::new();
        let sender = inbox.sender();
        // Simulate node 1 declaring victory while we wait.
        sender.try_push(Message::election(MessageValue::Victory, NodeId::new(1)));
        let mut ctx = ElectionContext::new(
            NodeId::new(0),
            &cluster,
            transport,
            &mut inbox,
            &timings,
            &events,
            Some(1),
        );
        let mut state = NodeState::new();
        let outcome = run_election(&mut ctx, &mut state).await.unwrap();
        assert_eq!(outcome, ElectionOutcome::AdoptedMaster(NodeId::new(1)));
        assert_eq!(state.master_id, Some(NodeId::new(1)));
    }

    #[tokio::test]
    async fn highest_id_in_a_multi_node_cluster_waits_out_the_timeout() {
        // Node 1 holds the max id in a 2-node cluster: `peer_ids_above_self`
        // is empty for it too, but it must not take the N=1 shortcut — it
        // has a peer below it that can still send it an election message.
        let cluster = ClusterConfig::new(NodeId::new(1), vec!["a".into(), "b".into()]);
        let transport = Arc::new(RecordingTransport {
            sent: Arc::new(std::sync::Mutex::new(vec![])),
            sent_count: AtomicUsize::new(0),
            peers: vec![NodeId::new(0)],
        });
        let mut inbox = Inbox::new(16);
        let timings = ElectionTimings::scaled(50);
        let events = ElectionNotificationBus::new();
        let sender = inbox.sender();
        sender.try_push(Message::election(MessageValue::ElectionId(NodeId::new(0)), NodeId::new(0)));
        let mut ctx = ElectionContext::new(
            NodeId::new(1),
            &cluster,
            transport.clone(),
            &mut inbox,
            &timings,
            &events,
            Some(1),
        );
        let mut state = NodeState::new();
        let outcome = run_election(&mut ctx, &mut state).await.unwrap();
        assert_eq!(outcome, ElectionOutcome::BecameLeader);
        // It must have replied surrender to node 0 rather than skipping
        // straight to a victory broadcast with no prior traffic.
        let sent = transport.sent.lock().unwrap();
        assert!(sent
            .iter()
            .any(|m| m.value == MessageValue::Surrender && m.sender_id == NodeId::new(1)));
    }

    #[tokio::test]
    async fn surrender_without_victory_is_unsuccessful() {
        let cluster = ClusterConfig::new(NodeId::new(0), vec!["a".into(), "b".into()]);
        let transport = Arc::new(RecordingTransport {
            sent: Arc::new(std::sync::Mutex::new(vec![])),
            sent_count: AtomicUsize::new(0),
            peers: vec![NodeId::new(1)],
        });
        let mut inbox = Inbox::new(16);
        let timings = ElectionTimings::scaled(200);
        let events = ElectionNotificationBus::new();
        let sender = inbox.sender();
        sender.try_push(Message::election(MessageValue::Surrender, NodeId::new(1)));
        let mut ctx = ElectionContext::new(
            NodeId::new(0),
            &cluster,
            transport,
            &mut inbox,
            &timings,
            &events,
            Some(1),
        );
        let mut state = NodeState::new();
        let outcome = run_election(&mut ctx, &mut state).await;
        assert_eq!(outcome, Err(ControlSignal::ElectionUnsuccessful));
    }
}
