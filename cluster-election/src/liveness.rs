//! The leader and follower steady-state loops (spec §4.1's "Leader loop" /
//! "Follower loop"), and the failure-detection bookkeeping they share
//! (spec §4.4).

use crate::coloring::run_coloring_epoch;
use crate::context::ElectionContext;
use crate::guard::handle_cluster_change;
use crate::notifications::ElectionEvent;
use crate::state::NodeState;
use cluster_core::{Channel, ControlSignal, LoopOutcome, Message, MessageValue, NodeId, Timeout};
use tracing::{info, warn};

/// Removes and returns every follower whose liveness deadline has passed.
fn scan_dead_followers(state: &mut NodeState) -> Vec<NodeId> {
    let dead: Vec<NodeId> = state
        .alive_nodes
        .iter()
        .filter(|(_, t)| t.timed_out())
        .map(|(id, _)| *id)
        .collect();
    for id in &dead {
        state.alive_nodes.remove(id);
        state.node_colors.remove(id);
    }
    dead
}

/// Runs the leader loop until an inbound `election` message forces a
/// cluster reset. Coloring runs once on entry (with fresh liveness
/// discovery) and again, without rediscovery, whenever a follower is
/// found dead.
pub async fn run_leader_loop(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
) -> LoopOutcome<()> {
    run_coloring_epoch(ctx, state, true).await?;

    loop {
        let mut newly_joined = false;
        if let Some(msg) = ctx.inbox.pop(ctx.timings.check_dead_interval).await {
            newly_joined = handle_leader_message(ctx, state, msg).await?;
        }

        if newly_joined {
            info!("new follower sent a heartbeat outside coloring, recoloring");
            run_coloring_epoch(ctx, state, false).await?;
            continue;
        }

        let dead = scan_dead_followers(state);
        if !dead.is_empty() {
            for id in &dead {
                warn!(follower = %id, "follower liveness deadline elapsed");
                ctx.events.publish(ElectionEvent::FollowerDied { id: *id });
            }
            run_coloring_epoch(ctx, state, false).await?;
        }
    }
}

/// Returns whether this message introduced a follower the leader didn't
/// already know about (signals the caller to recolor).
async fn handle_leader_message(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
    msg: Message,
) -> LoopOutcome<bool> {
    match msg.channel {
        Channel::Heartbeat => {
            let mut newly_joined = false;
            if let Some(t) = state.alive_nodes.get_mut(&msg.sender_id) {
                t.reset();
            } else {
                state
                    .alive_nodes
                    .insert(msg.sender_id, Timeout::new(ctx.timings.master_timeout));
                newly_joined = true;
            }
            if matches!(msg.value, MessageValue::HeartbeatRequest) {
                ctx.transport
                    .send_to(
                        msg.sender_id,
                        Message::heartbeat(MessageValue::HeartbeatResponse, ctx.self_id),
                    )
                    .await;
            }
            Ok(newly_joined)
        }
        Channel::Color => {
            if let MessageValue::ColorAssignment(color) = msg.value {
                state.nodes_to_color.remove(&msg.sender_id);
                state.node_colors.insert(msg.sender_id, color);
            }
            Ok(false)
        }
        Channel::Election => handle_cluster_change(ctx, state, &msg, true).await.map(|_| false),
    }
}

/// Runs the follower loop until the master is disconnected or an inbound
/// `election` message forces a cluster reset.
pub async fn run_follower_loop(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
    master_id: NodeId,
) -> LoopOutcome<()> {
    let mut master_deadline = Timeout::new(ctx.timings.master_timeout);
    let mut next_heartbeat = Timeout::new(ctx.timings.heartbeat_interval);

    loop {
        if master_deadline.timed_out() {
            warn!(master = %master_id, "master did not respond in time");
            ctx.events.publish(ElectionEvent::MasterDisconnected { master_id });
            return Err(ControlSignal::MasterDisconnected);
        }

        if next_heartbeat.timed_out() {
            ctx.transport
                .send_to(
                    master_id,
                    Message::heartbeat(MessageValue::HeartbeatRequest, ctx.self_id),
                )
                .await;
            next_heartbeat.reset();
        }

        let wait = master_deadline
            .remaining()
            .min(next_heartbeat.remaining())
            .min(ctx.timings.poll_interval);
        let Some(msg) = ctx.inbox.pop(wait).await else {
            continue;
        };

        if msg.sender_id == master_id {
            master_deadline.reset();
        }

        match msg.channel {
            Channel::Heartbeat => {
                if matches!(msg.value, MessageValue::HeartbeatRequest) {
                    ctx.transport
                        .send_to(
                            msg.sender_id,
                            Message::heartbeat(MessageValue::HeartbeatResponse, ctx.self_id),
                        )
                        .await;
                }
            }
            Channel::Color => {
                if let MessageValue::ColorAssignment(color) = msg.value {
                    state.color = color;
                    ctx.transport
                        .send_to(
                            msg.sender_id,
                            Message::color(MessageValue::ColorAssignment(color), ctx.self_id),
                        )
                        .await;
                    info!(color = %color, "color assignment received and acked");
                }
            }
            Channel::Election => {
                handle_cluster_change(ctx, state, &msg, false).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_dead_followers_removes_expired_and_keeps_live() {
        let mut state = NodeState::new();
        state
            .alive_nodes
            .insert(NodeId::new(0), Timeout::new(std::time::Duration::from_millis(1)));
        state
            .alive_nodes
            .insert(NodeId::new(1), Timeout::new(std::time::Duration::from_secs(30)));
        std::thread::sleep(std::time::Duration::from_millis(10));
        let dead = scan_dead_followers(&mut state);
        assert_eq!(dead, vec![NodeId::new(0)]);
        assert!(state.alive_nodes.contains_key(&NodeId::new(1)));
        assert!(!state.alive_nodes.contains_key(&NodeId::new(0)));
    }
}
