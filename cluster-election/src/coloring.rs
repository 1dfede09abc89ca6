//! The leader's red/green coloring protocol (spec §4.3).

use crate::context::ElectionContext;
use crate::guard::handle_cluster_change;
use crate::notifications::ElectionEvent;
use crate::state::NodeState;
use cluster_core::{Channel, Color, ControlSignal, LoopOutcome, Message, MessageValue, Timeout};
use rand::seq::SliceRandom;
use tracing::{debug, info};

/// Broadcasts `heartbeat/request` and drains the inbox for up to
/// `node_alive_timeout`, collecting every sender of any heartbeat message
/// into `alive_nodes`. Exits early once every peer has been heard from.
pub async fn discover_alive_followers(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
) -> LoopOutcome<()> {
    state.alive_nodes.clear();
    ctx.transport
        .broadcast(Message::heartbeat(MessageValue::HeartbeatRequest, ctx.self_id))
        .await;

    let total_followers = ctx.cluster.node_count().saturating_sub(1);
    let mut timeout = Timeout::new(ctx.timings.node_alive_timeout);
    while !timeout.timed_out() && state.alive_nodes.len() < total_followers {
        let wait = timeout.remaining().min(ctx.timings.poll_interval);
        let Some(msg) = ctx.inbox.pop(wait).await else {
            continue;
        };
        match msg.channel {
            Channel::Heartbeat => {
                state
                    .alive_nodes
                    .insert(msg.sender_id, Timeout::new(ctx.timings.master_timeout));
                if matches!(msg.value, MessageValue::HeartbeatRequest) {
                    ctx.transport
                        .send_to(
                            msg.sender_id,
                            Message::heartbeat(MessageValue::HeartbeatResponse, ctx.self_id),
                        )
                        .await;
                }
            }
            Channel::Election => {
                handle_cluster_change(ctx, state, &msg, true).await?;
            }
            Channel::Color => {
                // Stray ack from a prior epoch; ignore.
            }
        }
    }
    debug!(alive = state.alive_nodes.len(), "liveness discovery complete");
    Ok(())
}

/// Assigns colors to every node in `alive_nodes` plus the leader itself.
/// `g = ceil(k/3) - 1` where `k = |alive| + 1`, clamped at 0 (SPEC_FULL
/// open question resolution). The leader is always green.
pub fn assign_colors(ctx: &mut ElectionContext<'_>, state: &mut NodeState) {
    state.node_colors.clear();
    state.nodes_to_color.clear();

    let k = state.alive_nodes.len() + 1;
    let g = (k + 2) / 3; // ceil(k/3)
    let green_followers = g.saturating_sub(1);

    let mut followers: Vec<_> = state.alive_nodes.keys().copied().collect();
    followers.shuffle(&mut ctx.rng);

    for (i, node) in followers.into_iter().enumerate() {
        let color = if i < green_followers { Color::Green } else { Color::Red };
        state.nodes_to_color.insert(node, color);
        state.node_colors.insert(node, color);
    }
    state.color = Color::Green;
    state.node_colors.insert(ctx.self_id, Color::Green);
}

pub async fn distribute_colors(ctx: &mut ElectionContext<'_>, state: &NodeState) {
    for (node, color) in state.nodes_to_color.iter() {
        ctx.transport
            .send_to(
                *node,
                Message::color(MessageValue::ColorAssignment(*color), ctx.self_id),
            )
            .await;
    }
}

/// Drains the inbox until every pending color assignment is acked or the
/// deadline elapses. A non-empty pending set at the deadline means at
/// least one assignment never landed — raise `ClusterReset` so the caller
/// recolors against fresh liveness.
pub async fn await_color_acks(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
) -> LoopOutcome<()> {
    let mut timeout = Timeout::new(ctx.timings.max_color_assignment_duration);
    while !state.nodes_to_color.is_empty() && !timeout.timed_out() {
        let wait = timeout.remaining().min(ctx.timings.poll_interval);
        let Some(msg) = ctx.inbox.pop(wait).await else {
            continue;
        };
        match msg.channel {
            Channel::Color => {
                if state.alive_nodes.contains_key(&msg.sender_id) {
                    state.nodes_to_color.remove(&msg.sender_id);
                    if let MessageValue::ColorAssignment(color) = msg.value {
                        state.node_colors.insert(msg.sender_id, color);
                    }
                }
            }
            Channel::Heartbeat => {
                if matches!(msg.value, MessageValue::HeartbeatRequest) {
                    ctx.transport
                        .send_to(
                            msg.sender_id,
                            Message::heartbeat(MessageValue::HeartbeatResponse, ctx.self_id),
                        )
                        .await;
                }
                if let Some(t) = state.alive_nodes.get_mut(&msg.sender_id) {
                    t.reset();
                }
            }
            Channel::Election => {
                handle_cluster_change(ctx, state, &msg, true).await?;
            }
        }
    }

    if state.nodes_to_color.is_empty() {
        Ok(())
    } else {
        Err(ControlSignal::ClusterReset)
    }
}

/// Runs discovery (if `rediscover`), assignment and distribution, then
/// waits for acks. This is the entry point the leader loop calls once per
/// epoch and again whenever a follower dies.
pub async fn run_coloring_epoch(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
    rediscover: bool,
) -> LoopOutcome<()> {
    if rediscover {
        discover_alive_followers(ctx, state).await?;
    }
    assign_colors(ctx, state);
    distribute_colors(ctx, state).await;
    await_color_acks(ctx, state).await?;
    info!(
        greens = state.node_colors.values().filter(|c| **c == Color::Green).count(),
        reds = state.node_colors.values().filter(|c| **c == Color::Red).count(),
        "coloring epoch complete"
    );
    ctx.events.publish(ElectionEvent::ColoringComplete {
        colors: state.node_colors.iter().map(|(k, v)| (*k, *v)).collect(),
    });
    Ok(())
}
