//! The cluster-change guard (spec §4.5), invoked on every inbound
//! `election` message observed from inside the leader or follower loop
//! (as opposed to inside `run_election` itself, which has its own
//! handling for the same message shapes).

use crate::context::ElectionContext;
use crate::notifications::ElectionEvent;
use crate::state::NodeState;
use cluster_core::{ControlSignal, LoopOutcome, Message, MessageValue};
use tracing::{info, warn};

/// Returns `Ok(())` if the message required no reaction or was fully
/// handled in place; `Err(ControlSignal::ClusterReset)` if the loop must
/// unwind back to the driver.
pub async fn handle_cluster_change(
    ctx: &mut ElectionContext<'_>,
    state: &mut NodeState,
    msg: &Message,
    is_leader: bool,
) -> LoopOutcome<()> {
    match msg.value {
        MessageValue::Victory => {
            if msg.sender_id.value() > ctx.self_id.value() {
                info!(new_master = %msg.sender_id, "observed higher victory, resetting cluster");
                ctx.events.publish(ElectionEvent::ClusterReset);
                return Err(ControlSignal::ClusterReset);
            }
            warn!(sender = %msg.sender_id, "ignoring victory from non-higher id");
            Ok(())
        }
        MessageValue::ElectionId(v) => {
            if is_leader && v.value() < ctx.self_id.value() {
                ctx.transport
                    .send_to(
                        msg.sender_id,
                        Message::election(MessageValue::Victory, ctx.self_id),
                    )
                    .await;
                if !state.alive_nodes.contains_key(&msg.sender_id) {
                    info!(joiner = %msg.sender_id, "newly joined node must be incorporated, resetting cluster");
                    ctx.events.publish(ElectionEvent::ClusterReset);
                    return Err(ControlSignal::ClusterReset);
                }
            }
            Ok(())
        }
        // Surrender observed here is stale noise from a settled election;
        // other election values are handled inside `run_election` proper.
        _ => Ok(()),
    }
}
