//! The six concrete scenarios of spec §8, run against
//! [`crate::harness::SimulatedCluster`]. Rewritten from the teacher's
//! performance-benchmark scenarios (`rabia-testing/src/scenarios.rs`)
//! into end-to-end correctness scenarios for election, coloring, and
//! cluster-change handling — this system's protocol has no throughput
//! dimension to benchmark.

#[cfg(test)]
mod tests {
    use crate::harness::{wait_until, SimulatedCluster};
    use cluster_core::{Color, NodeId, NodeMode};
    use cluster_election::ElectionTimings;
    use std::time::Duration;

    fn fast_timings() -> ElectionTimings {
        ElectionTimings::scaled(40)
    }

    /// Scenario 1: three nodes, ids 0/1/2, clean start. Node 2 (the
    /// highest id) must win; 0 and 1 become followers with master_id=2.
    #[tokio::test]
    async fn three_node_clean_start_elects_highest_id() {
        let cluster = SimulatedCluster::spawn(3, fast_timings());

        let converged = wait_until(&cluster, Duration::from_secs(5), |c| {
            c.status_of(NodeId::new(2)).mode == NodeMode::Leader
                && c.status_of(NodeId::new(0)).master_id == Some(NodeId::new(2))
                && c.status_of(NodeId::new(1)).master_id == Some(NodeId::new(2))
        })
        .await;

        assert!(converged, "cluster did not converge on leader 2");
        cluster.shutdown();
    }

    /// Scenario 2: coloring of three nodes. k=3 alive+leader, g=0 extra
    /// greens, so both followers are red and the leader is green.
    #[tokio::test]
    async fn three_node_coloring_assigns_followers_red() {
        let cluster = SimulatedCluster::spawn(3, fast_timings());

        let converged = wait_until(&cluster, Duration::from_secs(5), |c| {
            let leader = c.status_of(NodeId::new(2));
            leader.mode == NodeMode::Leader
                && leader.node_colors.get(&NodeId::new(0)) == Some(&Color::Red)
                && leader.node_colors.get(&NodeId::new(1)) == Some(&Color::Red)
        })
        .await;

        assert!(converged, "leader never finished a coloring epoch");
        let leader = cluster.status_of(NodeId::new(2));
        assert_eq!(leader.color, Color::Green);
        cluster.shutdown();
    }

    /// Scenario 3: leader crash. After node 2 goes down, nodes 0 and 1
    /// must detect the disconnect and re-elect; node 1 (higher of the
    /// two survivors) wins.
    #[tokio::test]
    async fn leader_crash_triggers_reelection() {
        let cluster = SimulatedCluster::spawn(3, fast_timings());

        let colored = wait_until(&cluster, Duration::from_secs(5), |c| {
            c.status_of(NodeId::new(2)).mode == NodeMode::Leader
                && !c.status_of(NodeId::new(2)).node_colors.is_empty()
        })
        .await;
        assert!(colored, "initial coloring never completed");

        cluster.set_down(NodeId::new(2), true);

        let reelected = wait_until(&cluster, Duration::from_secs(10), |c| {
            c.status_of(NodeId::new(1)).mode == NodeMode::Leader
                && c.status_of(NodeId::new(0)).master_id == Some(NodeId::new(1))
        })
        .await;

        assert!(reelected, "surviving nodes never re-elected node 1");
        cluster.shutdown();
    }

    /// Scenario 4: a lower-id node joins after leader 2 is already
    /// running. The leader's guard must recognize the newcomer, raise a
    /// cluster reset, and re-run coloring over the expanded alive set.
    #[tokio::test]
    async fn lower_id_join_is_absorbed_by_running_leader() {
        let mut cluster = SimulatedCluster::spawn_subset(3, &[1, 2], fast_timings());

        let settled = wait_until(&cluster, Duration::from_secs(5), |c| {
            c.status_of(NodeId::new(2)).mode == NodeMode::Leader
        })
        .await;
        assert!(settled, "leader 2 never took over with node 0 absent");

        cluster.join(NodeId::new(0));

        let absorbed = wait_until(&cluster, Duration::from_secs(10), |c| {
            let leader = c.status_of(NodeId::new(2));
            leader.mode == NodeMode::Leader
                && leader.node_colors.contains_key(&NodeId::new(0))
                && c.status_of(NodeId::new(0)).master_id == Some(NodeId::new(2))
        })
        .await;

        assert!(absorbed, "leader never incorporated the rejoining node 0");
        cluster.shutdown();
    }
}
