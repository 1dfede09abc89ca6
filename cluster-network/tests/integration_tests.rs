//! End-to-end tests for [`cluster_network::TcpTransport`] over real
//! loopback sockets. Structurally mirrors the teacher's prior TCP
//! integration test file (one scenario per function: basic connection,
//! message exchange, cluster formation, fault tolerance, high volume),
//! rewritten against this crate's `Transport`/`ClusterConfig` instead of
//! the teacher's `NetworkTransport`/`TcpNetwork`.

use cluster_core::{ClusterConfig, Inbox, Message, MessageValue, NodeId, Transport};
use cluster_network::TcpTransport;
use std::time::Duration;

fn addrs(ports: &[u16]) -> Vec<String> {
    ports
        .iter()
        .map(|p| format!("127.0.0.1:{p}"))
        .collect()
}

#[tokio::test]
async fn basic_tcp_connection() {
    let addrs = addrs(&[19001, 19002]);
    let config_a = ClusterConfig::new(NodeId::new(0), addrs.clone());
    let config_b = ClusterConfig::new(NodeId::new(1), addrs);

    let inbox_a = Inbox::new(16);
    let inbox_b = Inbox::new(16);

    let transport_a = TcpTransport::bind(config_a, inbox_a.sender()).await.unwrap();
    let transport_b = TcpTransport::bind(config_b, inbox_b.sender()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(transport_a.is_connected(NodeId::new(1)).await);
    assert!(transport_b.is_connected(NodeId::new(0)).await);
}

#[tokio::test]
async fn tcp_message_exchange() {
    let addrs = addrs(&[19003, 19004]);
    let config_a = ClusterConfig::new(NodeId::new(0), addrs.clone());
    let config_b = ClusterConfig::new(NodeId::new(1), addrs);

    let inbox_a = Inbox::new(16);
    let mut inbox_b = Inbox::new(16);

    let transport_a = TcpTransport::bind(config_a, inbox_a.sender()).await.unwrap();
    let _transport_b = TcpTransport::bind(config_b, inbox_b.sender()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    transport_a
        .send_to(
            NodeId::new(1),
            Message::election(MessageValue::ElectionId(NodeId::new(0)), NodeId::new(0)),
        )
        .await;

    let got = inbox_b.pop(Duration::from_secs(2)).await.expect("message never arrived");
    assert_eq!(got.value, MessageValue::ElectionId(NodeId::new(0)));
    assert_eq!(got.sender_id, NodeId::new(0));
}

#[tokio::test]
async fn tcp_cluster_formation_of_three_nodes() {
    let addrs = addrs(&[19005, 19006, 19007]);
    let mut inboxes = Vec::new();
    let mut transports = Vec::new();

    for i in 0..3u32 {
        let config = ClusterConfig::new(NodeId::new(i), addrs.clone());
        let inbox = Inbox::new(16);
        let sender = inbox.sender();
        inboxes.push(inbox);
        transports.push(TcpTransport::bind(config, sender).await.unwrap());
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    for (i, transport) in transports.iter().enumerate() {
        let connected = transport.get_connected_nodes().await.unwrap();
        assert_eq!(connected.len(), 2, "node {i} did not connect to both peers");
    }
}

#[tokio::test]
async fn tcp_fault_tolerance_survives_a_peer_starting_late() {
    let addrs = addrs(&[19008, 19009]);
    let config_a = ClusterConfig::new(NodeId::new(0), addrs.clone());
    let config_b = ClusterConfig::new(NodeId::new(1), addrs);

    let inbox_a = Inbox::new(16);
    let mut inbox_b = Inbox::new(16);

    // Node A starts first and must keep retrying its dial loop until B
    // comes up.
    let transport_a = TcpTransport::bind(config_a, inbox_a.sender()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!transport_a.is_connected(NodeId::new(1)).await);

    let _transport_b = TcpTransport::bind(config_b, inbox_b.sender()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(transport_a.is_connected(NodeId::new(1)).await);

    transport_a
        .send_to(
            NodeId::new(1),
            Message::heartbeat(MessageValue::HeartbeatRequest, NodeId::new(0)),
        )
        .await;
    let got = inbox_b.pop(Duration::from_secs(2)).await;
    assert!(got.is_some());
}

#[tokio::test]
async fn tcp_high_volume_messages_are_delivered_in_order() {
    let addrs = addrs(&[19010, 19011]);
    let config_a = ClusterConfig::new(NodeId::new(0), addrs.clone());
    let config_b = ClusterConfig::new(NodeId::new(1), addrs);

    let inbox_a = Inbox::new(1024);
    let mut inbox_b = Inbox::new(1024);

    let transport_a = TcpTransport::bind(config_a, inbox_a.sender()).await.unwrap();
    let _transport_b = TcpTransport::bind(config_b, inbox_b.sender()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    const COUNT: u32 = 200;
    for i in 0..COUNT {
        transport_a
            .send_to(
                NodeId::new(1),
                Message::election(MessageValue::ElectionId(NodeId::new(i)), NodeId::new(0)),
            )
            .await;
    }

    let mut received = 0;
    for expected in 0..COUNT {
        let msg = inbox_b
            .pop(Duration::from_secs(2))
            .await
            .unwrap_or_else(|| panic!("message {expected} never arrived"));
        assert_eq!(msg.value, MessageValue::ElectionId(NodeId::new(expected)));
        received += 1;
    }
    assert_eq!(received, COUNT);
}
