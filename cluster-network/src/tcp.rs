//! TCP transport for the cluster runtime.
//!
//! Every node binds a listener and also dials every peer whose address it
//! knows. Connections are identified by a one-shot handshake that exchanges
//! `NodeId`s; once established, reads are pushed straight into the local
//! node's inbox (silently dropped if full) and writes go through a small
//! per-connection outbound queue so a slow peer never blocks the sender.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut, BufMut};
use cluster_core::{ClusterConfig, ClusterError, InboxSender, Message, NodeId, Result, Transport};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Maximum frame payload, guarding against a corrupt length prefix turning
/// into an unbounded allocation.
const MAX_FRAME_PAYLOAD: usize = 1024 * 1024;

const CONNECT_RETRY_BASE: Duration = Duration::from_millis(200);
const CONNECT_RETRY_MAX: Duration = Duration::from_secs(5);

async fn write_frame(stream: &mut TcpStream, payload: &[u8]) -> Result<()> {
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    stream
        .write_all(&buf)
        .await
        .map_err(|e| ClusterError::network(format!("write failed: {e}")))
}

async fn read_frame(stream: &mut TcpStream) -> Result<Bytes> {
    let len = stream
        .read_u32()
        .await
        .map_err(|e| ClusterError::network(format!("read length failed: {e}")))?;
    if len as usize > MAX_FRAME_PAYLOAD {
        return Err(ClusterError::network(format!("frame too large: {len} bytes")));
    }
    let mut payload = vec![0u8; len as usize];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(|e| ClusterError::network(format!("read payload failed: {e}")))?;
    Ok(Bytes::from(payload))
}

async fn handshake_inbound(stream: &mut TcpStream) -> Result<NodeId> {
    let frame = read_frame(stream).await?;
    let peer_id: NodeId = bincode::deserialize(&frame)
        .map_err(|e| ClusterError::network(format!("bad handshake: {e}")))?;
    Ok(peer_id)
}

async fn handshake_outbound(stream: &mut TcpStream, self_id: NodeId) -> Result<()> {
    let bytes = bincode::serialize(&self_id)
        .map_err(|e| ClusterError::network(format!("handshake encode failed: {e}")))?;
    write_frame(stream, &bytes).await
}

struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
}

/// A live TCP transport bound to one node's address.
pub struct TcpTransport {
    config: ClusterConfig,
    connections: Arc<RwLock<HashMap<NodeId, Connection>>>,
}

impl TcpTransport {
    /// Binds the listener for `config.self_id`, spawns the accept loop, and
    /// kicks off background dial attempts to every other peer. Inbound
    /// application messages are pushed into `inbox`.
    pub async fn bind(config: ClusterConfig, inbox: InboxSender) -> Result<Self> {
        let self_id = config.self_id;
        let bind_addr = config
            .addr_of(self_id)
            .ok_or_else(|| ClusterError::config(format!("no address configured for {self_id}")))?
            .to_string();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ClusterError::network(format!("failed to bind {bind_addr}: {e}")))?;
        info!(%self_id, %bind_addr, "tcp transport bound");

        let connections: Arc<RwLock<HashMap<NodeId, Connection>>> =
            Arc::new(RwLock::new(HashMap::new()));

        tokio::spawn(accept_loop(listener, connections.clone(), inbox.clone()));

        for peer_id in config.all_peer_ids() {
            let Some(addr) = config.addr_of(peer_id).map(str::to_string) else {
                continue;
            };
            tokio::spawn(dial_loop(
                self_id,
                peer_id,
                addr,
                connections.clone(),
                inbox.clone(),
            ));
        }

        Ok(Self { config, connections })
    }
}

async fn accept_loop(
    listener: TcpListener,
    connections: Arc<RwLock<HashMap<NodeId, Connection>>>,
    inbox: InboxSender,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(%addr, "accepted inbound connection");
                tokio::spawn(run_inbound(stream, connections.clone(), inbox.clone()));
            }
            Err(e) => {
                warn!("accept failed: {e}");
                sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn run_inbound(
    mut stream: TcpStream,
    connections: Arc<RwLock<HashMap<NodeId, Connection>>>,
    inbox: InboxSender,
) {
    let peer_id = match handshake_inbound(&mut stream).await {
        Ok(id) => id,
        Err(e) => {
            warn!("inbound handshake failed: {e}");
            return;
        }
    };
    info!(%peer_id, "inbound connection established");
    run_connection(peer_id, stream, connections, inbox).await;
}

async fn dial_loop(
    self_id: NodeId,
    peer_id: NodeId,
    addr: String,
    connections: Arc<RwLock<HashMap<NodeId, Connection>>>,
    inbox: InboxSender,
) {
    let mut delay = CONNECT_RETRY_BASE;
    loop {
        {
            let guard = connections.read().await;
            if guard.contains_key(&peer_id) {
                return;
            }
        }
        match TcpStream::connect(&addr).await {
            Ok(mut stream) => {
                if let Err(e) = handshake_outbound(&mut stream, self_id).await {
                    warn!(%peer_id, "outbound handshake failed: {e}");
                } else {
                    info!(%peer_id, %addr, "outbound connection established");
                    run_connection(peer_id, stream, connections.clone(), inbox.clone()).await;
                }
            }
            Err(e) => {
                debug!(%peer_id, %addr, "connect failed: {e}");
            }
        }
        sleep(delay).await;
        delay = Duration::min(delay * 2, CONNECT_RETRY_MAX);
    }
}

async fn run_connection(
    peer_id: NodeId,
    stream: TcpStream,
    connections: Arc<RwLock<HashMap<NodeId, Connection>>>,
    inbox: InboxSender,
) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    {
        let mut guard = connections.write().await;
        guard.insert(peer_id, Connection { outbound: outbound_tx });
    }

    let stream = Arc::new(Mutex::new(stream));
    let read_stream = stream.clone();
    let reader = tokio::spawn(async move {
        loop {
            let frame = {
                let mut guard = read_stream.lock().await;
                read_frame(&mut guard).await
            };
            match frame {
                Ok(bytes) => match bincode::deserialize::<Message>(&bytes) {
                    Ok(message) => {
                        if !inbox.try_push(message) {
                            debug!(%peer_id, "inbox full, dropping inbound message");
                        }
                    }
                    Err(e) => warn!(%peer_id, "failed to decode message: {e}"),
                },
                Err(e) => {
                    debug!(%peer_id, "connection closed: {e}");
                    break;
                }
            }
        }
    });

    let write_stream = stream.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let Ok(bytes) = bincode::serialize(&message) else {
                continue;
            };
            let mut guard = write_stream.lock().await;
            if write_frame(&mut guard, &bytes).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = reader => {}
        _ = writer => {}
    }

    connections.write().await.remove(&peer_id);
    debug!(%peer_id, "connection handler stopped");
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send_to(&self, target: NodeId, message: Message) {
        let guard = self.connections.read().await;
        if let Some(conn) = guard.get(&target) {
            if conn.outbound.send(message).is_err() {
                debug!(%target, "outbound queue closed");
            }
        } else {
            debug!(%target, "no connection, dropping message");
        }
    }

    fn peers(&self) -> Vec<NodeId> {
        self.config.all_peer_ids().collect()
    }

    async fn is_connected(&self, node_id: NodeId) -> bool {
        self.connections.read().await.contains_key(&node_id)
    }

    async fn get_connected_nodes(&self) -> Result<HashSet<NodeId>> {
        Ok(self.connections.read().await.keys().copied().collect())
    }
}
