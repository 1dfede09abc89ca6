//! # cluster-network
//!
//! TCP implementation of the [`cluster_core::Transport`] trait: a listener
//! plus background dial loops that keep every configured peer connection
//! alive, framed with a plain 4-byte length prefix and `bincode`.

pub mod tcp;

pub use tcp::TcpTransport;
