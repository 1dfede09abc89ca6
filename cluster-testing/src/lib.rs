//! Harness and in-memory transport for exercising election, coloring,
//! liveness, and the hierarchical store end-to-end within one process.

pub mod harness;
pub mod network;
pub mod scenarios;
pub mod store_chain;

pub use harness::{wait_until, SimulatedCluster};
pub use network::{InMemoryHub, InMemoryTransport};
pub use store_chain::DirectParentClient;
