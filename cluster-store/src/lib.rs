//! Hierarchical write-through key/value store.
//!
//! Every node in the cluster owns a [`store::Store`]: a local cache that
//! is always updated first, with a link to the node's parent in the
//! binary tree for cache misses and upward propagation. The root node
//! additionally owns a [`tree::TreePositionService`], which assigns
//! joining nodes their position in the tree, and a [`registry::Registry`]
//! handshake governs how a node claims its slot.

pub mod http;
pub mod notifications;
pub mod operations;
pub mod parent;
pub mod queue;
pub mod registry;
pub mod store;
pub mod tree;

pub use http::{serve, AppState};
pub use notifications::{ChangeNotification, ChangeType, NotificationBus, SubscriptionId};
pub use operations::{StoreError, StoreResult};
pub use parent::{HttpParentClient, ParentClient};
pub use queue::BackgroundQueue;
pub use registry::{register_joining_node, register_root, HttpRegistry, InMemoryRegistry, Registry};
pub use store::Store;
pub use tree::TreePositionService;
