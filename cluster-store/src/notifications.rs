//! Change-notification bus for local store mutations. Kept from
//! `rabia-kvstore/src/notifications.rs`'s broadcast message-bus pattern,
//! generalized from consensus-applied commands to this store's
//! GET/PUT/DELETE operations; the `uuid`-backed `SubscriptionId` is
//! replaced with a plain counter since this system has no other use for
//! `uuid` (see DESIGN.md, "Dropped teacher dependencies").

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub key: String,
    pub change_type: ChangeType,
    pub new_value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct NotificationBus {
    tx: broadcast::Sender<ChangeNotification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, notification: ChangeNotification) {
        let _ = self.tx.send(notification);
    }

    pub fn subscribe(&self) -> (SubscriptionId, broadcast::Receiver<ChangeNotification>) {
        (SubscriptionId::next(), self.tx.subscribe())
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
