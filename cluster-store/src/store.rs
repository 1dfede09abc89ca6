//! The write-through key/value store (spec §4.8): local cache first,
//! then parent propagation either synchronously or via the background
//! queue. Grounded in
//! `original_source/ex03/client/src/store/store_service.py`'s
//! synchronous-vs-background propagation split (`wait_for_response`), with
//! the cache itself taken from `rabia-kvstore/src/store.rs`'s
//! `DashMap`-backed shape.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::notifications::{ChangeNotification, ChangeType, NotificationBus};
use crate::operations::{StoreError, StoreResult};
use crate::parent::ParentClient;
use crate::queue::BackgroundQueue;

/// A write-through, hierarchical key/value store. Every node owns one;
/// the root's has no `parent`.
pub struct Store {
    cache: DashMap<String, Value>,
    parent: Option<Arc<dyn ParentClient>>,
    queue: BackgroundQueue,
    pub notifications: NotificationBus,
}

impl Store {
    pub fn new(parent: Option<Arc<dyn ParentClient>>, queue: BackgroundQueue) -> Self {
        Self {
            cache: DashMap::new(),
            parent,
            queue,
            notifications: NotificationBus::new(),
        }
    }

    /// Returns the cached value if present; otherwise, for a non-root
    /// node, faults up to the parent and caches a successful result
    /// (spec §4.8, "GET checks the local cache first; on a miss, a
    /// non-root node faults the request to its parent and caches the
    /// result on success").
    pub async fn get(&self, key: &str) -> StoreResult<Value> {
        if let Some(value) = self.cache.get(key) {
            return Ok(value.clone());
        }
        let Some(parent) = &self.parent else {
            return Err(StoreError::NotFound);
        };
        let value = parent.get(key).await?;
        self.cache.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Always applies the write locally first. If this is not the root,
    /// propagates upward either synchronously (surfacing a 503 on
    /// failure) or via the background queue, per `wait_for_parent`
    /// (spec §4.8/§7.3).
    pub async fn put(&self, key: &str, value: Value, wait_for_parent: bool) -> StoreResult<()> {
        let change_type = if self.cache.contains_key(key) {
            ChangeType::Updated
        } else {
            ChangeType::Created
        };
        self.cache.insert(key.to_string(), value.clone());
        self.notifications.publish(ChangeNotification {
            key: key.to_string(),
            change_type,
            new_value: Some(value.clone()),
        });

        let Some(parent) = self.parent.clone() else {
            return Ok(());
        };

        if wait_for_parent {
            parent.put(key, value).await
        } else {
            let key = key.to_string();
            self.queue.enqueue(async move {
                if let Err(err) = parent.put(&key, value).await {
                    warn!(key, %err, "background propagation of put to parent failed");
                }
            });
            Ok(())
        }
    }

    /// Always removes the key locally first, regardless of whether it
    /// was present (spec §4.8). Propagation mirrors `put`.
    pub async fn delete(&self, key: &str, wait_for_parent: bool) -> StoreResult<()> {
        self.cache.remove(key);
        self.notifications.publish(ChangeNotification {
            key: key.to_string(),
            change_type: ChangeType::Deleted,
            new_value: None,
        });

        let Some(parent) = self.parent.clone() else {
            return Ok(());
        };

        if wait_for_parent {
            parent.delete(key).await
        } else {
            let key = key.to_string();
            self.queue.enqueue(async move {
                if let Err(err) = parent.delete(&key).await {
                    warn!(key, %err, "background propagation of delete to parent failed");
                }
            });
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// A snapshot of every locally cached entry (spec §6, `GET /store`).
    /// Only reflects this node's cache — it does not walk up the tree.
    pub fn entries(&self) -> std::collections::HashMap<String, Value> {
        self.cache
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeParent {
        data: Mutex<std::collections::HashMap<String, Value>>,
        put_calls: AtomicUsize,
        fail_next_put: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ParentClient for FakeParent {
        async fn get(&self, key: &str) -> StoreResult<Value> {
            self.data
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or(StoreError::NotFound)
        }

        async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
            self.put_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_next_put.swap(false, Ordering::SeqCst) {
                return Err(StoreError::ParentUnreachable("simulated".into()));
            }
            self.data.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> StoreResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn root_store_has_no_parent_and_404s_on_miss() {
        let (queue, _w) = BackgroundQueue::spawn();
        let store = Store::new(None, queue);
        assert_eq!(store.get("missing").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn get_caches_value_fetched_from_parent() {
        let (queue, _w) = BackgroundQueue::spawn();
        let parent = Arc::new(FakeParent::default());
        parent
            .data
            .lock()
            .unwrap()
            .insert("k".into(), serde_json::json!(42));
        let store = Store::new(Some(parent.clone()), queue);

        let value = store.get("k").await.unwrap();
        assert_eq!(value, serde_json::json!(42));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_applies_locally_before_propagating() {
        let (queue, _w) = BackgroundQueue::spawn();
        let parent = Arc::new(FakeParent::default());
        let store = Store::new(Some(parent.clone()), queue);

        store.put("k", serde_json::json!(1), true).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), serde_json::json!(1));
    }

    #[tokio::test]
    async fn synchronous_put_surfaces_parent_failure() {
        let (queue, _w) = BackgroundQueue::spawn();
        let parent = Arc::new(FakeParent::default());
        parent.fail_next_put.store(true, Ordering::SeqCst);
        let store = Store::new(Some(parent.clone()), queue);

        let result = store.put("k", serde_json::json!(1), true).await;
        assert!(matches!(result, Err(StoreError::ParentUnreachable(_))));
        // the local write still happened even though propagation failed
        assert_eq!(store.get("k").await.unwrap(), serde_json::json!(1));
    }

    #[tokio::test]
    async fn asynchronous_put_never_surfaces_parent_failure() {
        let (queue, _w) = BackgroundQueue::spawn();
        let parent = Arc::new(FakeParent::default());
        parent.fail_next_put.store(true, Ordering::SeqCst);
        let store = Store::new(Some(parent.clone()), queue);

        let result = store.put("k", serde_json::json!(1), false).await;
        assert!(result.is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(parent.put_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_removes_locally_even_without_parent() {
        let (queue, _w) = BackgroundQueue::spawn();
        let store = Store::new(None, queue);
        store.put("k", serde_json::json!(1), true).await.unwrap();
        store.delete("k", true).await.unwrap();
        assert_eq!(store.get("k").await, Err(StoreError::NotFound));
    }
}
