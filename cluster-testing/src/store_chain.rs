//! An in-process [`ParentClient`] that forwards straight into another
//! node's [`Store`], for building multi-level trees in tests without
//! standing up HTTP servers. New; the real parent link goes over HTTP
//! (`cluster_store::parent::HttpParentClient`), this is its in-memory
//! analog for exercising spec §8 scenario 5 end-to-end.

use async_trait::async_trait;
use cluster_store::{ParentClient, Store, StoreError, StoreResult};
use serde_json::Value;
use std::sync::Arc;

pub struct DirectParentClient {
    parent: Arc<Store>,
}

impl DirectParentClient {
    pub fn new(parent: Arc<Store>) -> Self {
        Self { parent }
    }
}

#[async_trait]
impl ParentClient for DirectParentClient {
    async fn get(&self, key: &str) -> StoreResult<Value> {
        self.parent.get(key).await
    }

    async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
        self.parent.put(key, value, true).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match self.parent.delete(key, true).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Ok(()),
            Err(other) => Err(other),
        }
    }
}
