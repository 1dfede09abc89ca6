//! The upward link to a node's parent in the tree (spec §4.8): a small
//! trait so `Store` can be tested against an in-memory double instead of
//! a real HTTP parent, plus the `reqwest`-based implementation used in
//! production. Grounded in
//! `original_source/ex03/client/src/store/parent_connector.py`'s
//! GET/PUT/DELETE-over-HTTP shape.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::operations::{StoreError, StoreResult};

#[async_trait]
pub trait ParentClient: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Value>;
    async fn put(&self, key: &str, value: Value) -> StoreResult<()>;
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct ValueBody {
    value: Value,
}

/// Talks to a parent node's HTTP surface (spec §6's `/store/{key}`
/// routes).
pub struct HttpParentClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpParentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/store/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl ParentClient for HttpParentClient {
    async fn get(&self, key: &str) -> StoreResult<Value> {
        let resp = self
            .client
            .get(self.url(key))
            .send()
            .await
            .map_err(|e| StoreError::ParentUnreachable(e.to_string()))?;
        match resp.status().as_u16() {
            200 => resp
                .json::<ValueBody>()
                .await
                .map(|body| body.value)
                .map_err(|e| StoreError::ParentUnreachable(e.to_string())),
            404 => Err(StoreError::NotFound),
            status => Err(StoreError::ParentUnreachable(format!(
                "unexpected status {status}"
            ))),
        }
    }

    async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
        let resp = self
            .client
            .put(self.url(key))
            .json(&serde_json::json!({ "value": value, "wait_for_parent": true }))
            .send()
            .await
            .map_err(|e| StoreError::ParentUnreachable(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::ParentUnreachable(format!(
                "unexpected status {}",
                resp.status()
            )))
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let resp = self
            .client
            .delete(self.url(key))
            .query(&[("wait_for_parent", "true")])
            .send()
            .await
            .map_err(|e| StoreError::ParentUnreachable(e.to_string()))?;
        if resp.status().is_success() || resp.status().as_u16() == 404 {
            Ok(())
        } else {
            Err(StoreError::ParentUnreachable(format!(
                "unexpected status {}",
                resp.status()
            )))
        }
    }
}
