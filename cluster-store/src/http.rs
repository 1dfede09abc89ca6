//! The HTTP surface over a node's [`Store`] (spec §6): `GET/PUT/DELETE
//! /store/{key}`, `GET /store` for a full dump, plus, for the root node
//! only, `GET /nodes/parent/{name}` and `GET /nodes/structure`. Grounded
//! in `spineldb-spineldb/src/server/metrics_server.rs`'s `axum::Router` +
//! `axum::serve` + graceful-shutdown shape, with the route table itself
//! grounded in `original_source/ex03/client/src/store/store_controller.py`
//! and `cluster_controller.py`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::operations::StoreError;
use crate::registry::{InMemoryRegistry, Registry};
use crate::store::Store;
use crate::tree::TreePositionService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub tree: Option<Arc<TreePositionService>>,
    /// Set only on the process holding the registry (the root, in this
    /// deployment). Exposed over HTTP at `/registry/exists` and
    /// `/registry/create` so other processes can reach it through
    /// [`crate::registry::HttpRegistry`] instead of each keeping a
    /// registry of their own.
    pub registry: Option<Arc<InMemoryRegistry>>,
}

#[derive(Deserialize)]
pub struct PutBody {
    pub value: Value,
    #[serde(default = "default_wait_for_parent")]
    pub wait_for_parent: bool,
}

#[derive(Deserialize)]
pub struct WaitForParentQuery {
    #[serde(default = "default_wait_for_parent")]
    pub wait_for_parent: bool,
}

fn default_wait_for_parent() -> bool {
    true
}

#[derive(Serialize)]
struct ValueBody {
    value: Value,
}

#[derive(Serialize)]
struct PutResponse {
    key: String,
    value: Value,
}

#[derive(Serialize)]
struct DeleteResponse {
    key: String,
}

#[derive(Serialize)]
struct ParentPathResponse {
    path: String,
}

#[derive(Serialize)]
struct StructureResponse {
    structure: Vec<Option<String>>,
}

#[derive(Deserialize)]
struct RegistryPathQuery {
    path: String,
}

#[derive(Serialize)]
struct RegistryExistsResponse {
    exists: bool,
}

impl IntoResponse for StoreError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, self.to_string()).into_response()
    }
}

async fn get_key(State(state): State<AppState>, Path(key): Path<String>) -> impl IntoResponse {
    match state.store.get(&key).await {
        Ok(value) => Ok(Json(ValueBody { value })),
        Err(err) => Err(err),
    }
}

async fn get_all(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.entries())
}

async fn put_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<PutBody>,
) -> impl IntoResponse {
    match state
        .store
        .put(&key, body.value.clone(), body.wait_for_parent)
        .await
    {
        Ok(()) => Json(PutResponse {
            key,
            value: body.value,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    axum::extract::Query(query): axum::extract::Query<WaitForParentQuery>,
) -> impl IntoResponse {
    match state.store.delete(&key, query.wait_for_parent).await {
        Ok(()) => Json(DeleteResponse { key }).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn structure(State(state): State<AppState>) -> impl IntoResponse {
    match &state.tree {
        Some(tree) => Json(StructureResponse {
            structure: tree.structure(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn assign_parent(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    match &state.tree {
        Some(tree) => Json(ParentPathResponse {
            path: tree.assign_path(&name),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn registry_exists(
    State(state): State<AppState>,
    axum::extract::Query(query): axum::extract::Query<RegistryPathQuery>,
) -> impl IntoResponse {
    match &state.registry {
        Some(registry) => Json(RegistryExistsResponse {
            exists: registry.exists(&query.path).await,
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn registry_create(
    State(state): State<AppState>,
    axum::extract::Query(query): axum::extract::Query<RegistryPathQuery>,
) -> impl IntoResponse {
    match &state.registry {
        Some(registry) => match registry.create(&query.path).await {
            Ok(()) => StatusCode::OK.into_response(),
            Err(_) => StatusCode::CONFLICT.into_response(),
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/store/:key", get(get_key).put(put_key).delete(delete_key))
        .route("/store", get(get_all))
        .route("/nodes/parent/:name", get(assign_parent))
        .route("/nodes/structure", get(structure))
        .route("/registry/exists", get(registry_exists))
        .route("/registry/create", axum::routing::post(registry_create))
        .with_state(state)
}

/// Mirrors `run_metrics_server`'s bind-then-serve-with-graceful-shutdown
/// shape: binds eagerly so callers learn about a bad port immediately,
/// then serves until the shutdown signal fires.
pub async fn serve(
    state: AppState,
    port: u16,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(port, error = %e, "failed to bind store HTTP server");
            return Err(e);
        }
    };
    info!(%addr, "store HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("store HTTP server shutting down");
        })
        .await
}
