// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod http;
pub mod store;
pub mod telemetry;

pub use config::ServerConfig;
pub use store::{StoreError, TaskStore};
pub use telemetry::RequestMetrics;

pub const CRATE_NAME: &str = "quadra-server";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub metrics: Arc<RequestMetrics>,
    pub request_id_seed: Arc<AtomicU64>,
    pub accepting_requests: Arc<AtomicBool>,
    pub cfg: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self::with_config(store, ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<TaskStore>, cfg: ServerConfig) -> Self {
        Self {
            store,
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            cfg,
        }
    }

    #[must_use]
    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_millis(self.cfg.shutdown_drain_ms)
    }
}

#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/v1/version", get(http::handlers::version_handler))
        .route("/v1/tasks", get(http::handlers::list_tasks_handler))
        .route("/v1/tasks", post(http::handlers::create_task_handler))
        .route("/v1/tasks/:id", patch(http::handlers::update_task_handler))
        .route("/v1/tasks/:id", delete(http::handlers::delete_task_handler))
        .route(
            "/v1/tasks/reorder",
            post(http::handlers::bulk_reorder_handler),
        )
        .layer(from_fn_with_state(
            state.clone(),
            http::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.cfg.max_body_bytes))
        .with_state(state)
}
