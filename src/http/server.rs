//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Serve the latest snapshot, liveness and build info

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{snapshot_response, OutputFormat};
use crate::http::snapshot::SnapshotCache;
use crate::lifecycle::BuildInfo;

/// Upper bound on handling one query.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures of the query interface. Both are fatal to the process.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: SnapshotCache,
    pub build_info: Arc<BuildInfo>,
}

/// HTTP server exposing the aggregated configuration.
pub struct HttpServer {
    router: Router,
    path: String,
}

impl HttpServer {
    /// Create a server answering `path` from `snapshot`.
    pub fn new(path: &str, snapshot: SnapshotCache, build_info: BuildInfo) -> Self {
        let state = AppState {
            snapshot,
            build_info: Arc::new(build_info),
        };

        Self {
            router: Self::build_router(path, state),
            path: path.to_string(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(path: &str, state: AppState) -> Router {
        Router::new()
            .route(path, get(config_handler))
            .route("/health", get(health_handler))
            .route("/version", get(version_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Bind the listener on all interfaces.
    pub async fn bind(port: u16) -> Result<TcpListener, ServeError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })
    }

    /// The router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr().map_err(ServeError::Serve)?;
        tracing::info!(
            address = %addr,
            path = %self.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
            .map_err(ServeError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigQuery {
    format: Option<String>,
}

/// Serve the latest snapshot as YAML or JSON.
async fn config_handler(
    State(state): State<AppState>,
    Query(query): Query<ConfigQuery>,
    headers: HeaderMap,
) -> Response {
    let format = OutputFormat::negotiate(&headers, query.format.as_deref());
    let snapshot = state.snapshot.read();
    snapshot_response(&snapshot, format)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn version_handler(State(state): State<AppState>) -> Json<BuildInfo> {
    Json(state.build_info.as_ref().clone())
}
