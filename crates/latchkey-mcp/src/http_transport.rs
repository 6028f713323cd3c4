//! HTTP transport for MCP server.
//!
//! Serves three routes:
//!
//! - `POST {mcp_path}`: JSON-RPC, behind the [`RequestGate`] so every call
//!   carries a [`CallerId`]
//! - `GET {auth_path}`: the authorization callback
//! - `GET /health`: liveness
//!
//! Requests are handled concurrently; the only shared mutable state is the
//! secret store.

use crate::callback::{AuthCallback, handle_auth};
use crate::error::McpError;
use crate::identity::{RequestGate, resolve_caller};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::server::McpServer;
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{FromRef, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use latchkey_core::CallerId;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// HTTP transport handler state.
#[derive(Debug)]
pub struct HttpTransportState {
    server: Arc<McpServer>,
    callback: AuthCallback,
    gate: RequestGate,
}

impl HttpTransportState {
    /// Create a new HTTP transport state.
    ///
    /// Fails if the configured identity header is not a valid header name.
    pub fn new(server: Arc<McpServer>) -> Result<Self, McpError> {
        let gate = RequestGate::new(&server.identity().header)?;
        let callback = AuthCallback::new(server.store().clone(), server.authority().clone());
        Ok(Self {
            server,
            callback,
            gate,
        })
    }
}

impl FromRef<Arc<HttpTransportState>> for AuthCallback {
    fn from_ref(state: &Arc<HttpTransportState>) -> Self {
        state.callback.clone()
    }
}

/// Create the HTTP router for MCP.
pub fn create_router(state: Arc<HttpTransportState>) -> Router {
    let mcp_path = state.server.config().mcp_path.clone();
    let auth_path = state.server.config().auth_path.clone();

    let mcp = Router::new()
        .route(&mcp_path, post(handle_mcp_post))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            resolve_caller,
        ));

    Router::new()
        .merge(mcp)
        .route(&auth_path, get(handle_auth))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle POST requests to the MCP endpoint (JSON-RPC over HTTP).
async fn handle_mcp_post(
    State(state): State<Arc<HttpTransportState>>,
    Extension(caller): Extension<CallerId>,
    body: Bytes,
) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected malformed JSON-RPC body");
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                )),
            )
                .into_response();
        }
    };

    if request.is_notification() {
        state.server.handle_notification(&request);
        return StatusCode::ACCEPTED.into_response();
    }

    let response = state.server.handle_request(request, &caller).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// Handle health check requests.
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "latchkey",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// HTTP server for MCP transport.
pub struct HttpServer {
    addr: String,
    state: Arc<HttpTransportState>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: impl Into<String>, state: Arc<HttpTransportState>) -> Self {
        Self {
            addr: addr.into(),
            state,
        }
    }

    /// Run the HTTP server until Ctrl-C.
    pub async fn run(self) -> Result<(), McpError> {
        let app = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| McpError::StartupFailed(format!("Failed to bind to {}: {}", self.addr, e)))?;

        tracing::info!(addr = %self.addr, "MCP HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("MCP HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
