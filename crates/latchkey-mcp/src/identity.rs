//! Request gate: attaches the caller identity to every MCP request.
//!
//! The identity itself is established upstream (a proxy or auth middleware
//! sets a header). This layer only reads it and never rejects a request; a
//! request without the header is served as the single user.

use crate::error::McpError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use latchkey_core::CallerId;

/// Reads the caller id from a configured header.
#[derive(Debug, Clone)]
pub struct RequestGate {
    header: HeaderName,
}

impl RequestGate {
    /// Create a gate reading `header` (case-insensitive).
    pub fn new(header: &str) -> Result<Self, McpError> {
        let header = HeaderName::from_bytes(header.trim().to_ascii_lowercase().as_bytes())
            .map_err(|e| McpError::InvalidConfig(format!("identity header '{header}': {e}")))?;
        Ok(Self { header })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Resolve the caller from request headers.
    pub fn caller_from_headers(&self, headers: &HeaderMap) -> CallerId {
        caller_from_headers(headers, &self.header)
    }
}

/// Extract the caller id from `header`, falling back to the single user when
/// the header is absent, blank or not valid UTF-8.
pub fn caller_from_headers(headers: &HeaderMap, header: &HeaderName) -> CallerId {
    let value = headers.get(header).and_then(|h| h.to_str().ok());
    CallerId::resolve(value)
}

/// Axum middleware inserting the resolved [`CallerId`] into request
/// extensions.
pub async fn resolve_caller(
    State(gate): State<RequestGate>,
    mut req: Request,
    next: Next,
) -> Response {
    let caller = gate.caller_from_headers(req.headers());
    tracing::trace!(caller = %caller, "Resolved caller identity");
    req.extensions_mut().insert(caller);
    next.run(req).await
}
