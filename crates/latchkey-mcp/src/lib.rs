//! # latchkey-mcp
//!
//! MCP (Model Context Protocol) server with an out-of-band user authorization
//! handshake.
//!
//! Tools act on per-user state. A caller with no state yet gets an
//! authorization request instead of tool output; the human user redeems it
//! at a side-channel HTTP callback, after which the caller is registered.
//!
//! ## Architecture
//!
//! ```text
//! Agent runtime
//!       │ POST /mcp  (X-User-ID: alice)
//!       ▼
//! ┌──────────────────────┐
//! │ RequestGate          │  header → CallerId (default "single_user")
//! │ McpServer            │  tools/list, tools/call
//! │  └ SecretTools       │  unregistered → "[AUTH] <token>"
//! └─────────┬────────────┘
//!           │ SecretStore (Arc, RwLock)
//! ┌─────────┴────────────┐
//! │ GET /auth            │  TokenAuthority::verify → register caller
//! └──────────────────────┘
//!       ▲
//!       │ userid + token
//!   Human user
//! ```
//!
//! ## Example Usage
//!
//! ```ignore
//! use latchkey_core::McpConfig;
//! use latchkey_mcp::{McpServer, SecretStore};
//! use latchkey_token::TokenAuthority;
//! use std::sync::Arc;
//!
//! let server = McpServer::new(
//!     McpConfig::default(),
//!     Arc::new(SecretStore::new()),
//!     Arc::new(TokenAuthority::ephemeral()?),
//! );
//! server.run().await?;
//! ```

pub mod callback;
pub mod error;
pub mod http_transport;
pub mod identity;
pub mod protocol;
pub mod secrets;
pub mod server;
pub mod store;
pub mod tools;

// Re-export main types
pub use callback::{AuthCallback, AuthQuery, CallbackOutcome, authorization_url};
pub use error::McpError;
pub use http_transport::{HttpServer, HttpTransportState, create_router};
pub use identity::RequestGate;
pub use protocol::{
    CallToolParams, CallToolResponse, JsonRpcRequest, JsonRpcResponse, ToolContent,
    ToolDefinition,
};
pub use secrets::{SecretTools, ToolOutcome};
pub use server::McpServer;
pub use store::SecretStore;
pub use tools::ToolRegistry;
