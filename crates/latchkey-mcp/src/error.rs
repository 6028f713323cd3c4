//! Error types for the MCP crate.

use thiserror::Error;

use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, PARSE_ERROR};

/// Errors that can occur in the MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Tool not found.
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// Invalid arguments for tool.
    #[error("invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl McpError {
    /// JSON-RPC error code reported to the client.
    pub fn code(&self) -> i32 {
        match self {
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::ToolNotFound { .. } | McpError::InvalidArguments { .. } => INVALID_PARAMS,
            McpError::SerializationError(_) => PARSE_ERROR,
            McpError::StartupFailed(_) | McpError::InvalidConfig(_) | McpError::IoError(_) => {
                INTERNAL_ERROR
            }
        }
    }
}
