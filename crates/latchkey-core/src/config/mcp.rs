//! MCP server configuration.
//!
//! Transport selection, bind address and the path of the authorization
//! callback endpoint.

use serde::{Deserialize, Serialize};

/// Configuration for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Transport type: "stdio" or "http".
    #[serde(default)]
    pub transport: Transport,

    /// HTTP host (only used when transport is HTTP).
    #[serde(default = "default_http_host")]
    pub host: String,

    /// HTTP port (only used when transport is HTTP).
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Path of the JSON-RPC endpoint.
    #[serde(default = "default_mcp_path")]
    pub mcp_path: String,

    /// Path of the authorization callback endpoint.
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
}

/// MCP transport type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Standard input/output transport. Every request is the single user.
    Stdio,
    /// HTTP transport with per-request caller identity.
    #[default]
    Http,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(format!("unknown transport '{other}', use 'stdio' or 'http'")),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_http_host(),
            port: default_http_port(),
            mcp_path: default_mcp_path(),
            auth_path: default_auth_path(),
        }
    }
}

impl McpConfig {
    /// Socket address string the HTTP transport binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if using HTTP transport.
    pub fn is_http(&self) -> bool {
        self.transport == Transport::Http
    }

    /// Check if using stdio transport.
    pub fn is_stdio(&self) -> bool {
        self.transport == Transport::Stdio
    }
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    30000
}

fn default_mcp_path() -> String {
    "/mcp".to_string()
}

fn default_auth_path() -> String {
    "/auth".to_string()
}
