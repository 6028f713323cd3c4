//! Configuration types for Latchkey.
//!
//! Configuration is loaded from a single YAML file (`latchkey.yaml` by
//! default). Every section and field has a default, so an empty or missing
//! file yields a working single-process setup.
//!
//! ```yaml
//! mcp:
//!   transport: http
//!   host: 0.0.0.0
//!   port: 30000
//!   auth_path: /auth
//! token:
//!   secret_key_env: LATCHKEY_SECRET_KEY
//!   secret_key_file: keys/secret.key
//! identity:
//!   header: x-user-id
//! ```

pub mod identity;
pub mod mcp;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use identity::IdentityConfig;
pub use mcp::{McpConfig, Transport};
pub use token::TokenConfig;

/// Complete Latchkey configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatchkeyConfig {
    /// MCP server settings.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Token secret key settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Caller identity extraction.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl LatchkeyConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document is the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve relative paths against the file's
    /// directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(key_file) = &config.token.secret_key_file {
            if key_file.is_relative() {
                config.token.secret_key_file = Some(base_dir.join(key_file));
            }
        }

        Ok(config)
    }
}
