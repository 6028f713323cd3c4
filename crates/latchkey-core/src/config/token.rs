//! Authorization token configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the process-wide token secret comes from.
///
/// When neither source yields a key the server generates an ephemeral one, so
/// outstanding tokens stop verifying after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Environment variable containing the secret key (hex-encoded).
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: Option<String>,

    /// Path to a file containing the secret key (hex-encoded).
    #[serde(default)]
    pub secret_key_file: Option<PathBuf>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_key_env: default_secret_key_env(),
            secret_key_file: None,
        }
    }
}

impl TokenConfig {
    /// Resolve the secret key from environment or file.
    ///
    /// The environment variable wins over the file. Returns `Ok(None)` only
    /// when the variable is unset and no file is configured; a configured
    /// file that cannot be read is an error.
    pub fn resolve_secret_key(&self) -> Result<Option<String>, std::io::Error> {
        // Try environment variable first
        if let Some(env_var) = &self.secret_key_env {
            if let Ok(key) = std::env::var(env_var) {
                let key = key.trim();
                if !key.is_empty() {
                    return Ok(Some(key.to_string()));
                }
            }
        }

        // A configured file must exist
        if let Some(path) = &self.secret_key_file {
            let key = std::fs::read_to_string(path).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("secret key file {}: {}", path.display(), e),
                )
            })?;
            return Ok(Some(key.trim().to_string()));
        }

        Ok(None)
    }
}

fn default_secret_key_env() -> Option<String> {
    Some("LATCHKEY_SECRET_KEY".to_string())
}
