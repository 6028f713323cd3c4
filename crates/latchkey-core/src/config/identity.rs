//! Caller identity configuration.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_IDENTITY_HEADER;

/// How the caller id is read from inbound requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Header set by the upstream identity middleware.
    #[serde(default = "default_header")]
    pub header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
        }
    }
}

fn default_header() -> String {
    DEFAULT_IDENTITY_HEADER.to_string()
}
