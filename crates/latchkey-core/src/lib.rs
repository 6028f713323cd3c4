use serde::{Deserialize, Serialize};
use std::fmt;

// Configuration types shared across all Latchkey crates
pub mod config;

pub use config::{
    ConfigError, IdentityConfig, LatchkeyConfig, McpConfig, TokenConfig, Transport,
};

/// Caller id used when a request carries no identity.
///
/// Lets a single-tenant deployment run without an identity layer: every
/// anonymous request shares this one record.
pub const SINGLE_USER: &str = "single_user";

/// Prefix of a tool result that asks the orchestrator to start the
/// out-of-band authorization flow. Fixed contract with the caller.
pub const AUTH_MARKER: &str = "[AUTH]";

/// Header carrying the caller id unless configured otherwise.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Opaque identifier of the principal a request is made on behalf of.
///
/// Keys every piece of per-user state. Blank or missing identities resolve
/// to [`SINGLE_USER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    /// Wrap an identifier as-is.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The shared single-tenant caller.
    pub fn single_user() -> Self {
        Self(SINGLE_USER.to_string())
    }

    /// Resolve an optional identity value, falling back to [`SINGLE_USER`]
    /// when it is absent or blank.
    pub fn resolve(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::single_user(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_single_user(&self) -> bool {
        self.0 == SINGLE_USER
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CallerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CallerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_present_identity() {
        let caller = CallerId::resolve(Some("alice"));
        assert_eq!(caller.as_str(), "alice");
        assert!(!caller.is_single_user());
    }

    #[test]
    fn test_resolve_missing_identity_falls_back() {
        assert_eq!(CallerId::resolve(None), CallerId::single_user());
        assert_eq!(CallerId::resolve(Some("")), CallerId::single_user());
        assert_eq!(CallerId::resolve(Some("   ")), CallerId::single_user());
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        assert_eq!(CallerId::resolve(Some("  bob ")).as_str(), "bob");
    }

    #[test]
    fn test_serde_is_transparent() {
        let caller = CallerId::new("carol");
        let json = serde_json::to_string(&caller).unwrap();
        assert_eq!(json, "\"carol\"");

        let back: CallerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, caller);
    }
}
