//! Per-user secret tools.
//!
//! `get_secret` is gated on registration: an unregistered caller gets an
//! authorization request instead of a value. `set_secret` is not gated and
//! writes for any caller, registered or not.
//!
//! ## Authorization flow
//!
//! 1. Unregistered caller invokes `get_secret`
//! 2. The tool mints a token and answers `[AUTH] <token>`
//! 3. The orchestrator sends the user through the callback endpoint with
//!    that token
//! 4. The callback registers the caller with an empty secret
//! 5. `get_secret` now returns the stored value

use crate::error::McpError;
use crate::protocol::{ToolAnnotations, ToolDefinition};
use crate::store::SecretStore;
use latchkey_core::{AUTH_MARKER, CallerId};
use latchkey_token::TokenAuthority;
use serde_json::{Value, json};
use std::sync::Arc;

pub const GET_SECRET: &str = "get_secret";
pub const SET_SECRET: &str = "set_secret";

/// Result of a gated tool call before it is put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Normal tool output.
    Value(String),
    /// The caller must complete the out-of-band authorization first.
    AuthRequired { token: String },
}

impl ToolOutcome {
    /// Serialize to the string the orchestrator sees.
    ///
    /// `AuthRequired` becomes `"[AUTH] <token>"`.
    pub fn into_wire(self) -> String {
        match self {
            ToolOutcome::Value(value) => value,
            ToolOutcome::AuthRequired { token } => format!("{AUTH_MARKER} {token}"),
        }
    }

    /// Parse a wire string. Anything starting with the marker is an
    /// authorization request.
    pub fn from_wire(wire: &str) -> Self {
        match wire.strip_prefix(AUTH_MARKER) {
            Some(rest) => ToolOutcome::AuthRequired {
                token: rest.trim_start().to_string(),
            },
            None => ToolOutcome::Value(wire.to_string()),
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, ToolOutcome::AuthRequired { .. })
    }
}

/// Handlers for `get_secret` and `set_secret`.
#[derive(Debug, Clone)]
pub struct SecretTools {
    store: Arc<SecretStore>,
    authority: Arc<TokenAuthority>,
}

impl SecretTools {
    pub fn new(store: Arc<SecretStore>, authority: Arc<TokenAuthority>) -> Self {
        Self { store, authority }
    }

    /// Return the caller's secret, or ask for authorization if the caller
    /// has no record yet.
    pub fn get_secret(&self, caller: &CallerId) -> ToolOutcome {
        match self.store.get(caller) {
            Some(value) => ToolOutcome::Value(value),
            None => {
                tracing::info!(caller = %caller, "Caller not registered, requesting authorization");
                ToolOutcome::AuthRequired {
                    token: self.authority.mint(caller.as_str()),
                }
            }
        }
    }

    /// Store `secret` for the caller, creating the record if needed.
    ///
    /// Not gated on registration, so this also registers the caller.
    pub fn set_secret(&self, caller: &CallerId, secret: impl Into<String>) -> String {
        self.store.set(caller, secret);
        tracing::debug!(caller = %caller, "Secret stored");
        format!("Secret set for user {caller}")
    }

    /// Tool definitions for `tools/list`.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: GET_SECRET.to_string(),
                description: Some(
                    "Retrieves the secret previously set by the current user. \
                     This tool requires no parameters."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(true),
                    idempotent_hint: Some(true),
                }),
            },
            ToolDefinition {
                name: SET_SECRET.to_string(),
                description: Some("Sets a secret value for the current user.".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "secret": {
                            "type": "string",
                            "description": "The string value that the user wishes to store as their secret."
                        }
                    },
                    "required": ["secret"]
                }),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(false),
                    idempotent_hint: Some(true),
                }),
            },
        ]
    }

    /// Dispatch a tool call by name.
    pub fn call(
        &self,
        name: &str,
        arguments: &Value,
        caller: &CallerId,
    ) -> Result<ToolOutcome, McpError> {
        match name {
            GET_SECRET => Ok(self.get_secret(caller)),
            SET_SECRET => {
                let secret = arguments
                    .get("secret")
                    .and_then(Value::as_str)
                    .ok_or_else(|| McpError::InvalidArguments {
                        tool: SET_SECRET.to_string(),
                        reason: "missing string argument 'secret'".to_string(),
                    })?;
                Ok(ToolOutcome::Value(self.set_secret(caller, secret)))
            }
            other => Err(McpError::ToolNotFound {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> SecretTools {
        SecretTools::new(
            Arc::new(SecretStore::new()),
            Arc::new(TokenAuthority::ephemeral().unwrap()),
        )
    }

    #[test]
    fn test_unregistered_get_requests_authorization() {
        let tools = tools();
        let alice = CallerId::new("alice");

        let outcome = tools.get_secret(&alice);
        let ToolOutcome::AuthRequired { token } = &outcome else {
            panic!("expected AuthRequired, got {outcome:?}");
        };
        assert!(tools.authority.verify("alice", token));

        let wire = outcome.into_wire();
        assert!(wire.starts_with("[AUTH] "));
        assert!(wire.len() > "[AUTH] ".len());
    }

    #[test]
    fn test_get_does_not_register() {
        let tools = tools();
        let alice = CallerId::new("alice");

        tools.get_secret(&alice);
        assert!(!tools.store.is_registered(&alice));
    }

    #[test]
    fn test_registered_get_returns_empty_value() {
        let tools = tools();
        let alice = CallerId::new("alice");

        tools.store.register(&alice);
        assert_eq!(tools.get_secret(&alice), ToolOutcome::Value(String::new()));
    }

    #[test]
    fn test_set_then_get() {
        let tools = tools();
        let alice = CallerId::new("alice");

        assert_eq!(tools.set_secret(&alice, "hello"), "Secret set for user alice");
        assert_eq!(tools.get_secret(&alice), ToolOutcome::Value("hello".to_string()));
    }

    /// `set_secret` is deliberately not gated: an unregistered caller can
    /// write, which also registers them.
    #[test]
    fn test_set_secret_does_not_require_registration() {
        let tools = tools();
        let mallory = CallerId::new("mallory");

        assert!(!tools.store.is_registered(&mallory));
        tools.set_secret(&mallory, "written before authorizing");
        assert!(tools.store.is_registered(&mallory));
    }

    #[test]
    fn test_call_dispatch() {
        let tools = tools();
        let alice = CallerId::new("alice");

        let set = tools
            .call(SET_SECRET, &json!({"secret": "s3cret"}), &alice)
            .unwrap();
        assert_eq!(set, ToolOutcome::Value("Secret set for user alice".to_string()));

        let get = tools.call(GET_SECRET, &Value::Null, &alice).unwrap();
        assert_eq!(get, ToolOutcome::Value("s3cret".to_string()));
    }

    #[test]
    fn test_call_rejects_bad_arguments() {
        let tools = tools();
        let alice = CallerId::new("alice");

        let err = tools.call(SET_SECRET, &json!({"secret": 42}), &alice).unwrap_err();
        assert!(matches!(err, McpError::InvalidArguments { .. }));
        assert!(!tools.store.is_registered(&alice));
    }

    #[test]
    fn test_call_unknown_tool() {
        let err = tools()
            .call("delete_secret", &Value::Null, &CallerId::single_user())
            .unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound { name } if name == "delete_secret"));
    }

    #[test]
    fn test_wire_parsing() {
        assert_eq!(
            ToolOutcome::from_wire("[AUTH] abc"),
            ToolOutcome::AuthRequired {
                token: "abc".to_string()
            }
        );
        assert_eq!(
            ToolOutcome::from_wire("plain"),
            ToolOutcome::Value("plain".to_string())
        );
        assert!(ToolOutcome::from_wire("[AUTH]").is_auth_required());
    }
}
