//! MCP server implementation.
//!
//! This module provides the main MCP server that handles tool discovery
//! and execution for the calling user.

use crate::error::McpError;
use crate::http_transport::{HttpServer, HttpTransportState};
use crate::protocol::*;
use crate::secrets::{SecretTools, ToolOutcome};
use crate::store::SecretStore;
use crate::tools::ToolRegistry;
use latchkey_core::{CallerId, IdentityConfig, McpConfig, Transport};
use latchkey_token::TokenAuthority;
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// The MCP server.
#[derive(Debug)]
pub struct McpServer {
    config: McpConfig,
    identity: IdentityConfig,
    tools: ToolRegistry,
    secrets: SecretTools,
    store: Arc<SecretStore>,
    authority: Arc<TokenAuthority>,
}

impl McpServer {
    /// Create a new MCP server over an existing store and token authority.
    pub fn new(
        config: McpConfig,
        store: Arc<SecretStore>,
        authority: Arc<TokenAuthority>,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        for tool in SecretTools::definitions() {
            tools.register(tool);
        }

        Self {
            config,
            identity: IdentityConfig::default(),
            tools,
            secrets: SecretTools::new(store.clone(), authority.clone()),
            store,
            authority,
        }
    }

    /// Set how caller identity is read from HTTP requests.
    pub fn with_identity(mut self, identity: IdentityConfig) -> Self {
        self.identity = identity;
        self
    }

    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }

    pub fn store(&self) -> &Arc<SecretStore> {
        &self.store
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        &self.authority
    }

    /// Start the MCP server on the configured transport.
    pub async fn run(self) -> Result<(), McpError> {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http => self.run_http().await,
        }
    }

    /// Run the server with stdio transport.
    ///
    /// There is no per-request identity on stdio; every call is made as the
    /// single user.
    async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!("Starting MCP server with stdio transport");

        let caller = CallerId::single_user();
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let mut stdout_lock = stdout.lock();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) if request.is_notification() => {
                    self.handle_notification(&request);
                    continue;
                }
                Ok(request) => self.handle_request(request, &caller).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse JSON-RPC message");
                    JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e))
                }
            };

            let response_json = serde_json::to_string(&response)?;
            writeln!(stdout_lock, "{}", response_json)?;
            stdout_lock.flush()?;
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Run the server with HTTP transport.
    async fn run_http(self) -> Result<(), McpError> {
        let addr = self.config.bind_addr();
        tracing::info!(
            addr = %addr,
            mcp_path = %self.config.mcp_path,
            auth_path = %self.config.auth_path,
            "Starting MCP server with HTTP transport"
        );

        let state = HttpTransportState::new(Arc::new(self))?;
        HttpServer::new(addr, Arc::new(state)).run().await
    }

    /// Handle a notification (a request without id). Nothing is returned.
    pub fn handle_notification(&self, request: &JsonRpcRequest) {
        tracing::debug!(method = %request.method, "Notification received");
    }

    /// Handle a JSON-RPC request made on behalf of `caller`.
    pub async fn handle_request(&self, request: JsonRpcRequest, caller: &CallerId) -> JsonRpcResponse {
        let id = request.id.clone();

        if request.jsonrpc != "2.0" {
            let err = McpError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            ));
            return JsonRpcResponse::error(id, err.code(), err.to_string());
        }

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params, caller),
            "shutdown" => self.handle_shutdown(id),
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let server_info = ServerInfo {
            name: "latchkey".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": server_info,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ListToolsResponse {
            tools: self.tools.list().into_iter().cloned().collect(),
        };
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    fn handle_call_tool(
        &self,
        id: Option<Value>,
        params: Option<Value>,
        caller: &CallerId,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        if !self.tools.contains(&params.name) {
            let err = McpError::ToolNotFound { name: params.name };
            return JsonRpcResponse::error(id, err.code(), err.to_string());
        }

        match self.secrets.call(&params.name, &params.arguments, caller) {
            Ok(outcome) => {
                if let ToolOutcome::AuthRequired { .. } = &outcome {
                    tracing::info!(tool = %params.name, caller = %caller, "Tool call awaiting authorization");
                }
                self.call_result_to_response(id, CallToolResponse::text(outcome.into_wire()))
            }
            Err(e) => {
                tracing::debug!(tool = %params.name, caller = %caller, error = %e, "Tool call failed");
                JsonRpcResponse::error(id, e.code(), e.to_string())
            }
        }
    }

    fn call_result_to_response(&self, id: Option<Value>, result: CallToolResponse) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, json!(null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(
            McpConfig::default(),
            Arc::new(SecretStore::new()),
            Arc::new(TokenAuthority::ephemeral().unwrap()),
        )
    }

    fn call(name: &str, arguments: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(
            1,
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
    }

    fn text_of(response: &JsonRpcResponse) -> String {
        let result: CallToolResponse =
            serde_json::from_value(response.result.clone().unwrap()).unwrap();
        assert_eq!(result.is_error, Some(false));
        result.first_text().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_request(JsonRpcRequest::new(1, "initialize", None), &CallerId::single_user())
            .await;

        let result = response.result.unwrap();
        assert!(response.error.is_none());
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "latchkey");
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = server()
            .handle_request(JsonRpcRequest::new(1, "tools/list", None), &CallerId::single_user())
            .await;

        let result: ListToolsResponse = serde_json::from_value(response.result.unwrap()).unwrap();
        let names: Vec<_> = result.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_secret", "set_secret"]);
    }

    #[tokio::test]
    async fn test_get_secret_requires_auth() {
        let server = server();
        let response = server
            .handle_request(call("get_secret", json!({})), &CallerId::new("alice"))
            .await;

        let text = text_of(&response);
        let token = text.strip_prefix("[AUTH] ").unwrap();
        assert!(server.authority().verify("alice", token));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let server = server();
        let alice = CallerId::new("alice");

        let set = server
            .handle_request(call("set_secret", json!({"secret": "hello"})), &alice)
            .await;
        assert_eq!(text_of(&set), "Secret set for user alice");

        let get = server.handle_request(call("get_secret", json!({})), &alice).await;
        assert_eq!(text_of(&get), "hello");
    }

    #[tokio::test]
    async fn test_call_nonexistent_tool() {
        let response = server()
            .handle_request(call("nonexistent", json!({})), &CallerId::single_user())
            .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(error.message, "Tool not found: nonexistent");
    }

    #[tokio::test]
    async fn test_call_missing_params() {
        let response = server()
            .handle_request(JsonRpcRequest::new(1, "tools/call", None), &CallerId::single_user())
            .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_set_secret_missing_argument() {
        let response = server()
            .handle_request(call("set_secret", json!({})), &CallerId::single_user())
            .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_request(JsonRpcRequest::new(9, "resources/list", None), &CallerId::single_user())
            .await;

        assert_eq!(response.id, Some(json!(9)));
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let mut request = JsonRpcRequest::new(1, "ping", None);
        request.jsonrpc = "1.0".to_string();

        let response = server().handle_request(request, &CallerId::single_user()).await;
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }
}
