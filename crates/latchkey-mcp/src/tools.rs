//! Tool registry for MCP tools.
//!
//! Holds the definitions advertised by `tools/list`. Dispatch lives with the
//! handlers themselves (see [`crate::secrets`]).

use crate::protocol::ToolDefinition;
use std::collections::BTreeMap;

/// Registry of available MCP tools, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tools.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_tool(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: Some(format!("Test tool: {}", name)),
            input_schema: json!({"type": "object"}),
            annotations: None,
        }
    }

    fn names(registry: &ToolRegistry) -> Vec<&str> {
        registry.list().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_register_and_contains() {
        let mut registry = ToolRegistry::new();
        registry.register(create_test_tool("test"));

        assert!(registry.contains("test"));
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn test_list_is_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(create_test_tool("set_secret"));
        registry.register(create_test_tool("get_secret"));

        assert_eq!(names(&registry), vec!["get_secret", "set_secret"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(create_test_tool("test"));
        registry.register(ToolDefinition {
            description: None,
            ..create_test_tool("test")
        });

        let tools = registry.list();
        assert_eq!(tools.len(), 1);
        assert!(tools[0].description.is_none());
    }
}
