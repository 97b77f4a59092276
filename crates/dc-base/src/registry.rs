//! Tool registry trait - the fixed catalog of operations the agent may call.

use crate::tools::{ToolDefinition, ToolResult, ToolUse};

/// Human label + icon for rendering a tool invocation. Display-only; the
/// aggregation core never consults this.
#[derive(Debug, Clone, Copy)]
pub struct ToolLabel {
    pub label: &'static str,
    pub icon: &'static str,
}

/// A provider-backed catalog of tools.
///
/// Registries are stateless from the caller's point of view: `execute` must
/// resolve every transport or parsing failure into a normalized `ToolResult`
/// and never panic or return early with an error - the orchestration layer
/// continues the turn with partial data when a tool fails.
pub trait ToolRegistry: Send + Sync {
    /// Unique identifier (e.g. "precisely")
    fn id(&self) -> &'static str;
    /// Display name
    fn name(&self) -> &'static str;
    /// Short description
    fn description(&self) -> &'static str;

    /// Definitions advertised to the model.
    fn tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Execute a tool. Returns None if this registry doesn't own the tool.
    fn execute(&self, tool: &ToolUse) -> Option<ToolResult>;

    /// Display labels for this registry's tools, keyed by tool id.
    fn tool_labels(&self) -> Vec<(&'static str, ToolLabel)> {
        vec![]
    }
}

/// Dispatch a tool use across registries; unknown tools become a normalized
/// failure record so the turn keeps going.
pub fn dispatch_tool(registries: &[&dyn ToolRegistry], tool: &ToolUse) -> ToolResult {
    for registry in registries {
        if let Some(result) = registry.execute(tool) {
            return result;
        }
    }
    ToolResult::failure(tool, format!("Unknown tool '{}'", tool.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoRegistry;

    impl ToolRegistry for EchoRegistry {
        fn id(&self) -> &'static str {
            "echo"
        }
        fn name(&self) -> &'static str {
            "Echo"
        }
        fn description(&self) -> &'static str {
            "test registry"
        }
        fn tool_definitions(&self) -> Vec<ToolDefinition> {
            vec![]
        }
        fn execute(&self, tool: &ToolUse) -> Option<ToolResult> {
            (tool.name == "echo").then(|| ToolResult::ok(tool, tool.input.clone()))
        }
    }

    #[test]
    fn dispatch_routes_to_owner() {
        let tool = ToolUse { id: "t1".to_string(), name: "echo".to_string(), input: json!({"a": 1}) };
        let result = dispatch_tool(&[&EchoRegistry], &tool);
        assert!(!result.is_error);
        assert_eq!(result.output, json!({"a": 1}));
    }

    #[test]
    fn dispatch_unknown_tool_is_normalized_failure() {
        let tool = ToolUse { id: "t1".to_string(), name: "nope".to_string(), input: json!({}) };
        let result = dispatch_tool(&[&EchoRegistry], &tool);
        assert!(result.is_error);
        assert!(result.output["error"].as_str().unwrap().contains("nope"));
    }
}
