//! Tool-call data types shared between the registry, the engine, and the UI.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Normalized result of executing a tool.
///
/// `output` is always a well-formed JSON record: on failure it is
/// `{"error": "..."}` (plus `"no_results": true` when the provider answered
/// successfully with zero matches). Execution functions never propagate
/// errors past this type - a failed tool is data, not a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub tool_name: String,
    pub output: Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(tool: &ToolUse, output: Value) -> Self {
        Self { tool_use_id: tool.id.clone(), tool_name: tool.name.clone(), output, is_error: false }
    }

    pub fn failure(tool: &ToolUse, description: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool.id.clone(),
            tool_name: tool.name.clone(),
            output: json!({ "error": description.into() }),
            is_error: true,
        }
    }

    /// Zero-matches outcome, distinct from a transport failure so the agent
    /// can ask the operator for clarification instead of reporting an outage.
    pub fn no_results(tool: &ToolUse, description: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool.id.clone(),
            tool_name: tool.name.clone(),
            output: json!({ "error": description.into(), "no_results": true }),
            is_error: true,
        }
    }

    /// Serialized form sent back to the model.
    pub fn content(&self) -> String {
        self.output.to_string()
    }
}

/// Scalar parameter types - every tool in the catalog takes a flat object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
}

impl ParamType {
    fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
        }
    }
}

/// A single named tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParam {
    pub name: String,
    pub param_type: ParamType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParam {
    pub fn new(name: &str, param_type: ParamType) -> Self {
        Self { name: name.to_string(), param_type, description: None, required: false }
    }

    pub fn desc(mut self, d: &str) -> Self {
        self.description = Some(d.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A tool definition: identity, prompt description, and input schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool identifier the model calls (e.g. "verify_address")
    pub id: String,
    /// Full description for the model prompt
    pub description: String,
    pub params: Vec<ToolParam>,
}

impl ToolDefinition {
    /// JSON Schema for this tool's input object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut schema = json!({ "type": param.param_type.json_type() });
            if let Some(desc) = &param.description {
                schema["description"] = json!(desc);
            }
            properties.insert(param.name.clone(), schema);
            if param.required {
                required.push(param.name.clone());
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

/// Build the `tools` array for the model API from a catalog.
pub fn build_api_tools(definitions: &[ToolDefinition]) -> Value {
    let tools: Vec<Value> = definitions
        .iter()
        .map(|def| {
            json!({
                "name": def.id,
                "description": def.description,
                "input_schema": def.to_json_schema()
            })
        })
        .collect();
    Value::Array(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tool() -> ToolUse {
        ToolUse { id: "t1".to_string(), name: "calculate_route".to_string(), input: json!({}) }
    }

    #[test]
    fn failure_result_is_normalized_record() {
        let r = ToolResult::failure(&sample_tool(), "HTTP 500: upstream down");
        assert!(r.is_error);
        assert_eq!(r.output["error"], json!("HTTP 500: upstream down"));
        assert!(r.output.get("no_results").is_none());
    }

    #[test]
    fn no_results_is_distinct_from_transport_failure() {
        let r = ToolResult::no_results(&sample_tool(), "No PSAP found");
        assert!(r.is_error);
        assert_eq!(r.output["no_results"], json!(true));
    }

    #[test]
    fn schema_lists_required_params() {
        let def = ToolDefinition {
            id: "geocode_address".to_string(),
            description: "Geocode a US address".to_string(),
            params: vec![
                ToolParam::new("addressLine1", ParamType::String).desc("Street line").required(),
                ToolParam::new("postalCode", ParamType::String).desc("ZIP code"),
            ],
        };
        let schema = def.to_json_schema();
        assert_eq!(schema["required"], json!(["addressLine1"]));
        assert_eq!(schema["properties"]["postalCode"]["type"], json!("string"));
    }

    #[test]
    fn api_tools_array_shape() {
        let defs = vec![ToolDefinition {
            id: "verify_address".to_string(),
            description: "Verify".to_string(),
            params: vec![],
        }];
        let api = build_api_tools(&defs);
        assert_eq!(api[0]["name"], json!("verify_address"));
        assert!(api[0]["input_schema"].is_object());
    }
}
