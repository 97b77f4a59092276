//! LLM provider abstraction layer.

pub mod anthropic;

pub use anthropic::AnthropicClient;

use std::sync::mpsc::Sender;

use dc_base::tools::{ToolDefinition, ToolUse};
use dc_base::transcript::{Message, Part, Role, ToolState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events emitted during streaming, in stream order.
#[derive(Debug)]
pub enum StreamEvent {
    /// Text chunk from the response
    Chunk(String),
    /// A tool-use content block opened (input not yet available)
    ToolStart { tool_use_id: String, tool_name: String },
    /// Partial tool input arrived for the open block
    ToolInputDelta { tool_use_id: String },
    /// A tool-use block closed with its complete parsed input
    ToolUse(ToolUse),
    /// Stream completed
    Done { stop_reason: Option<String> },
    /// Error occurred
    Error(String),
}

/// Configuration for an LLM request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ApiMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// Trait for LLM providers
pub trait LlmClient: Send + Sync {
    /// Start a streaming response, delivering events over `tx`.
    fn stream(&self, request: &LlmRequest, tx: &Sender<StreamEvent>) -> Result<(), String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String, input: Value },
    #[serde(rename = "tool_result")]
    ToolResult { tool_use_id: String, content: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// Convert the transcript to the Anthropic messages format.
///
/// An agent message's terminal tool parts expand into a tool_use block plus a
/// tool_result block in a following user message, so a follow-up stream sees
/// every completed invocation. Non-terminal tool parts are skipped - callers
/// only convert when the turn they continue has no in-flight tools.
pub fn transcript_to_api(messages: &[Message]) -> Vec<ApiMessage> {
    let mut api_messages: Vec<ApiMessage> = Vec::new();

    for msg in messages {
        match msg.role {
            Role::Operator => {
                let text: String = msg
                    .parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if !text.is_empty() {
                    api_messages.push(ApiMessage {
                        role: "user".to_string(),
                        content: vec![ContentBlock::Text { text }],
                    });
                }
            }
            Role::Agent => {
                let mut blocks: Vec<ContentBlock> = Vec::new();
                let mut results: Vec<ContentBlock> = Vec::new();
                for part in &msg.parts {
                    match part {
                        Part::Text { text } => {
                            if !text.trim().is_empty() {
                                blocks.push(ContentBlock::Text { text: text.clone() });
                            }
                        }
                        Part::Tool { tool_name, tool_use_id, state, input, output, error } => {
                            if !state.is_terminal() {
                                continue;
                            }
                            let input = if input.is_null() {
                                Value::Object(serde_json::Map::new())
                            } else {
                                input.clone()
                            };
                            blocks.push(ContentBlock::ToolUse {
                                id: tool_use_id.clone(),
                                name: tool_name.clone(),
                                input,
                            });
                            let content = match (state, output, error) {
                                (_, Some(output), _) => output.to_string(),
                                (ToolState::Errored, None, Some(desc)) => {
                                    format!("{{\"error\":{}}}", Value::String(desc.clone()))
                                }
                                _ => "{}".to_string(),
                            };
                            results.push(ContentBlock::ToolResult {
                                tool_use_id: tool_use_id.clone(),
                                content,
                            });
                        }
                    }
                }
                if !blocks.is_empty() {
                    api_messages.push(ApiMessage { role: "assistant".to_string(), content: blocks });
                }
                if !results.is_empty() {
                    api_messages.push(ApiMessage { role: "user".to_string(), content: results });
                }
            }
        }
    }

    api_messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_base::transcript::test_helpers::{AgentMessageBuilder, operator};
    use serde_json::json;

    #[test]
    fn operator_message_becomes_user_text() {
        let api = transcript_to_api(&[operator("U1", "Fire at 350 Jordan Rd")]);
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].role, "user");
    }

    #[test]
    fn completed_tool_expands_to_use_and_result() {
        let msg = AgentMessageBuilder::new("A1")
            .text("On it.")
            .tool_done("verify_address", json!({"city": "TROY"}))
            .build();
        let api = transcript_to_api(&[msg]);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "assistant");
        assert_eq!(api[0].content.len(), 2);
        assert_eq!(api[1].role, "user");
        match &api[1].content[0] {
            ContentBlock::ToolResult { content, .. } => assert!(content.contains("TROY")),
            _ => panic!("expected tool result"),
        }
    }

    #[test]
    fn in_flight_tools_are_skipped() {
        let msg = AgentMessageBuilder::new("A1")
            .text("Working.")
            .tool_in_state("calculate_route", dc_base::transcript::ToolState::Pending)
            .build();
        let api = transcript_to_api(&[msg]);
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].content.len(), 1);
    }

    #[test]
    fn errored_tool_result_carries_description() {
        let msg = AgentMessageBuilder::new("A1").tool_errored("enrich_property", "HTTP 500").build();
        let api = transcript_to_api(&[msg]);
        match &api[1].content[0] {
            ContentBlock::ToolResult { content, .. } => {
                let parsed: Value = serde_json::from_str(content).unwrap();
                assert_eq!(parsed["error"], json!("HTTP 500"));
            }
            _ => panic!("expected tool result"),
        }
    }
}
