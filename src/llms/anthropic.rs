//! Anthropic Claude API implementation (blocking SSE).

use std::io::{BufRead, BufReader};
use std::sync::mpsc::Sender;

use dc_base::tools::{ToolUse, build_api_tools};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiMessage, LlmClient, LlmRequest, StreamEvent};
use crate::constants::{API_ENDPOINT, API_VERSION, MAX_RESPONSE_TOKENS};

pub struct AnthropicClient {
    api_key: Option<SecretString>,
}

impl AnthropicClient {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self { api_key }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ApiMessage],
    tools: Value,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamContentBlock {
    #[serde(rename = "type")]
    block_type: Option<String>,
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
    partial_json: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(rename = "type")]
    event_type: String,
    content_block: Option<StreamContentBlock>,
    delta: Option<StreamDelta>,
}

impl LlmClient for AnthropicClient {
    fn stream(&self, request: &LlmRequest, tx: &Sender<StreamEvent>) -> Result<(), String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| "ANTHROPIC_API_KEY not set".to_string())?;

        let client = Client::new();
        let api_request = AnthropicRequest {
            model: &request.model,
            max_tokens: MAX_RESPONSE_TOKENS,
            system: &request.system,
            messages: &request.messages,
            tools: build_api_tools(&request.tools),
            stream: true,
        };

        let response = client
            .post(API_ENDPOINT)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(format!("API error {}: {}", status, body));
        }

        let reader = BufReader::new(response);
        // (id, name, accumulated partial json) of the open tool_use block
        let mut current_tool: Option<(String, String, String)> = None;
        let mut stop_reason: Option<String> = None;

        for line in reader.lines() {
            let line = line.map_err(|e| format!("Read error: {}", e))?;

            if !line.starts_with("data: ") {
                continue;
            }

            let json_str = &line[6..];
            if json_str == "[DONE]" {
                break;
            }

            if let Ok(event) = serde_json::from_str::<StreamMessage>(json_str) {
                match event.event_type.as_str() {
                    "content_block_start" => {
                        if let Some(block) = event.content_block
                            && block.block_type.as_deref() == Some("tool_use")
                        {
                            let id = block.id.unwrap_or_default();
                            let name = block.name.unwrap_or_default();
                            let _ = tx.send(StreamEvent::ToolStart {
                                tool_use_id: id.clone(),
                                tool_name: name.clone(),
                            });
                            current_tool = Some((id, name, String::new()));
                        }
                    }
                    "content_block_delta" => {
                        if let Some(delta) = event.delta {
                            match delta.delta_type.as_deref() {
                                Some("text_delta") => {
                                    if let Some(text) = delta.text {
                                        let _ = tx.send(StreamEvent::Chunk(text));
                                    }
                                }
                                Some("input_json_delta") => {
                                    if let Some(json) = delta.partial_json
                                        && let Some((id, _, input)) = current_tool.as_mut()
                                    {
                                        input.push_str(&json);
                                        let _ = tx.send(StreamEvent::ToolInputDelta {
                                            tool_use_id: id.clone(),
                                        });
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                    "content_block_stop" => {
                        if let Some((id, name, input_json)) = current_tool.take() {
                            let input: Value = serde_json::from_str(&input_json)
                                .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
                            let _ = tx.send(StreamEvent::ToolUse(ToolUse { id, name, input }));
                        }
                    }
                    "message_delta" => {
                        if let Some(delta) = event.delta
                            && let Some(reason) = delta.stop_reason
                        {
                            stop_reason = Some(reason);
                        }
                    }
                    "message_stop" => break,
                    _ => {}
                }
            }
        }

        let _ = tx.send(StreamEvent::Done { stop_reason });
        Ok(())
    }
}
