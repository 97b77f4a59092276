//! Conversation transcript: messages made of text and tool-invocation parts.
//!
//! The transcript is the only shared mutable resource in the app. The last
//! agent message's parts are mutated in place while its turn streams; every
//! mutation goes through an op below so stale events (arriving after a
//! Clear) are dropped instead of corrupting the new session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Agent,
}

/// Lifecycle of a single tool invocation within a message.
///
/// `Unknown` absorbs unrecognized state strings from a newer streaming
/// producer; the aggregator treats it as neither active nor data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolState {
    Pending,
    InputStreaming,
    InputReady,
    OutputReady,
    Errored,
    #[serde(other)]
    Unknown,
}

impl ToolState {
    /// OutputReady and Errored are terminal; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolState::OutputReady | ToolState::Errored)
    }

    /// Non-terminal states the aggregator counts as in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, ToolState::Pending | ToolState::InputStreaming | ToolState::InputReady)
    }

    fn rank(&self) -> u8 {
        match self {
            ToolState::Pending => 0,
            ToolState::InputStreaming => 1,
            ToolState::InputReady => 2,
            ToolState::OutputReady | ToolState::Errored => 3,
            ToolState::Unknown => 0,
        }
    }

    /// Monotonic transition. Returns false (state unchanged) for regressions,
    /// transitions out of a terminal state, or transitions into Unknown.
    pub fn advance(&mut self, next: ToolState) -> bool {
        if self.is_terminal() || next == ToolState::Unknown || next.rank() < self.rank() {
            return false;
        }
        *self = next;
        true
    }
}

/// One part of a message. Closed union - unknown part shapes are rejected at
/// the deserialization boundary rather than carried around as dynamic data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    Tool {
        tool_name: String,
        tool_use_id: String,
        state: ToolState,
        #[serde(default)]
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Display ID (U1, A1, ...) - stable for the lifetime of the session.
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new_operator(id: String, text: String) -> Self {
        Self { id, role: Role::Operator, parts: vec![Part::Text { text }] }
    }

    /// Empty agent message ready for streaming.
    pub fn new_agent(id: String) -> Self {
        Self { id, role: Role::Agent, parts: Vec::new() }
    }
}

/// Ordered message sequence plus the ID counters for new turns.
#[derive(Debug, Default)]
pub struct Transcript {
    pub messages: Vec<Message>,
    next_operator_seq: usize,
    next_agent_seq: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator message. Returns its ID.
    pub fn push_operator(&mut self, text: String) -> String {
        self.next_operator_seq += 1;
        let id = format!("U{}", self.next_operator_seq);
        self.messages.push(Message::new_operator(id.clone(), text));
        id
    }

    /// Open a new empty agent message for a streaming turn. Returns its ID.
    pub fn begin_agent_turn(&mut self) -> String {
        self.next_agent_seq += 1;
        let id = format!("A{}", self.next_agent_seq);
        self.messages.push(Message::new_agent(id.clone()));
        id
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        // Counters keep running so IDs from an abandoned session can never
        // collide with the new one.
    }

    fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    fn tool_part_mut(
        &mut self,
        message_id: &str,
        tool_use_id: &str,
    ) -> Option<(&mut ToolState, &mut Value, &mut Option<Value>, &mut Option<String>)> {
        let msg = self.message_mut(message_id)?;
        msg.parts.iter_mut().find_map(|p| match p {
            Part::Tool { tool_use_id: id, state, input, output, error, .. } if id == tool_use_id => {
                Some((state, input, output, error))
            }
            _ => None,
        })
    }

    /// Append a text chunk to the given agent message, growing its trailing
    /// text part or opening a new one after tool parts.
    /// Returns false if the message is gone (stale event after Clear).
    pub fn append_text(&mut self, message_id: &str, chunk: &str) -> bool {
        let Some(msg) = self.message_mut(message_id) else {
            return false;
        };
        match msg.parts.last_mut() {
            Some(Part::Text { text }) => text.push_str(chunk),
            _ => msg.parts.push(Part::Text { text: chunk.to_string() }),
        }
        true
    }

    /// Record a newly announced tool invocation in Pending state.
    pub fn push_tool_pending(&mut self, message_id: &str, tool_use_id: &str, tool_name: &str) -> bool {
        let Some(msg) = self.message_mut(message_id) else {
            return false;
        };
        msg.parts.push(Part::Tool {
            tool_name: tool_name.to_string(),
            tool_use_id: tool_use_id.to_string(),
            state: ToolState::Pending,
            input: Value::Null,
            output: None,
            error: None,
        });
        true
    }

    /// Mark a tool part as receiving streamed input.
    pub fn tool_input_streaming(&mut self, message_id: &str, tool_use_id: &str) -> bool {
        match self.tool_part_mut(message_id, tool_use_id) {
            Some((state, ..)) => state.advance(ToolState::InputStreaming),
            None => false,
        }
    }

    /// Store the complete parsed input and mark the part ready to execute.
    pub fn tool_input_ready(&mut self, message_id: &str, tool_use_id: &str, input: Value) -> bool {
        match self.tool_part_mut(message_id, tool_use_id) {
            Some((state, slot, ..)) => {
                if !state.advance(ToolState::InputReady) {
                    return false;
                }
                *slot = input;
                true
            }
            None => false,
        }
    }

    /// Land a tool completion: OutputReady with the normalized output, or
    /// Errored with a description. Stale completions (message or part gone,
    /// or the part already terminal) are dropped.
    pub fn tool_completed(
        &mut self,
        message_id: &str,
        tool_use_id: &str,
        output: Value,
        is_error: bool,
    ) -> bool {
        match self.tool_part_mut(message_id, tool_use_id) {
            Some((state, _, out_slot, err_slot)) => {
                let next = if is_error { ToolState::Errored } else { ToolState::OutputReady };
                if !state.advance(next) {
                    return false;
                }
                if is_error {
                    let description = output
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("tool failed")
                        .to_string();
                    *err_slot = Some(description);
                    // Keep the failure record too so raw part inspection can
                    // render it; the aggregator never reads it.
                    *out_slot = Some(output);
                } else {
                    *out_slot = Some(output);
                }
                true
            }
            None => false,
        }
    }

    /// Tool parts of a message that are ready to execute (input complete).
    pub fn ready_tools(&self, message_id: &str) -> Vec<(String, String, Value)> {
        let Some(msg) = self.messages.iter().find(|m| m.id == message_id) else {
            return Vec::new();
        };
        msg.parts
            .iter()
            .filter_map(|p| match p {
                Part::Tool { tool_name, tool_use_id, state: ToolState::InputReady, input, .. } => {
                    Some((tool_use_id.clone(), tool_name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// True while any tool part of the message is non-terminal.
    pub fn has_unfinished_tools(&self, message_id: &str) -> bool {
        self.messages.iter().find(|m| m.id == message_id).is_some_and(|msg| {
            msg.parts.iter().any(|p| matches!(p, Part::Tool { state, .. } if state.is_active()))
        })
    }
}

/// Test helpers for building messages with parts.
/// Not gated behind `#[cfg(test)]` so downstream crates can use them.
pub mod test_helpers {
    use super::*;

    /// Builder for agent messages in aggregation tests.
    pub struct AgentMessageBuilder {
        msg: Message,
        tool_seq: usize,
    }

    impl AgentMessageBuilder {
        pub fn new(id: &str) -> Self {
            Self { msg: Message::new_agent(id.to_string()), tool_seq: 0 }
        }

        pub fn text(mut self, text: &str) -> Self {
            self.msg.parts.push(Part::Text { text: text.to_string() });
            self
        }

        pub fn tool_done(mut self, tool_name: &str, output: Value) -> Self {
            self.tool_seq += 1;
            self.msg.parts.push(Part::Tool {
                tool_name: tool_name.to_string(),
                tool_use_id: format!("{}_t{}", self.msg.id, self.tool_seq),
                state: ToolState::OutputReady,
                input: Value::Null,
                output: Some(output),
                error: None,
            });
            self
        }

        pub fn tool_in_state(mut self, tool_name: &str, state: ToolState) -> Self {
            self.tool_seq += 1;
            self.msg.parts.push(Part::Tool {
                tool_name: tool_name.to_string(),
                tool_use_id: format!("{}_t{}", self.msg.id, self.tool_seq),
                state,
                input: Value::Null,
                output: None,
                error: None,
            });
            self
        }

        pub fn tool_errored(mut self, tool_name: &str, error: &str) -> Self {
            self.tool_seq += 1;
            self.msg.parts.push(Part::Tool {
                tool_name: tool_name.to_string(),
                tool_use_id: format!("{}_t{}", self.msg.id, self.tool_seq),
                state: ToolState::Errored,
                input: Value::Null,
                output: None,
                error: Some(error.to_string()),
            });
            self
        }

        pub fn build(self) -> Message {
            self.msg
        }
    }

    pub fn operator(id: &str, text: &str) -> Message {
        Message::new_operator(id.to_string(), text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_state_advances_monotonically() {
        let mut s = ToolState::Pending;
        assert!(s.advance(ToolState::InputStreaming));
        assert!(s.advance(ToolState::InputReady));
        assert!(!s.advance(ToolState::Pending)); // no regression
        assert_eq!(s, ToolState::InputReady);
        assert!(s.advance(ToolState::OutputReady));
        assert!(!s.advance(ToolState::Errored)); // terminal absorbs
        assert_eq!(s, ToolState::OutputReady);
    }

    #[test]
    fn tool_state_skips_are_allowed() {
        // A producer may jump straight from Pending to a terminal state.
        let mut s = ToolState::Pending;
        assert!(s.advance(ToolState::Errored));
        assert!(s.is_terminal());
    }

    #[test]
    fn unknown_state_deserializes_without_error() {
        let part: Part = serde_json::from_value(json!({
            "type": "tool",
            "tool_name": "verify_address",
            "tool_use_id": "t1",
            "state": "output_partially_ready"
        }))
        .unwrap();
        match part {
            Part::Tool { state, .. } => assert_eq!(state, ToolState::Unknown),
            _ => panic!("expected tool part"),
        }
    }

    #[test]
    fn append_text_grows_trailing_part() {
        let mut t = Transcript::new();
        let id = t.begin_agent_turn();
        assert!(t.append_text(&id, "Veri"));
        assert!(t.append_text(&id, "fying."));
        assert_eq!(t.messages[0].parts.len(), 1);
        match &t.messages[0].parts[0] {
            Part::Text { text } => assert_eq!(text, "Verifying."),
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn append_text_after_tool_opens_new_part() {
        let mut t = Transcript::new();
        let id = t.begin_agent_turn();
        t.append_text(&id, "On it.");
        t.push_tool_pending(&id, "t1", "verify_address");
        t.append_text(&id, "Address verified.");
        assert_eq!(t.messages[0].parts.len(), 3);
    }

    #[test]
    fn stale_events_after_clear_are_dropped() {
        let mut t = Transcript::new();
        let id = t.begin_agent_turn();
        t.push_tool_pending(&id, "t1", "calculate_route");
        t.clear();
        assert!(!t.tool_completed(&id, "t1", json!({"total_distance": 3.2}), false));
        assert!(!t.append_text(&id, "late chunk"));
        assert!(t.messages.is_empty());
    }

    #[test]
    fn ids_do_not_collide_across_clear() {
        let mut t = Transcript::new();
        let before = t.begin_agent_turn();
        t.clear();
        let after = t.begin_agent_turn();
        assert_ne!(before, after);
    }

    #[test]
    fn completion_on_terminal_part_is_dropped() {
        let mut t = Transcript::new();
        let id = t.begin_agent_turn();
        t.push_tool_pending(&id, "t1", "geocode_address");
        t.tool_input_ready(&id, "t1", json!({"addressLine1": "1 Main St"}));
        assert!(t.tool_completed(&id, "t1", json!({"latitude": 42.7}), false));
        // A duplicate completion (e.g. a retried worker) must not overwrite.
        assert!(!t.tool_completed(&id, "t1", json!({"error": "boom"}), true));
        match &t.messages[0].parts[0] {
            Part::Tool { state, error, .. } => {
                assert_eq!(*state, ToolState::OutputReady);
                assert!(error.is_none());
            }
            _ => panic!("expected tool part"),
        }
    }

    #[test]
    fn errored_completion_records_description() {
        let mut t = Transcript::new();
        let id = t.begin_agent_turn();
        t.push_tool_pending(&id, "t1", "enrich_property");
        t.tool_completed(&id, "t1", json!({"error": "HTTP 500"}), true);
        match &t.messages[0].parts[0] {
            Part::Tool { state, error, .. } => {
                assert_eq!(*state, ToolState::Errored);
                assert_eq!(error.as_deref(), Some("HTTP 500"));
            }
            _ => panic!("expected tool part"),
        }
    }

    #[test]
    fn ready_tools_lists_only_input_ready() {
        let mut t = Transcript::new();
        let id = t.begin_agent_turn();
        t.push_tool_pending(&id, "t1", "verify_address");
        t.tool_input_ready(&id, "t1", json!({"city": "Troy"}));
        t.push_tool_pending(&id, "t2", "geocode_address");
        let ready = t.ready_tools(&id);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].1, "verify_address");
        assert!(t.has_unfinished_tools(&id));
    }
}
