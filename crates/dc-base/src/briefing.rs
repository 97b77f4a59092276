//! Aggregation core: derive the dispatch-panel view from the transcript.
//!
//! `aggregate` is a pure function of the message sequence - it holds no state
//! between calls, so clearing the transcript immediately clears everything
//! derived from it, and a recompute on any mid-stream snapshot is safe. The
//! app calls it after every transcript mutation.
//!
//! Narrative selection is the subtle part. A message's trailing text becomes
//! the briefing either because the message completed enough tools (the text
//! is then authoritative even while still streaming and short - checking
//! length here would flicker stale narratives into the panel), or because the
//! text carries the briefing marker (an updated briefing in a later turn that
//! ran no tools). The last matching message wins.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::transcript::{Message, Part, Role, ToolState};

/// Fixed marker the agent puts at the top of a briefing.
pub const BRIEFING_MARKER: &str = "DISPATCH BRIEFING";

/// Line prefix marking an embedded follow-up question.
pub const FOLLOW_UP_PREFIX: &str = ">>";

/// Tunables for narrative detection.
#[derive(Debug, Clone)]
pub struct AggregationPolicy {
    /// Completed tools in one message after which its trailing text is the
    /// briefing regardless of content.
    pub completed_tool_threshold: usize,
    /// Marker that promotes a trailing text to briefing on its own.
    pub briefing_marker: String,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self { completed_tool_threshold: 3, briefing_marker: BRIEFING_MARKER.to_string() }
    }
}

/// The selected briefing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    /// Exact source identity - the chat view hides this part and only this
    /// part, never "any text containing the marker".
    pub source_message_id: String,
    pub source_part_index: usize,
    pub clean_text: String,
    pub follow_up_questions: Vec<String>,
}

/// Derived view over the whole transcript. Recomputed, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedView {
    /// Last `OutputReady` output per tool name, in transcript order.
    pub latest_output_by_tool: HashMap<String, Value>,
    /// Tool names with at least one non-terminal part anywhere.
    pub active_tools: HashSet<String>,
    pub narrative: Option<Narrative>,
}

impl AggregatedView {
    pub fn output(&self, tool_name: &str) -> Option<&Value> {
        self.latest_output_by_tool.get(tool_name)
    }

    pub fn is_active(&self, tool_name: &str) -> bool {
        self.active_tools.contains(tool_name)
    }

    pub fn has_any_data(&self) -> bool {
        !self.latest_output_by_tool.is_empty() || !self.active_tools.is_empty() || self.narrative.is_some()
    }
}

/// Compute the aggregated view in one pass over the transcript.
pub fn aggregate(messages: &[Message], policy: &AggregationPolicy) -> AggregatedView {
    let mut view = AggregatedView::default();
    let mut candidate: Option<(String, usize, String)> = None;

    for message in messages {
        if message.role != Role::Agent {
            continue;
        }

        let mut completed_tool_count = 0usize;
        let mut last_text: Option<(usize, &str)> = None;

        for (index, part) in message.parts.iter().enumerate() {
            match part {
                Part::Tool { tool_name, state, output, .. } => match state {
                    ToolState::OutputReady => {
                        if let Some(output) = output {
                            view.latest_output_by_tool.insert(tool_name.clone(), output.clone());
                        }
                        completed_tool_count += 1;
                    }
                    ToolState::Pending | ToolState::InputStreaming | ToolState::InputReady => {
                        view.active_tools.insert(tool_name.clone());
                    }
                    // Errored is surfaced via raw part inspection only;
                    // Unknown is a forward-compat state we ignore entirely.
                    ToolState::Errored | ToolState::Unknown => {}
                },
                Part::Text { text } => {
                    if !text.trim().is_empty() {
                        last_text = Some((index, text.as_str()));
                    }
                }
            }
        }

        if let Some((index, text)) = last_text {
            let by_tool_count = completed_tool_count >= policy.completed_tool_threshold;
            if by_tool_count || text.contains(&policy.briefing_marker) {
                candidate = Some((message.id.clone(), index, text.to_string()));
            }
        }
    }

    view.narrative = candidate.map(|(source_message_id, source_part_index, text)| {
        let (clean_text, follow_up_questions) = extract_follow_ups(&text);
        Narrative { source_message_id, source_part_index, clean_text, follow_up_questions }
    });

    view
}

/// Split `>>`-prefixed follow-up question lines out of a briefing text.
///
/// Only a strict line-start `">> "` match counts - `"Severity >> 5"` inside
/// prose stays put. After removal, trailing blank lines and `---` separator
/// lines are dropped from the remaining text.
pub fn extract_follow_ups(text: &str) -> (String, Vec<String>) {
    let mut content_lines: Vec<&str> = Vec::new();
    let mut questions: Vec<String> = Vec::new();

    for line in text.split('\n') {
        match line.strip_prefix(FOLLOW_UP_PREFIX).and_then(|rest| rest.strip_prefix(' ')) {
            Some(question) => questions.push(question.trim().to_string()),
            None => content_lines.push(line),
        }
    }

    while content_lines
        .last()
        .is_some_and(|l| l.trim().is_empty() || l.trim() == "---")
    {
        content_lines.pop();
    }

    (content_lines.join("\n").trim().to_string(), questions)
}
