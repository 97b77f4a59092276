//! App state and event loop: owns the transcript, applies stream and tool
//! events from worker threads, and recomputes the aggregated dispatch view
//! after every transcript mutation.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use dc_base::briefing::{AggregatedView, AggregationPolicy, aggregate};
use dc_base::config::Config;
use dc_base::registry::{ToolLabel, ToolRegistry};
use dc_base::tools::{ToolResult, ToolUse};
use dc_base::transcript::{Part, Transcript};
use dc_mod_precisely::PreciselyRegistry;
use ratatui::Terminal;
use ratatui::backend::Backend;
use serde_json::json;

use crate::constants::{DEMO_SCENARIOS, EVENT_POLL_MS, RENDER_THROTTLE_MS, system_prompt};
use crate::events::{Action, handle_event};
use crate::llms::{AnthropicClient, LlmClient, LlmRequest, StreamEvent, transcript_to_api};
use crate::ui;

/// Events delivered to the app loop by worker threads.
pub enum AppEvent {
    /// A stream event for the agent message identified by `message_id`.
    Stream { message_id: String, event: StreamEvent },
    /// A tool execution finished.
    ToolDone { message_id: String, tool_use_id: String, result: ToolResult },
}

pub struct App {
    pub config: Config,
    pub transcript: Transcript,
    pub policy: AggregationPolicy,
    pub view: AggregatedView,
    pub input: String,
    pub status: Option<String>,
    pub is_streaming: bool,
    pub scroll_offset: usize,
    /// Display labels per tool id, from the registry.
    pub tool_labels: HashMap<&'static str, ToolLabel>,
    /// Agent message currently receiving stream/tool events.
    current_turn: Option<String>,
    /// Turn IDs whose late events must be dropped (Esc / Ctrl+L).
    cancelled: HashSet<String>,
    registry: Arc<PreciselyRegistry>,
    llm: Arc<AnthropicClient>,
    tx: Sender<AppEvent>,
}

impl App {
    pub fn new(config: Config, tx: Sender<AppEvent>) -> Self {
        let registry = Arc::new(PreciselyRegistry::from_config(&config));
        let llm = Arc::new(AnthropicClient::new(config.anthropic_api_key.clone()));
        let tool_labels = registry.tool_labels().into_iter().collect();
        Self {
            config,
            transcript: Transcript::new(),
            policy: AggregationPolicy::default(),
            view: AggregatedView::default(),
            input: String::new(),
            status: None,
            is_streaming: false,
            scroll_offset: 0,
            tool_labels,
            current_turn: None,
            cancelled: HashSet::new(),
            registry,
            llm,
            tx,
        }
    }

    pub fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: Receiver<AppEvent>,
    ) -> io::Result<()>
    where
        io::Error: From<B::Error>,
    {
        let mut last_render = Instant::now() - Duration::from_millis(RENDER_THROTTLE_MS);
        let mut dirty = true;

        loop {
            while let Ok(event) = rx.try_recv() {
                self.apply_app_event(event);
                dirty = true;
            }

            if crossterm::event::poll(Duration::from_millis(EVENT_POLL_MS))? {
                let event = crossterm::event::read()?;
                match handle_event(&event, self.is_streaming) {
                    Action::Quit => return Ok(()),
                    action => {
                        self.apply_action(action);
                        dirty = true;
                    }
                }
            }

            if dirty && last_render.elapsed() >= Duration::from_millis(RENDER_THROTTLE_MS) {
                terminal.draw(|frame| ui::render(frame, self))?;
                last_render = Instant::now();
                dirty = false;
            }
        }
    }

    // ── input actions ──────────────────────────────────────────

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Submit => self.submit_input(),
            Action::StopStreaming => self.stop_streaming(),
            Action::ClearSession => self.clear_session(),
            Action::Scenario(idx) => {
                if let Some((_, text)) = DEMO_SCENARIOS.get(idx)
                    && !self.is_streaming
                {
                    self.send_operator(text.to_string());
                }
            }
            Action::InputChar(c) => {
                // Bare digits pick a suggested follow-up question
                if self.input.is_empty()
                    && let Some(digit) = c.to_digit(10)
                    && self.send_follow_up(digit as usize)
                {
                    return;
                }
                self.input.push(c);
            }
            Action::InputBackspace => {
                self.input.pop();
            }
            Action::ScrollUp => self.scroll_offset = self.scroll_offset.saturating_add(1),
            Action::ScrollDown => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            Action::Quit | Action::None => {}
        }
    }

    fn submit_input(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.is_streaming {
            return;
        }
        self.input.clear();
        self.send_operator(text);
    }

    /// Send follow-up question number `n` (1-based) as an operator message.
    fn send_follow_up(&mut self, n: usize) -> bool {
        if self.is_streaming || n == 0 {
            return false;
        }
        let question = self
            .view
            .narrative
            .as_ref()
            .and_then(|nar| nar.follow_up_questions.get(n - 1).cloned());
        match question {
            Some(q) => {
                self.send_operator(q);
                true
            }
            None => false,
        }
    }

    fn send_operator(&mut self, text: String) {
        self.transcript.push_operator(text);
        self.recompute();
        self.start_agent_turn();
    }

    fn stop_streaming(&mut self) {
        let Some(id) = self.current_turn.take() else {
            return;
        };
        self.cancelled.insert(id.clone());
        // Leave no tool part spinning forever
        let active: Vec<String> = self
            .transcript
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| {
                m.parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::Tool { tool_use_id, state, .. } if state.is_active() => {
                            Some(tool_use_id.clone())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        for tool_use_id in active {
            self.transcript.tool_completed(&id, &tool_use_id, json!({"error": "stopped by operator"}), true);
        }
        self.is_streaming = false;
        self.status = Some("Streaming stopped".to_string());
        self.recompute();
    }

    fn clear_session(&mut self) {
        if let Some(id) = self.current_turn.take() {
            self.cancelled.insert(id);
        }
        self.transcript.clear();
        self.input.clear();
        self.status = None;
        self.is_streaming = false;
        self.scroll_offset = 0;
        self.recompute();
    }

    // ── agent turn lifecycle ───────────────────────────────────

    fn start_agent_turn(&mut self) {
        let message_id = self.transcript.begin_agent_turn();
        self.current_turn = Some(message_id.clone());
        self.is_streaming = true;
        self.status = None;
        self.spawn_stream(message_id);
    }

    /// Continue the current turn with tool results: the follow-up stream
    /// appends to the same agent message.
    fn continue_turn(&mut self, message_id: String) {
        self.is_streaming = true;
        self.spawn_stream(message_id);
    }

    fn spawn_stream(&self, message_id: String) {
        let request = LlmRequest {
            model: self.config.model.clone(),
            system: system_prompt(self.config.route_fallback),
            messages: transcript_to_api(&self.transcript.messages),
            tools: self.registry.tool_definitions(),
        };
        let llm = self.llm.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let (stream_tx, stream_rx) = channel::<StreamEvent>();
            let producer = std::thread::spawn(move || {
                if let Err(e) = llm.stream(&request, &stream_tx) {
                    let _ = stream_tx.send(StreamEvent::Error(e));
                }
            });
            for event in stream_rx {
                if tx.send(AppEvent::Stream { message_id: message_id.clone(), event }).is_err() {
                    break;
                }
            }
            let _ = producer.join();
        });
    }

    // ── worker events ──────────────────────────────────────────

    fn apply_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Stream { message_id, event } => {
                if self.cancelled.contains(&message_id) {
                    return;
                }
                self.apply_stream_event(&message_id, event);
            }
            AppEvent::ToolDone { message_id, tool_use_id, result } => {
                if self.cancelled.contains(&message_id) {
                    return;
                }
                // Stale completions (after Clear, or duplicates) are no-ops.
                if !self.transcript.tool_completed(&message_id, &tool_use_id, result.output, result.is_error) {
                    return;
                }
                self.recompute();
                if !self.transcript.has_unfinished_tools(&message_id) {
                    self.continue_turn(message_id);
                }
            }
        }
    }

    fn apply_stream_event(&mut self, message_id: &str, event: StreamEvent) {
        match event {
            StreamEvent::Chunk(text) => {
                self.transcript.append_text(message_id, &text);
            }
            StreamEvent::ToolStart { tool_use_id, tool_name } => {
                self.transcript.push_tool_pending(message_id, &tool_use_id, &tool_name);
            }
            StreamEvent::ToolInputDelta { tool_use_id } => {
                self.transcript.tool_input_streaming(message_id, &tool_use_id);
            }
            StreamEvent::ToolUse(tool_use) => {
                self.transcript.tool_input_ready(message_id, &tool_use.id, tool_use.input);
            }
            StreamEvent::Done { stop_reason } => {
                if stop_reason.as_deref() == Some("tool_use") {
                    self.execute_ready_tools(message_id);
                } else {
                    self.finish_turn();
                }
            }
            StreamEvent::Error(e) => {
                self.status = Some(e);
                self.finish_turn();
            }
        }
        self.recompute();
    }

    fn execute_ready_tools(&mut self, message_id: &str) {
        let ready = self.transcript.ready_tools(message_id);
        if ready.is_empty() {
            self.finish_turn();
            return;
        }
        for (tool_use_id, tool_name, input) in ready {
            let registry = self.registry.clone();
            let tx = self.tx.clone();
            let message_id = message_id.to_string();
            std::thread::spawn(move || {
                let tool = ToolUse { id: tool_use_id.clone(), name: tool_name, input };
                let registries: [&dyn ToolRegistry; 1] = [registry.as_ref()];
                let result = dc_base::registry::dispatch_tool(&registries, &tool);
                let _ = tx.send(AppEvent::ToolDone { message_id, tool_use_id, result });
            });
        }
    }

    fn finish_turn(&mut self) {
        self.is_streaming = false;
        self.current_turn = None;
    }

    fn recompute(&mut self) {
        self.view = aggregate(&self.transcript.messages, &self.policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (App, Receiver<AppEvent>) {
        let (tx, rx) = channel();
        let config = Config {
            anthropic_api_key: None,
            precisely_api_key: None,
            precisely_api_secret: None,
            model: "claude-sonnet-4-5".to_string(),
            route_fallback: Default::default(),
        };
        (App::new(config, tx), rx)
    }

    #[test]
    fn chunk_events_grow_the_current_turn() {
        let (mut app, _rx) = test_app();
        app.transcript.push_operator("Fire at 350 Jordan Rd".to_string());
        let id = app.transcript.begin_agent_turn();
        app.apply_stream_event(&id, StreamEvent::Chunk("Verifying ".to_string()));
        app.apply_stream_event(&id, StreamEvent::Chunk("now.".to_string()));
        assert_eq!(app.transcript.messages.len(), 2);
    }

    #[test]
    fn tool_done_for_cancelled_turn_is_dropped() {
        let (mut app, _rx) = test_app();
        let id = app.transcript.begin_agent_turn();
        app.current_turn = Some(id.clone());
        app.transcript.push_tool_pending(&id, "t1", "verify_address");
        app.transcript.tool_input_ready(&id, "t1", json!({}));
        app.clear_session();

        app.apply_app_event(AppEvent::ToolDone {
            message_id: id,
            tool_use_id: "t1".to_string(),
            result: ToolResult {
                tool_use_id: "t1".to_string(),
                tool_name: "verify_address".to_string(),
                output: json!({"city": "TROY"}),
                is_error: false,
            },
        });
        assert!(app.transcript.messages.is_empty());
        assert!(!app.view.has_any_data());
    }

    #[test]
    fn stop_streaming_errors_out_ready_tools() {
        let (mut app, _rx) = test_app();
        let id = app.transcript.begin_agent_turn();
        app.current_turn = Some(id.clone());
        app.is_streaming = true;
        app.transcript.push_tool_pending(&id, "t1", "calculate_route");
        app.transcript.tool_input_ready(&id, "t1", json!({}));
        app.stop_streaming();
        assert!(!app.is_streaming);
        assert!(!app.transcript.has_unfinished_tools(&id));
        assert!(!app.view.is_active("calculate_route"));
    }

    #[test]
    fn digit_with_nonempty_input_is_just_a_char() {
        let (mut app, _rx) = test_app();
        app.input.push_str("Apt ");
        app.apply_action(Action::InputChar('3'));
        assert_eq!(app.input, "Apt 3");
    }
}
