//! 911 Call Channel: the conversation between the call-taker and the agent.
//!
//! The narrative briefing text is hidden here by exact message-id +
//! part-index identity; it belongs to the dispatch panel, and substring
//! matching would hide legitimate prose.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use dc_base::transcript::{Message, Part, Role, ToolState};

use super::{text, theme};
use crate::app::App;

pub fn render_call_channel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .title(Span::styled(" 911 Call Channel ", Style::default().fg(theme::TEXT).bold()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width < 4 || inner.height == 0 {
        return;
    }
    let width = inner.width as usize - 1;

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.transcript.messages {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        match msg.role {
            Role::Operator => render_operator(&mut lines, msg, width),
            Role::Agent => render_agent(app, &mut lines, msg, width),
        }
    }
    if app.transcript.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Describe the emergency, or press F1-F3 for a demo scenario.",
            Style::default().fg(theme::TEXT_MUTED).italic(),
        )));
    }

    // Follow the tail unless the operator scrolled up
    let height = inner.height as usize;
    let start = lines.len().saturating_sub(height + app.scroll_offset);
    let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

fn render_operator(lines: &mut Vec<Line>, msg: &Message, width: usize) {
    lines.push(
        Line::from(Span::styled("Call-taker", Style::default().fg(theme::OPERATOR).bold()))
            .alignment(Alignment::Right),
    );
    for part in &msg.parts {
        if let Part::Text { text: t } = part {
            for wrapped in text::wrap(t, width) {
                lines.push(
                    Line::from(Span::styled(wrapped, Style::default().fg(theme::TEXT)))
                        .alignment(Alignment::Right),
                );
            }
        }
    }
}

fn render_agent(app: &App, lines: &mut Vec<Line>, msg: &Message, width: usize) {
    lines.push(Line::from(Span::styled("Console", Style::default().fg(theme::AGENT).bold())));
    for (part_index, part) in msg.parts.iter().enumerate() {
        match part {
            Part::Text { text: t } => {
                if is_narrative_part(app, &msg.id, part_index) || t.trim().is_empty() {
                    continue;
                }
                for wrapped in text::wrap(t, width) {
                    lines.push(Line::from(Span::styled(wrapped, Style::default().fg(theme::TEXT))));
                }
            }
            Part::Tool { tool_name, state, error, .. } => {
                lines.push(tool_chip(app, tool_name, *state, error.as_deref()));
            }
        }
    }
}

fn is_narrative_part(app: &App, message_id: &str, part_index: usize) -> bool {
    app.view
        .narrative
        .as_ref()
        .is_some_and(|n| n.source_message_id == message_id && n.source_part_index == part_index)
}

/// One-line status chip for a tool invocation.
fn tool_chip<'a>(app: &App, tool_name: &str, state: ToolState, error: Option<&str>) -> Line<'a> {
    let (label, icon) = match app.tool_labels.get(tool_name) {
        Some(l) => (l.label.to_string(), l.icon),
        None => (tool_name.to_string(), "⚙"),
    };
    let (marker, style) = match state {
        ToolState::Pending | ToolState::InputStreaming | ToolState::InputReady => {
            ("…", Style::default().fg(theme::WARNING))
        }
        ToolState::OutputReady => ("✓", Style::default().fg(theme::SUCCESS)),
        ToolState::Errored => ("✗", Style::default().fg(theme::DANGER)),
        ToolState::Unknown => ("?", Style::default().fg(theme::TEXT_MUTED)),
    };
    let mut spans = vec![
        Span::styled(format!("  {} {} ", icon, label), Style::default().fg(theme::TEXT_SECONDARY)),
        Span::styled(marker.to_string(), style),
    ];
    if let Some(desc) = error {
        spans.push(Span::styled(format!(" {}", desc), Style::default().fg(theme::DANGER)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{App, AppEvent};
    use dc_base::briefing::Narrative;
    use dc_base::config::Config;
    use std::sync::mpsc::channel;

    fn test_app() -> App {
        let (tx, _rx) = channel::<AppEvent>();
        App::new(
            Config {
                anthropic_api_key: None,
                precisely_api_key: None,
                precisely_api_secret: None,
                model: "claude-sonnet-4-5".to_string(),
                route_fallback: Default::default(),
            },
            tx,
        )
    }

    #[test]
    fn narrative_identity_match_is_exact() {
        let mut app = test_app();
        app.view.narrative = Some(Narrative {
            source_message_id: "A2".to_string(),
            source_part_index: 3,
            clean_text: String::new(),
            follow_up_questions: vec![],
        });
        assert!(is_narrative_part(&app, "A2", 3));
        assert!(!is_narrative_part(&app, "A2", 2));
        assert!(!is_narrative_part(&app, "A1", 3));
    }
}
