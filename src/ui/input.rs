use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::App;

pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let border = if app.is_streaming { theme::BORDER } else { theme::BORDER_FOCUS };
    let title = if app.is_streaming { " streaming - Esc to stop " } else { " call notes " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(title, Style::default().fg(theme::TEXT_MUTED)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Show the tail of the input when it overflows
    let width = inner.width as usize;
    let shown: String = if app.input.len() > width.saturating_sub(1) {
        app.input.chars().skip(app.input.chars().count().saturating_sub(width.saturating_sub(1))).collect()
    } else {
        app.input.clone()
    };
    let text = format!("{}▏", shown);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(theme::TEXT).bg(theme::BG_INPUT)),
        inner,
    );
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let spans = match &app.status {
        Some(message) => vec![Span::styled(format!(" {} ", message), Style::default().fg(theme::DANGER))],
        None => vec![Span::styled(
            " Enter send · F1-F3 scenarios · Ctrl+L clear · Ctrl+Q quit ",
            Style::default().fg(theme::TEXT_MUTED),
        )],
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
