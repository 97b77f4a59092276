mod chat;
mod dispatch;
mod input;
mod text;
mod theme;

use ratatui::{prelude::*, widgets::Block};

use crate::app::App;
use crate::constants::{CALL_CHANNEL_PERCENT, STATUS_BAR_HEIGHT};

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Block::default().style(Style::default().bg(theme::BG_BASE)), area);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_BAR_HEIGHT)])
        .split(area);

    let body_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(CALL_CHANNEL_PERCENT),
            Constraint::Percentage(100 - CALL_CHANNEL_PERCENT),
        ])
        .split(main_layout[0]);

    let left_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(body_layout[0]);

    chat::render_call_channel(frame, app, left_layout[0]);
    input::render_input(frame, app, left_layout[1]);
    dispatch::render_dispatch_panel(frame, app, body_layout[1]);
    input::render_status_bar(frame, app, main_layout[1]);
}
