use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

/// What the app should do in response to a terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Submit,
    StopStreaming,
    ClearSession,
    /// Seed the demo scenario with this index (0-based)
    Scenario(usize),
    InputChar(char),
    InputBackspace,
    ScrollUp,
    ScrollDown,
    None,
}

pub fn handle_event(event: &Event, is_streaming: bool) -> Action {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

            if ctrl {
                match key.code {
                    KeyCode::Char('q') => return Action::Quit,
                    KeyCode::Char('l') => return Action::ClearSession,
                    _ => {}
                }
            }

            if key.code == KeyCode::Esc && is_streaming {
                return Action::StopStreaming;
            }

            match key.code {
                KeyCode::Enter => Action::Submit,
                KeyCode::Backspace => Action::InputBackspace,
                KeyCode::Up | KeyCode::PageUp => Action::ScrollUp,
                KeyCode::Down | KeyCode::PageDown => Action::ScrollDown,
                KeyCode::F(n @ 1..=3) => Action::Scenario((n - 1) as usize),
                KeyCode::Char(c) if !ctrl => Action::InputChar(c),
                _ => Action::None,
            }
        }
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, state: KeyEventState::NONE })
    }

    #[test]
    fn ctrl_q_quits() {
        assert_eq!(handle_event(&key(KeyCode::Char('q'), KeyModifiers::CONTROL), false), Action::Quit);
    }

    #[test]
    fn esc_stops_only_while_streaming() {
        assert_eq!(handle_event(&key(KeyCode::Esc, KeyModifiers::NONE), true), Action::StopStreaming);
        assert_eq!(handle_event(&key(KeyCode::Esc, KeyModifiers::NONE), false), Action::None);
    }

    #[test]
    fn function_keys_map_to_scenarios() {
        assert_eq!(handle_event(&key(KeyCode::F(1), KeyModifiers::NONE), false), Action::Scenario(0));
        assert_eq!(handle_event(&key(KeyCode::F(3), KeyModifiers::NONE), false), Action::Scenario(2));
        assert_eq!(handle_event(&key(KeyCode::F(4), KeyModifiers::NONE), false), Action::None);
    }

    #[test]
    fn plain_chars_feed_the_input() {
        assert_eq!(handle_event(&key(KeyCode::Char('x'), KeyModifiers::NONE), false), Action::InputChar('x'));
        assert_eq!(handle_event(&key(KeyCode::Char('l'), KeyModifiers::CONTROL), false), Action::ClearSession);
    }
}
