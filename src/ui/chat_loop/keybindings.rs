//! Key and mouse handling for the chat screen.
//!
//! Input edits are applied to the UI state immediately; everything that
//! touches the conversation is returned as [`AppAction`]s for the dispatcher.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::core::app::{App, AppAction};

const MOUSE_SCROLL_LINES: u16 = 3;

/// Handles a key press. Returns the actions it produced, if any.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Vec<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('c') if ctrl => vec![AppAction::RequestExit],
        KeyCode::Char('l') if ctrl => vec![AppAction::ClearConversation],
        KeyCode::Char('a') if ctrl => {
            app.ui.move_cursor_home();
            Vec::new()
        }
        KeyCode::Char('e') if ctrl => {
            app.ui.move_cursor_end();
            Vec::new()
        }
        KeyCode::Char('u') if ctrl => {
            app.ui.clear_input();
            Vec::new()
        }
        KeyCode::Char('j') if ctrl => {
            app.ui.insert_char('\n');
            Vec::new()
        }
        KeyCode::Enter if alt || shift => {
            app.ui.insert_char('\n');
            Vec::new()
        }
        KeyCode::Enter => vec![AppAction::ProcessCommand {
            input: app.ui.get_input_text().to_string(),
        }],
        KeyCode::Esc => vec![AppAction::CancelStreaming],
        KeyCode::Up => vec![AppAction::ScrollUp { lines: 1 }],
        KeyCode::Down => vec![AppAction::ScrollDown { lines: 1 }],
        KeyCode::PageUp => vec![AppAction::PageUp],
        KeyCode::PageDown => vec![AppAction::PageDown],
        KeyCode::Home => vec![AppAction::ScrollToTop],
        KeyCode::End => vec![AppAction::ScrollToBottom],
        KeyCode::Left => {
            app.ui.move_cursor_left();
            Vec::new()
        }
        KeyCode::Right => {
            app.ui.move_cursor_right();
            Vec::new()
        }
        KeyCode::Backspace => {
            app.ui.backspace();
            Vec::new()
        }
        KeyCode::Delete => {
            app.ui.delete_forward();
            Vec::new()
        }
        KeyCode::Tab => {
            app.ui.insert_str("    ");
            Vec::new()
        }
        KeyCode::Char(ch) if !ctrl && !alt => {
            app.ui.insert_char(ch);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

pub fn handle_mouse_event(mouse: MouseEvent) -> Option<AppAction> {
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(AppAction::ScrollUp {
            lines: MOUSE_SCROLL_LINES,
        }),
        MouseEventKind::ScrollDown => Some(AppAction::ScrollDown {
            lines: MOUSE_SCROLL_LINES,
        }),
        _ => None,
    }
}

/// Strip control characters from pasted text, keeping newlines and tabs.
pub fn sanitize_pasted_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}
