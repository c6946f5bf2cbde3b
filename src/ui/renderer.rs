use std::time::Duration;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::commands::matching_commands;
use crate::core::app::App;
use crate::utils::scroll::{wrap_text, ScrollCalculator};

const STREAMING_HINT: &str = "Esc to interrupt, Ctrl+C to quit";
const IDLE_HINT: &str = "Enter to send, Alt+Enter for new line, /help for help, Ctrl+C to quit";

/// Pick the streaming indicator glyph; it swells and fades twice a second.
pub fn pulse_symbol(elapsed: Duration) -> &'static str {
    let phase = (elapsed.as_millis() % 1000) as f32 / 500.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };

    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

pub struct ChatLayout {
    pub title: Rect,
    pub transcript: Rect,
    pub status: Rect,
    pub input: Rect,
}

pub fn chat_layout(area: Rect, input_area_height: u16) -> ChatLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(input_area_height + 2), // +2 for borders
        ])
        .split(area);

    ChatLayout {
        title: chunks[0],
        transcript: chunks[1],
        status: chunks[2],
        input: chunks[3],
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let input_area_height = app.input_area_height(f.area().width);
    let layout = chat_layout(f.area(), input_area_height);
    let theme = &app.ui.theme;

    f.render_widget(
        Paragraph::new(Span::styled(app.title(), theme.title_style)),
        layout.title,
    );

    render_transcript(f, app, layout.transcript);
    render_status(f, app, layout.status);
    render_input(f, app, layout.input, input_area_height);
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let lines =
        ScrollCalculator::build_display_lines(&app.ui.messages, &app.ui.theme, area.width);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_offset = ScrollCalculator::max_scroll_offset(total, area.height);

    // Resizes change the line count without an action, so follow the bottom
    // here as well.
    let scroll_offset = if app.ui.auto_scroll {
        max_offset
    } else {
        app.ui.scroll_offset.min(max_offset)
    };

    // Lines are already wrapped; letting ratatui wrap again would desync scrolling.
    f.render_widget(Paragraph::new(lines).scroll((scroll_offset, 0)), area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.ui.status {
        Some(status) => status.clone(),
        None => command_hint(app.ui.get_input_text()).unwrap_or_default(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(text, app.ui.theme.status_style)),
        area,
    );
}

fn command_hint(input: &str) -> Option<String> {
    let prefix = input.strip_prefix('/')?;
    if prefix.contains(char::is_whitespace) {
        return None;
    }
    let names: Vec<String> = matching_commands(prefix)
        .iter()
        .map(|command| format!("/{}", command.name))
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(format!("Commands: {}", names.join(" ")))
    }
}

fn render_input(f: &mut Frame, app: &App, area: Rect, input_area_height: u16) {
    let theme = &app.ui.theme;
    let inner_width = area.width.saturating_sub(2);

    let hint = if app.ui.is_streaming {
        STREAMING_HINT
    } else {
        IDLE_HINT
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Line::from(Span::styled(
            format!("Type your message ({hint})"),
            theme.input_title_style,
        )));

    if app.ui.is_streaming {
        let symbol = pulse_symbol(app.ui.pulse_start.elapsed());
        block = block.title(
            Line::from(Span::styled(
                format!(" {symbol} "),
                theme.streaming_indicator_style,
            ))
            .right_aligned(),
        );
    }

    let rows = wrap_text(&app.ui.input, inner_width);
    let (cursor_row, cursor_col) = cursor_position(&app.ui.input, app.ui.input_cursor, inner_width);
    let input_scroll = cursor_row.saturating_sub(input_area_height.saturating_sub(1));

    let lines: Vec<Line> = rows
        .into_iter()
        .map(|row| Line::from(Span::styled(row, theme.input_text_style)))
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(block).scroll((input_scroll, 0)),
        area,
    );

    let x = area.x + 1 + cursor_col.min(inner_width.saturating_sub(1));
    let y = area.y + 1 + cursor_row - input_scroll;
    f.set_cursor_position((x, y));
}

/// Row and column of the cursor within the wrapped input.
pub fn cursor_position(input: &str, cursor: usize, width: u16) -> (u16, u16) {
    let before = &input[..cursor.min(input.len())];
    let rows = wrap_text(before, width);
    let row = rows.len().saturating_sub(1);
    let col = rows.last().map(|r| UnicodeWidthStr::width(r.as_str())).unwrap_or(0);
    (
        u16::try_from(row).unwrap_or(u16::MAX),
        u16::try_from(col).unwrap_or(u16::MAX),
    )
}
