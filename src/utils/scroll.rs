use crate::core::message::{Message, Role};
use crate::ui::theme::Theme;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const USER_PREFIX: &str = "You: ";
pub const PLACEHOLDER_TEXT: &str = "…";

/// Word-wrap `text` to `width` display columns.
///
/// Hard newlines are preserved, runs of spaces collapse at wrap points, and
/// words wider than the line are broken by character. A width of zero
/// disables wrapping.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let width = width as usize;
    let mut rows = Vec::new();

    for source_line in text.split('\n') {
        if width == 0 {
            rows.push(source_line.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0usize;

        for (index, word) in source_line.split(' ').enumerate() {
            let word_width = UnicodeWidthStr::width(word);

            if index > 0 {
                if current_width > 0 && current_width + 1 + word_width > width {
                    // The separating space is dropped at the wrap point.
                    rows.push(std::mem::take(&mut current));
                    current_width = 0;
                } else if current_width < width {
                    current.push(' ');
                    current_width += 1;
                }
            }

            if word_width <= width.saturating_sub(current_width) {
                current.push_str(word);
                current_width += word_width;
                continue;
            }

            for ch in word.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                if current_width > 0 && current_width + ch_width > width {
                    rows.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(ch);
                current_width += ch_width;
            }
        }

        rows.push(current);
    }

    rows
}

/// Handles transcript line building and scroll bounds.
pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Build the pre-wrapped, styled transcript for the given width.
    ///
    /// Rendering uses these lines without ratatui's own wrapping so that the
    /// line count used for scrolling always matches what is drawn.
    pub fn build_display_lines<'a>(
        messages: impl IntoIterator<Item = &'a Message>,
        theme: &Theme,
        width: u16,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for message in messages {
            match message.role {
                Role::User => {
                    let rows = wrap_text(&format!("{USER_PREFIX}{}", message.content), width);
                    for (index, row) in rows.into_iter().enumerate() {
                        if index == 0 && row.starts_with(USER_PREFIX) {
                            let rest = row[USER_PREFIX.len()..].to_string();
                            lines.push(Line::from(vec![
                                Span::styled(USER_PREFIX, theme.user_prefix_style),
                                Span::styled(rest, theme.user_text_style),
                            ]));
                        } else {
                            lines.push(Line::from(Span::styled(row, theme.user_text_style)));
                        }
                    }
                }
                Role::Assistant if message.content.is_empty() => {
                    lines.push(Line::from(Span::styled(
                        PLACEHOLDER_TEXT,
                        theme.placeholder_style,
                    )));
                }
                Role::Assistant => {
                    push_rows(&mut lines, &message.content, width, theme.assistant_text_style)
                }
                Role::AppInfo => {
                    push_rows(&mut lines, &message.content, width, theme.app_info_style)
                }
                Role::AppError => {
                    push_rows(&mut lines, &message.content, width, theme.app_error_style)
                }
            }
            lines.push(Line::from(""));
        }

        lines
    }

    pub fn total_lines<'a>(
        messages: impl IntoIterator<Item = &'a Message>,
        theme: &Theme,
        width: u16,
    ) -> u16 {
        let count = Self::build_display_lines(messages, theme, width).len();
        u16::try_from(count).unwrap_or(u16::MAX)
    }

    pub fn max_scroll_offset(total_lines: u16, available_height: u16) -> u16 {
        total_lines.saturating_sub(available_height)
    }
}

fn push_rows(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    width: u16,
    style: ratatui::style::Style,
) {
    for row in wrap_text(text, width) {
        lines.push(Line::from(Span::styled(row, style)));
    }
}
