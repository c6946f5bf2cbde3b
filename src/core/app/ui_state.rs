use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::prelude::Size;
use unicode_segmentation::UnicodeSegmentation;

use crate::core::message::Message;
use crate::ui::theme::Theme;
use crate::utils::scroll::{wrap_text, ScrollCalculator};

/// Rows the input box may grow to before it scrolls.
pub const MAX_INPUT_LINES: u16 = 6;

/// Status messages disappear after this long.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct UiState {
    pub messages: VecDeque<Message>,
    pub input: String,
    /// Byte offset of the cursor within `input`; always on a grapheme boundary.
    pub input_cursor: usize,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub is_streaming: bool,
    pub pulse_start: Instant,
    pub status: Option<String>,
    pub status_set_at: Option<Instant>,
    pub exit_requested: bool,
    pub theme: Theme,
    pub last_term_size: Size,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        Self {
            messages: VecDeque::new(),
            input: String::new(),
            input_cursor: 0,
            scroll_offset: 0,
            auto_scroll: true,
            is_streaming: false,
            pulse_start: Instant::now(),
            status: None,
            status_set_at: None,
            exit_requested: false,
            theme,
            last_term_size: Size::default(),
        }
    }

    pub fn begin_streaming(&mut self) {
        self.is_streaming = true;
        self.pulse_start = Instant::now();
    }

    pub fn end_streaming(&mut self) {
        self.is_streaming = false;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_set_at = None;
    }

    /// Drop the status line once it has been visible for `timeout`.
    /// Returns `true` when something was cleared.
    pub fn expire_status(&mut self, now: Instant, timeout: Duration) -> bool {
        match self.status_set_at {
            Some(set_at) if now.duration_since(set_at) >= timeout => {
                self.clear_status();
                true
            }
            _ => false,
        }
    }

    // Input editing

    pub fn insert_char(&mut self, ch: char) {
        self.input.insert(self.input_cursor, ch);
        self.input_cursor += ch.len_utf8();
    }

    pub fn insert_str(&mut self, text: &str) {
        self.input.insert_str(self.input_cursor, text);
        self.input_cursor += text.len();
    }

    pub fn backspace(&mut self) {
        if let Some((start, _)) = self.input[..self.input_cursor]
            .grapheme_indices(true)
            .next_back()
        {
            self.input.replace_range(start..self.input_cursor, "");
            self.input_cursor = start;
        }
    }

    pub fn delete_forward(&mut self) {
        if let Some(grapheme) = self.input[self.input_cursor..].graphemes(true).next() {
            let end = self.input_cursor + grapheme.len();
            self.input.replace_range(self.input_cursor..end, "");
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some((start, _)) = self.input[..self.input_cursor]
            .grapheme_indices(true)
            .next_back()
        {
            self.input_cursor = start;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(grapheme) = self.input[self.input_cursor..].graphemes(true).next() {
            self.input_cursor += grapheme.len();
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.input_cursor = self.input.len();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.input_cursor = 0;
    }

    pub fn get_input_text(&self) -> &str {
        &self.input
    }

    /// Number of rows the input needs inside its border, capped at
    /// [`MAX_INPUT_LINES`].
    pub fn calculate_input_area_height(&self, term_width: u16) -> u16 {
        let inner_width = term_width.saturating_sub(2);
        let rows = wrap_text(&self.input, inner_width).len();
        u16::try_from(rows)
            .unwrap_or(u16::MAX)
            .clamp(1, MAX_INPUT_LINES)
    }

    // Transcript scrolling

    pub fn calculate_wrapped_line_count(&self, term_width: u16) -> u16 {
        ScrollCalculator::total_lines(&self.messages, &self.theme, term_width)
    }

    pub fn max_scroll_offset(&self, term_width: u16, available_height: u16) -> u16 {
        ScrollCalculator::max_scroll_offset(
            self.calculate_wrapped_line_count(term_width),
            available_height,
        )
    }

    /// Scrolls toward the top. While following the bottom the stored offset
    /// may be stale after a resize, so the move starts from `max_offset`.
    pub fn scroll_up(&mut self, lines: u16, max_offset: u16) {
        let from = if self.auto_scroll {
            max_offset
        } else {
            self.scroll_offset.min(max_offset)
        };
        self.scroll_offset = from.saturating_sub(lines);
        self.auto_scroll = self.scroll_offset >= max_offset;
    }

    pub fn scroll_down(&mut self, lines: u16, max_offset: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max_offset);
        self.auto_scroll = self.scroll_offset >= max_offset;
    }

    pub fn scroll_to_top(&mut self, max_offset: u16) {
        self.scroll_offset = 0;
        self.auto_scroll = max_offset == 0;
    }

    pub fn scroll_to_bottom(&mut self, max_offset: u16) {
        self.scroll_offset = max_offset;
        self.auto_scroll = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_with_input(text: &str) -> UiState {
        let mut ui = UiState::new(Theme::dark_default());
        ui.insert_str(text);
        ui
    }

    #[test]
    fn insert_and_backspace_respect_graphemes() {
        let mut ui = ui_with_input("caf");
        ui.insert_str("e\u{301}");
        assert_eq!(ui.input, "cafe\u{301}");

        ui.backspace();
        assert_eq!(ui.input, "caf");
        assert_eq!(ui.input_cursor, 3);
    }

    #[test]
    fn cursor_moves_by_grapheme_and_edits_in_place() {
        let mut ui = ui_with_input("añb");
        ui.move_cursor_left();
        ui.move_cursor_left();
        assert_eq!(ui.input_cursor, 1);

        ui.insert_char('x');
        assert_eq!(ui.input, "axñb");

        ui.delete_forward();
        assert_eq!(ui.input, "axb");

        ui.move_cursor_end();
        ui.move_cursor_right();
        assert_eq!(ui.input_cursor, ui.input.len());

        ui.move_cursor_home();
        ui.backspace();
        assert_eq!(ui.input, "axb");
    }

    #[test]
    fn input_area_height_grows_with_newlines_and_caps() {
        let ui = ui_with_input("one");
        assert_eq!(ui.calculate_input_area_height(40), 1);

        let ui = ui_with_input("one\ntwo\nthree");
        assert_eq!(ui.calculate_input_area_height(40), 3);

        let ui = ui_with_input(&"line\n".repeat(20));
        assert_eq!(ui.calculate_input_area_height(40), MAX_INPUT_LINES);
    }

    #[test]
    fn scrolling_up_disables_auto_scroll_until_bottom_is_reached() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.scroll_to_bottom(10);
        assert!(ui.auto_scroll);

        ui.scroll_up(3, 10);
        assert_eq!(ui.scroll_offset, 7);
        assert!(!ui.auto_scroll);

        ui.scroll_down(2, 10);
        assert!(!ui.auto_scroll);

        ui.scroll_down(5, 10);
        assert_eq!(ui.scroll_offset, 10);
        assert!(ui.auto_scroll);
    }

    #[test]
    fn scrolling_up_starts_from_current_bottom_while_following() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.scroll_to_bottom(25);

        // The transcript got taller without any scroll action.
        ui.scroll_up(1, 55);
        assert_eq!(ui.scroll_offset, 54);
        assert!(!ui.auto_scroll);
    }

    #[test]
    fn scrolling_a_transcript_that_fits_keeps_following() {
        let mut ui = UiState::new(Theme::dark_default());

        ui.scroll_up(1, 0);
        assert_eq!(ui.scroll_offset, 0);
        assert!(ui.auto_scroll);

        ui.scroll_to_top(0);
        assert!(ui.auto_scroll);

        ui.scroll_to_top(4);
        assert!(!ui.auto_scroll);
    }

    #[test]
    fn status_expires_after_timeout() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.set_status("hello");
        let set_at = ui.status_set_at.expect("timestamp");

        assert!(!ui.expire_status(set_at, STATUS_TIMEOUT));
        assert_eq!(ui.status.as_deref(), Some("hello"));

        assert!(ui.expire_status(set_at + STATUS_TIMEOUT, STATUS_TIMEOUT));
        assert!(ui.status.is_none());
    }
}
