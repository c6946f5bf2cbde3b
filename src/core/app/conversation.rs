use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{session::SessionContext, ui_state::UiState};
use crate::core::backend::{ChatBackend, ChatSession};
use crate::core::chat_stream::StreamParams;
use crate::core::message::Message;

pub const NO_RESPONSE_NOTICE: &str = "(no response)";
pub const INTERRUPTED_NOTICE: &str = "[interrupted]";
pub const BUSY_STATUS: &str = "A reply is still streaming (Esc to interrupt)";
pub const SESSION_PENDING_STATUS: &str = "Starting a new conversation…";

/// Result of trying to send a message.
pub enum SubmitOutcome {
    /// Nothing but whitespace was entered.
    Ignored,
    /// A reply is already in flight (or no session is ready); the input is kept.
    Busy,
    Started(StreamParams),
}

/// The streaming message-append state machine.
///
/// Every submission appends the user's message and an empty assistant
/// placeholder, then the placeholder is grown chunk by chunk until the
/// stream completes, fails, or is cancelled. Only the stream with the
/// current id may touch the transcript.
pub struct ConversationController<'a> {
    session: &'a mut SessionContext,
    ui: &'a mut UiState,
}

impl<'a> ConversationController<'a> {
    pub fn new(session: &'a mut SessionContext, ui: &'a mut UiState) -> Self {
        Self { session, ui }
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        if self.ui.is_streaming {
            self.ui.set_status(BUSY_STATUS);
            return SubmitOutcome::Busy;
        }

        let Some(chat) = self.session.chat.clone() else {
            self.ui.set_status(SESSION_PENDING_STATUS);
            return SubmitOutcome::Busy;
        };

        self.ui.clear_status();
        self.ui.messages.push_back(Message::user(message));
        self.ui.messages.push_back(Message::assistant(""));
        self.session.reply_index = Some(self.ui.messages.len() - 1);
        self.ui.auto_scroll = true;

        let (cancel_token, stream_id) = self.start_new_stream();
        debug!(stream_id, chars = message.len(), "Submitted message");

        SubmitOutcome::Started(StreamParams {
            session: chat,
            message: message.to_string(),
            cancel_token,
            stream_id,
        })
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        self.session.current_stream_id += 1;

        let token = CancellationToken::new();
        self.session.stream_cancel_token = Some(token.clone());
        self.ui.begin_streaming();

        (token, self.session.current_stream_id)
    }

    fn finish_stream(&mut self) {
        self.session.stream_cancel_token = None;
        self.session.reply_index = None;
        self.ui.end_streaming();
    }

    fn reply_mut(&mut self) -> Option<&mut Message> {
        let index = self.session.reply_index?;
        self.ui
            .messages
            .get_mut(index)
            .filter(|message| message.is_assistant())
    }

    fn reply_is_empty(&self) -> bool {
        self.session
            .reply_index
            .and_then(|index| self.ui.messages.get(index))
            .is_none_or(|message| message.content.is_empty())
    }

    /// Append a streamed delta to the in-flight reply. Returns `false` when
    /// the chunk belongs to a superseded stream and was dropped.
    pub fn append_chunk(
        &mut self,
        stream_id: u64,
        chunk: &str,
        available_height: u16,
        terminal_width: u16,
    ) -> bool {
        if !self.session.is_current_stream(stream_id) {
            return false;
        }
        if chunk.is_empty() {
            return true;
        }

        if let Some(reply) = self.reply_mut() {
            reply.content.push_str(chunk);
        }
        self.update_scroll_position(available_height, terminal_width);
        true
    }

    pub fn complete(&mut self, stream_id: u64, available_height: u16, terminal_width: u16) -> bool {
        if !self.session.is_current_stream(stream_id) {
            return false;
        }

        if self.reply_is_empty() {
            if let Some(reply) = self.reply_mut() {
                *reply = Message::app_info(NO_RESPONSE_NOTICE);
            }
        }
        debug!(stream_id, "Reply completed");
        self.finish_stream();
        self.update_scroll_position(available_height, terminal_width);
        true
    }

    pub fn fail(
        &mut self,
        stream_id: u64,
        error: &str,
        available_height: u16,
        terminal_width: u16,
    ) -> bool {
        if !self.session.is_current_stream(stream_id) {
            return false;
        }

        self.drop_empty_reply();
        self.ui.messages.push_back(Message::app_error(error.trim()));
        debug!(stream_id, "Reply failed");
        self.finish_stream();
        self.update_scroll_position(available_height, terminal_width);
        true
    }

    /// Stop the in-flight reply, keeping whatever text already arrived.
    /// Returns `false` when nothing was streaming.
    pub fn cancel_current_stream(&mut self) -> bool {
        if !self.ui.is_streaming {
            return false;
        }

        if let Some(token) = self.session.stream_cancel_token.take() {
            token.cancel();
        }
        if self.reply_is_empty() {
            self.drop_empty_reply();
        } else {
            self.ui.messages.push_back(Message::app_info(INTERRUPTED_NOTICE));
        }
        debug!(stream_id = self.session.current_stream_id, "Reply interrupted");
        self.finish_stream();
        true
    }

    fn drop_empty_reply(&mut self) {
        if let Some(index) = self.session.reply_index {
            let empty = self
                .ui
                .messages
                .get(index)
                .is_some_and(|message| message.is_assistant() && message.content.is_empty());
            if empty {
                self.ui.messages.remove(index);
            }
        }
    }

    /// Empty the transcript and drop the service session. Returns the
    /// backend to start a fresh session on, or `None` while a reply is
    /// still streaming.
    pub fn clear_conversation(&mut self) -> Option<Arc<dyn ChatBackend>> {
        if self.ui.is_streaming {
            self.ui.set_status("Interrupt the current reply before clearing");
            return None;
        }

        self.ui.messages.clear();
        self.ui.scroll_offset = 0;
        self.ui.auto_scroll = true;
        self.session.chat = None;
        self.ui.set_status(SESSION_PENDING_STATUS);
        Some(Arc::clone(&self.session.backend))
    }

    pub fn session_started(&mut self, chat: Arc<dyn ChatSession>) {
        self.session.chat = Some(chat);
        self.ui.set_status("Started a new conversation");
    }

    pub fn session_failed(&mut self, error: &str) {
        self.ui.clear_status();
        self.add_app_error(format!("Could not start a new conversation: {error}"));
    }

    pub fn add_app_info(&mut self, content: impl Into<String>) {
        self.ui.messages.push_back(Message::app_info(content));
    }

    pub fn add_app_error(&mut self, content: impl Into<String>) {
        self.ui.messages.push_back(Message::app_error(content));
    }

    pub fn set_status<S: Into<String>>(&mut self, s: S) {
        self.ui.set_status(s);
    }

    pub fn clear_status(&mut self) {
        self.ui.clear_status();
    }

    /// Keep the newest content in view while auto-scroll is on.
    pub fn update_scroll_position(&mut self, available_height: u16, terminal_width: u16) {
        if self.ui.auto_scroll {
            self.ui.scroll_offset = self.ui.max_scroll_offset(terminal_width, available_height);
        }
    }
}
