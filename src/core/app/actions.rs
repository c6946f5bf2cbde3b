use std::sync::Arc;

use tokio::sync::mpsc;

use super::{App, SubmitOutcome};
use crate::commands::{process_input, CommandResult};
use crate::core::backend::{ChatBackend, ChatSession};
use crate::core::chat_stream::{StreamMessage, StreamParams};

pub enum AppAction {
    AppendResponseChunk {
        content: String,
        stream_id: u64,
    },
    StreamErrored {
        message: String,
        stream_id: u64,
    },
    StreamCompleted {
        stream_id: u64,
    },
    SessionStarted {
        session: Arc<dyn ChatSession>,
    },
    SessionFailed {
        error: String,
    },
    SubmitMessage {
        message: String,
    },
    ProcessCommand {
        input: String,
    },
    CancelStreaming,
    ClearConversation,
    ScrollUp {
        lines: u16,
    },
    ScrollDown {
        lines: u16,
    },
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    SetStatus {
        message: String,
    },
    ClearStatus,
    RequestExit,
}

impl AppAction {
    pub fn from_stream(message: StreamMessage, stream_id: u64) -> Self {
        match message {
            StreamMessage::Chunk(content) => AppAction::AppendResponseChunk { content, stream_id },
            StreamMessage::Error(message) => AppAction::StreamErrored { message, stream_id },
            StreamMessage::End => AppAction::StreamCompleted { stream_id },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

/// Side effects the event loop must run on behalf of the app.
pub enum AppCommand {
    SpawnStream(StreamParams),
    StartSession(Arc<dyn ChatBackend>),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content, stream_id } => {
            let available_height = app.transcript_height(ctx);
            app.conversation()
                .append_chunk(stream_id, &content, available_height, ctx.term_width);
            None
        }
        AppAction::StreamErrored { message, stream_id } => {
            let available_height = app.transcript_height(ctx);
            app.conversation()
                .fail(stream_id, &message, available_height, ctx.term_width);
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            let available_height = app.transcript_height(ctx);
            app.conversation()
                .complete(stream_id, available_height, ctx.term_width);
            None
        }
        AppAction::SessionStarted { session } => {
            app.conversation().session_started(session);
            None
        }
        AppAction::SessionFailed { error } => {
            app.conversation().session_failed(&error);
            update_scroll_position(app, ctx);
            None
        }
        AppAction::SubmitMessage { message } => submit_message(app, &message, ctx),
        AppAction::ProcessCommand { input } => handle_process_command(app, input, ctx),
        AppAction::CancelStreaming => {
            if app.conversation().cancel_current_stream() {
                update_scroll_position(app, ctx);
            }
            None
        }
        AppAction::ClearConversation => clear_conversation(app),
        AppAction::ScrollUp { lines } => {
            let max_offset = max_scroll_offset(app, ctx);
            app.ui.scroll_up(lines, max_offset);
            None
        }
        AppAction::ScrollDown { lines } => {
            let max_offset = max_scroll_offset(app, ctx);
            app.ui.scroll_down(lines, max_offset);
            None
        }
        AppAction::PageUp => {
            let page = app.transcript_height(ctx).max(1);
            let max_offset = max_scroll_offset(app, ctx);
            app.ui.scroll_up(page, max_offset);
            None
        }
        AppAction::PageDown => {
            let page = app.transcript_height(ctx).max(1);
            let max_offset = max_scroll_offset(app, ctx);
            app.ui.scroll_down(page, max_offset);
            None
        }
        AppAction::ScrollToTop => {
            let max_offset = max_scroll_offset(app, ctx);
            app.ui.scroll_to_top(max_offset);
            None
        }
        AppAction::ScrollToBottom => {
            let max_offset = max_scroll_offset(app, ctx);
            app.ui.scroll_to_bottom(max_offset);
            None
        }
        AppAction::SetStatus { message } => {
            app.ui.set_status(message);
            None
        }
        AppAction::ClearStatus => {
            app.ui.clear_status();
            None
        }
        AppAction::RequestExit => {
            app.ui.exit_requested = true;
            None
        }
    }
}

fn submit_message(app: &mut App, message: &str, ctx: AppActionContext) -> Option<AppCommand> {
    match app.conversation().submit(message) {
        SubmitOutcome::Started(params) => {
            app.ui.clear_input();
            update_scroll_position(app, ctx);
            Some(AppCommand::SpawnStream(params))
        }
        SubmitOutcome::Busy | SubmitOutcome::Ignored => None,
    }
}

fn clear_conversation(app: &mut App) -> Option<AppCommand> {
    app.conversation()
        .clear_conversation()
        .map(AppCommand::StartSession)
}

fn handle_process_command(
    app: &mut App,
    input: String,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    if input.trim().is_empty() {
        return None;
    }

    match process_input(app, &input) {
        CommandResult::Continue => {
            app.ui.clear_input();
            update_scroll_position(app, ctx);
            None
        }
        CommandResult::ProcessAsMessage(message) => submit_message(app, &message, ctx),
        CommandResult::ClearConversation => {
            let command = clear_conversation(app);
            if command.is_some() {
                app.ui.clear_input();
            }
            command
        }
        CommandResult::Quit => {
            app.ui.exit_requested = true;
            None
        }
    }
}

fn max_scroll_offset(app: &App, ctx: AppActionContext) -> u16 {
    app.ui
        .max_scroll_offset(ctx.term_width, app.transcript_height(ctx))
}

fn update_scroll_position(app: &mut App, ctx: AppActionContext) {
    if ctx.term_width == 0 || ctx.term_height == 0 {
        return;
    }

    let available_height = app.transcript_height(ctx);
    app.conversation()
        .update_scroll_position(available_height, ctx.term_width);
}
