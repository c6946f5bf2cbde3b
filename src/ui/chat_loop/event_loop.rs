//! Event polling, dispatching, and UI rendering loop.
//!
//! The loop owns the [`App`] directly. Terminal input arrives from a reader
//! task, reply deltas from the [`ChatStreamService`] channel, and session
//! start results through the [`AppActionDispatcher`]. Everything is turned
//! into actions, applied in order, and the screen is redrawn at most
//! `MAX_FPS` times a second.

use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::prelude::Size;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::app::ui_state::STATUS_TIMEOUT;
use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
    AppCommand,
};
use crate::core::backend::{ChatBackend, OpenAiBackend, OpenAiSettings};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::ResolvedSettings;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

use super::keybindings::{handle_key_event, handle_mouse_event, sanitize_pasted_text};
use super::lifecycle::{restore_terminal, setup_terminal};

const MAX_FPS: u64 = 60;
/// How often the streaming indicator animates.
const PULSE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_session_starter(backend: Arc<dyn ChatBackend>, dispatcher: AppActionDispatcher) {
    tokio::spawn(async move {
        let action = match backend.start_session().await {
            Ok(session) => AppAction::SessionStarted { session },
            Err(err) => {
                warn!(error = %err, "Failed to start a new session");
                AppAction::SessionFailed {
                    error: err.to_string(),
                }
            }
        };
        dispatcher.dispatch_many([action], AppActionContext::default());
    });
}

fn context_for(term_size: Size) -> AppActionContext {
    AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    }
}

/// Routes queued terminal events. Returns `true` when anything arrived.
fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    term_size: Size,
) -> bool {
    let ctx = context_for(term_size);
    let mut events_processed = false;

    while let Ok(ev) = event_rx.try_recv() {
        events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let actions = handle_key_event(app, key);
                dispatcher.dispatch_many(actions, ctx);
            }
            UiEvent::Crossterm(Event::Mouse(mouse)) => {
                if let Some(action) = handle_mouse_event(mouse) {
                    dispatcher.dispatch_many([action], ctx);
                }
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                app.ui.insert_str(&sanitize_pasted_text(&text));
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    events_processed
}

/// Turns pending stream messages for the current reply into actions,
/// coalescing consecutive chunks into one append.
fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    term_size: Size,
    current_stream_id: u64,
) -> bool {
    let mut received_any = false;
    let mut coalesced_chunks = String::new();
    let mut followup_actions = Vec::new();

    while let Ok((message, msg_stream_id)) = rx.try_recv() {
        if msg_stream_id != current_stream_id {
            debug!(msg_stream_id, current_stream_id, "Dropping stale stream message");
            continue;
        }

        match message {
            StreamMessage::Chunk(content) => coalesced_chunks.push_str(&content),
            other => followup_actions.push(AppAction::from_stream(other, msg_stream_id)),
        }
        received_any = true;
    }

    if !received_any {
        return false;
    }

    let mut actions = Vec::with_capacity(1 + followup_actions.len());
    if !coalesced_chunks.is_empty() {
        actions.push(AppAction::AppendResponseChunk {
            content: coalesced_chunks,
            stream_id: current_stream_id,
        });
    }
    actions.extend(followup_actions);
    dispatcher.dispatch_many(actions, context_for(term_size));

    true
}

fn drain_action_queue(
    app: &mut App,
    dispatcher: &AppActionDispatcher,
    stream_service: &ChatStreamService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    for cmd in apply_actions(app, pending) {
        match cmd {
            AppCommand::SpawnStream(params) => {
                stream_service.spawn_stream(params);
            }
            AppCommand::StartSession(backend) => {
                spawn_session_starter(backend, dispatcher.clone());
            }
        }
    }
    true
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(settings: ResolvedSettings) -> Result<(), Box<dyn Error>> {
    let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiBackend::new(OpenAiSettings {
        provider_name: settings.provider_name.clone(),
        base_url: settings.base_url.clone(),
        api_key: settings.api_key.clone().unwrap_or_default(),
        model: settings.model.clone(),
        system_prompt: settings.system_prompt.clone(),
    }));
    let chat = backend.start_session().await?;

    let mut app = App::new(backend, Some(chat), Theme::from_name(&settings.theme));
    if settings.api_key.is_none() {
        app.conversation().add_app_info(format!(
            "No API key found in ${}; requests are sent without authorization.",
            settings.api_key_env
        ));
    }
    app.ui.set_status("Type /help for commands");

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let (stream_service, mut rx) = ChatStreamService::new();

    let mut terminal = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut last_pulse = Instant::now();
    let mut request_redraw = true;

    debug!(model = %settings.model, base_url = %settings.base_url, "Chat loop starting");

    let result: Result<(), Box<dyn Error>> = loop {
        if app.ui.exit_requested {
            break Ok(());
        }

        let now = Instant::now();
        if request_redraw && now.duration_since(last_draw) >= frame_duration {
            if let Err(err) = terminal.draw(|f| ui(f, &app)) {
                break Err(err.into());
            }
            last_draw = now;
            request_redraw = false;
        }

        let term_size = terminal.size().unwrap_or_default();
        if term_size != app.ui.last_term_size {
            app.ui.last_term_size = term_size;
            request_redraw = true;
        }

        let events_processed = process_ui_events(&mut app, &mut event_rx, &dispatcher, term_size);

        let received_any = process_stream_updates(
            &dispatcher,
            &mut rx,
            term_size,
            app.session.current_stream_id,
        );

        let actions_applied =
            drain_action_queue(&mut app, &dispatcher, &stream_service, &mut action_rx);

        let status_expired = app.ui.expire_status(Instant::now(), STATUS_TIMEOUT);

        if events_processed || received_any || actions_applied || status_expired {
            request_redraw = true;
        }

        if app.ui.is_streaming && last_pulse.elapsed() >= PULSE_INTERVAL {
            last_pulse = Instant::now();
            request_redraw = true;
        }

        if !events_processed && !received_any && !actions_applied {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader_handle.abort();
    app.conversation().cancel_current_stream();
    restore_terminal(&mut terminal)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::utils::test_utils::{
        create_test_app, create_test_app_with_backend, create_test_app_with_session,
        ScriptedBackend, ScriptedSession,
    };

    const TERM: Size = Size {
        width: 80,
        height: 24,
    };

    fn new_dispatcher() -> (AppActionDispatcher, mpsc::UnboundedReceiver<AppActionEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AppActionDispatcher::new(tx), rx)
    }

    #[test]
    fn process_stream_updates_coalesces_chunks_and_drops_stale_ids() {
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (service, mut rx) = ChatStreamService::new();

        service.send_for_test(StreamMessage::Chunk("old".into()), 1);
        service.send_for_test(StreamMessage::Chunk("Hel".into()), 2);
        service.send_for_test(StreamMessage::Chunk("lo".into()), 2);
        service.send_for_test(StreamMessage::End, 2);

        assert!(process_stream_updates(&dispatcher, &mut rx, TERM, 2));

        let actions: Vec<AppAction> = std::iter::from_fn(|| action_rx.try_recv().ok())
            .map(|envelope| envelope.action)
            .collect();
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            &actions[0],
            AppAction::AppendResponseChunk { content, stream_id: 2 } if content == "Hello"
        ));
        assert!(matches!(actions[1], AppAction::StreamCompleted { stream_id: 2 }));
    }

    #[test]
    fn process_stream_updates_reports_nothing_for_only_stale_messages() {
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (service, mut rx) = ChatStreamService::new();
        service.send_for_test(StreamMessage::End, 7);

        assert!(!process_stream_updates(&dispatcher, &mut rx, TERM, 8));
        assert!(action_rx.try_recv().is_err());
    }

    #[test]
    fn paste_inserts_sanitized_text_at_cursor() {
        let mut app = create_test_app();
        let (dispatcher, _action_rx) = new_dispatcher();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        event_tx
            .send(UiEvent::Crossterm(Event::Paste("one\r\ntwo".into())))
            .expect("send");

        assert!(process_ui_events(&mut app, &mut event_rx, &dispatcher, TERM));
        assert_eq!(app.ui.input, "one\ntwo");
    }

    #[tokio::test]
    async fn submitted_message_streams_reply_into_transcript() {
        let session = ScriptedSession::replying(vec![Ok("Hi ".into()), Ok("there".into())]);
        let mut app = create_test_app_with_session(session);
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (service, mut rx) = ChatStreamService::new();

        app.ui.insert_str("Hello");
        dispatcher.dispatch_many(
            [AppAction::ProcessCommand {
                input: "Hello".into(),
            }],
            context_for(TERM),
        );
        assert!(drain_action_queue(&mut app, &dispatcher, &service, &mut action_rx));
        assert!(app.ui.is_streaming);

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.ui.is_streaming && Instant::now() < deadline {
            process_stream_updates(&dispatcher, &mut rx, TERM, app.session.current_stream_id);
            drain_action_queue(&mut app, &dispatcher, &service, &mut action_rx);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(!app.ui.is_streaming);
        let roles: Vec<Role> = app.ui.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(app.ui.messages[1].content, "Hi there");
    }

    #[tokio::test]
    async fn clear_command_starts_a_fresh_session() {
        let backend = ScriptedBackend::new(ScriptedSession::replying(vec![Ok("Hi".into())]));
        let mut app = create_test_app_with_backend(backend.clone());
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (service, _rx) = ChatStreamService::new();

        dispatcher.dispatch_many(
            [AppAction::ProcessCommand {
                input: "/clear".into(),
            }],
            context_for(TERM),
        );
        drain_action_queue(&mut app, &dispatcher, &service, &mut action_rx);
        assert!(app.session.chat.is_none());

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.session.chat.is_none() && Instant::now() < deadline {
            drain_action_queue(&mut app, &dispatcher, &service, &mut action_rx);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(app.session.chat.is_some());
        assert_eq!(backend.starts(), 1);
    }
}
