#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::core::app::App;
use crate::core::backend::{ApiError, ChatBackend, ChatSession, ReplyStream};
use crate::core::message::Message;
use crate::ui::theme::Theme;

type Script = Result<Vec<Result<String, ApiError>>, ApiError>;

/// A session that replays the same scripted reply for every message.
pub struct ScriptedSession {
    script: Script,
    received: Mutex<Vec<String>>,
}

impl ScriptedSession {
    pub fn replying(items: Vec<Result<String, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Ok(items),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: ApiError) -> Arc<Self> {
        Arc::new(Self {
            script: Err(error),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSession for ScriptedSession {
    async fn stream_reply(&self, message: String) -> Result<ReplyStream, ApiError> {
        self.received.lock().unwrap().push(message);
        let items = self.script.clone()?;
        Ok(futures_util::stream::iter(items).boxed())
    }
}

pub struct ScriptedBackend {
    session: Arc<ScriptedSession>,
    starts: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(session: Arc<ScriptedSession>) -> Arc<Self> {
        Arc::new(Self {
            session,
            starts: AtomicUsize::new(0),
        })
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn provider_name(&self) -> &str {
        "Test"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn start_session(&self) -> Result<Arc<dyn ChatSession>, ApiError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let session: Arc<dyn ChatSession> = self.session.clone();
        Ok(session)
    }
}

pub fn create_test_app() -> App {
    let session = ScriptedSession::replying(vec![Ok("Hello!".into())]);
    create_test_app_with_session(session)
}

pub fn create_test_app_with_session(session: Arc<ScriptedSession>) -> App {
    create_test_app_with_backend(ScriptedBackend::new(session))
}

/// An app whose first session is the backend's scripted session.
pub fn create_test_app_with_backend(backend: Arc<ScriptedBackend>) -> App {
    let session: Arc<dyn ChatSession> = backend.session.clone();
    let backend: Arc<dyn ChatBackend> = backend;
    App::new(backend, Some(session), Theme::dark_default())
}

pub fn create_test_messages() -> Vec<Message> {
    vec![
        Message::user("Hello"),
        Message::assistant("Hi there!"),
        Message::user("How are you?"),
        Message::assistant("I'm doing well, thank you for asking!"),
    ]
}

pub const SAMPLE_PARAGRAPH: &str = "The story of hypertext begins not with the World Wide Web but with Vannevar Bush's 1945 essay \"As We May Think,\" where he envisioned the Memex, a device that would store books, records, and communications and link them together by association.";
