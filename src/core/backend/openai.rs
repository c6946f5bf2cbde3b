use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ApiError, ChatBackend, ChatSession, ReplyStream};
use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::message::Role;

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub provider_name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: Option<String>,
}

/// Backend for services exposing an OpenAI-compatible
/// `chat/completions` endpoint with server-sent event streaming.
pub struct OpenAiBackend {
    client: reqwest::Client,
    settings: Arc<OpenAiSettings>,
}

impl OpenAiBackend {
    pub fn new(settings: OpenAiSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: OpenAiSettings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn provider_name(&self) -> &str {
        &self.settings.provider_name
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn start_session(&self) -> Result<Arc<dyn ChatSession>, ApiError> {
        debug!(
            provider = %self.settings.provider_name,
            model = %self.settings.model,
            "Starting chat session"
        );
        Ok(Arc::new(OpenAiSession {
            client: self.client.clone(),
            settings: Arc::clone(&self.settings),
            history: Arc::new(Mutex::new(Vec::new())),
        }))
    }
}

pub struct OpenAiSession {
    client: reqwest::Client,
    settings: Arc<OpenAiSettings>,
    history: Arc<Mutex<Vec<ChatMessage>>>,
}

#[async_trait]
impl ChatSession for OpenAiSession {
    async fn stream_reply(&self, message: String) -> Result<ReplyStream, ApiError> {
        let messages = {
            let history = self.history.lock().await;
            build_request_messages(self.settings.system_prompt.as_deref(), &history, &message)
        };
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages,
            stream: true,
        };

        let mut http_request = self
            .client
            .post(chat_completions_url(&self.settings.base_url))
            .header("Content-Type", "application/json");
        if !self.settings.api_key.is_empty() {
            http_request = http_request.bearer_auth(&self.settings.api_key);
        }

        let response = http_request
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(status, "Chat completion request rejected");
            return Err(ApiError::Status { status, body });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ApiError::Transport(e.to_string()))
            })
            .boxed();
        let state = ReplyState::new(bytes, Arc::clone(&self.history), message);

        // The stream owns the response body; dropping it closes the connection.
        Ok(stream::unfold(state, |mut state| async move {
            let item = state.next_item().await?;
            Some((item, state))
        })
        .boxed())
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn build_request_messages(
    system_prompt: Option<&str>,
    history: &[ChatMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(prompt) = system_prompt.filter(|prompt| !prompt.trim().is_empty()) {
        messages.push(ChatMessage::new("system", prompt));
    }
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::new(Role::User.as_str(), message));
    messages
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Ignore,
    Delta(String),
    Done,
    Error(ApiError),
}

fn parse_sse_line(line: &str) -> SseEvent {
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return SseEvent::Ignore;
    };

    if payload == "[DONE]" {
        return SseEvent::Done;
    }
    if payload.trim().is_empty() {
        return SseEvent::Ignore;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(SseEvent::Delta)
            .unwrap_or(SseEvent::Ignore),
        Err(_) => SseEvent::Error(ApiError::Stream(payload.to_string())),
    }
}

/// Split complete lines off the front of `buffer` and parse them.
fn take_events(buffer: &mut Vec<u8>) -> Vec<SseEvent> {
    let mut events = Vec::new();
    while let Some(newline_pos) = memchr(b'\n', buffer) {
        match std::str::from_utf8(&buffer[..newline_pos]) {
            Ok(line) => events.push(parse_sse_line(line.trim())),
            Err(e) => warn!(error = %e, "Skipping non-UTF-8 line in reply stream"),
        }
        buffer.drain(..=newline_pos);
    }
    events
}

/// Reads one reply off the response body. The turn is committed to the
/// session history once the reply ends cleanly with some text.
struct ReplyState {
    bytes: BoxStream<'static, Result<Vec<u8>, ApiError>>,
    buffer: Vec<u8>,
    pending: VecDeque<SseEvent>,
    reply: String,
    history: Arc<Mutex<Vec<ChatMessage>>>,
    user_message: String,
    finished: bool,
}

impl ReplyState {
    fn new(
        bytes: BoxStream<'static, Result<Vec<u8>, ApiError>>,
        history: Arc<Mutex<Vec<ChatMessage>>>,
        user_message: String,
    ) -> Self {
        Self {
            bytes,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            reply: String::new(),
            history,
            user_message,
            finished: false,
        }
    }

    async fn next_item(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            if self.finished {
                return None;
            }

            while let Some(event) = self.pending.pop_front() {
                match event {
                    SseEvent::Ignore => {}
                    SseEvent::Delta(text) => {
                        self.reply.push_str(&text);
                        return Some(Ok(text));
                    }
                    SseEvent::Done => {
                        self.commit().await;
                        return None;
                    }
                    SseEvent::Error(err) => {
                        self.finished = true;
                        return Some(Err(err));
                    }
                }
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.pending.extend(take_events(&mut self.buffer));
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                None => {
                    // A connection closed without `[DONE]` still counts as a complete reply.
                    if !self.buffer.is_empty() {
                        self.buffer.push(b'\n');
                        self.pending.extend(take_events(&mut self.buffer));
                    }
                    self.pending.push_back(SseEvent::Done);
                }
            }
        }
    }

    async fn commit(&mut self) {
        self.finished = true;
        if self.reply.is_empty() {
            return;
        }

        debug!(reply_len = self.reply.len(), "Committing turn to session history");
        let user_message = std::mem::take(&mut self.user_message);
        let reply = std::mem::take(&mut self.reply);
        self.history.lock().await.extend([
            ChatMessage::new(Role::User.as_str(), user_message),
            ChatMessage::new(Role::Assistant.as_str(), reply),
        ]);
    }
}
