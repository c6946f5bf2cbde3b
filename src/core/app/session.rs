use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::backend::{ChatBackend, ChatSession};

/// Connection-side state: which backend we talk to, the live service
/// session, and bookkeeping for the reply currently being streamed.
pub struct SessionContext {
    pub backend: Arc<dyn ChatBackend>,
    /// `None` while a new session is being started.
    pub chat: Option<Arc<dyn ChatSession>>,
    pub provider_name: String,
    pub model: String,
    pub stream_cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
    /// Transcript index of the assistant placeholder being filled in.
    pub reply_index: Option<usize>,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn ChatBackend>, chat: Option<Arc<dyn ChatSession>>) -> Self {
        let provider_name = backend.provider_name().to_string();
        let model = backend.model().to_string();
        Self {
            backend,
            chat,
            provider_name,
            model,
            stream_cancel_token: None,
            current_stream_id: 0,
            reply_index: None,
        }
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.reply_index.is_some() && stream_id == self.current_stream_id
    }
}
