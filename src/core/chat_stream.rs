use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::backend::ChatSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

pub struct StreamParams {
    pub session: Arc<dyn ChatSession>,
    pub message: String,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

/// Runs reply streams on background tasks and funnels their output, tagged
/// with the stream id, into a single channel read by the event loop.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) -> tokio::task::JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                session,
                message,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "Reply stream cancelled");
                }
                _ = forward_reply(session, message, &tx, stream_id) => {}
            }
        })
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn forward_reply(
    session: Arc<dyn ChatSession>,
    message: String,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    debug!(stream_id, "Requesting reply");
    let mut stream = match session.stream_reply(message).await {
        Ok(stream) => stream,
        Err(err) => {
            debug!(stream_id, error = %err, "Reply request failed");
            let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(delta) => {
                if tx.send((StreamMessage::Chunk(delta), stream_id)).is_err() {
                    return;
                }
            }
            Err(err) => {
                debug!(stream_id, error = %err, "Reply stream failed");
                let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
                break;
            }
        }
    }

    debug!(stream_id, "Reply stream finished");
    let _ = tx.send((StreamMessage::End, stream_id));
}
