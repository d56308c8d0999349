use super::types::{PullResponse, PushPayload};
use crate::event::Cursor;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server returned error status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Payloads pushed by one live session. The stream ending means the
/// session is gone and the caller should resubscribe.
pub type PushStream = BoxStream<'static, PushPayload>;

/// Live subscription to a run's events.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Open a session that replays everything after `cursor` and then
    /// follows the run live.
    async fn subscribe(
        &self,
        run_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<PushStream, TransportError>;
}

/// Cursor-paginated fetch of a run's events.
#[async_trait]
pub trait PullTransport: Send + Sync {
    async fn fetch(
        &self,
        run_id: &str,
        after: Option<&Cursor>,
    ) -> Result<PullResponse, TransportError>;
}
