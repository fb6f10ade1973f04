use std::fmt;

pub type RunId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The stream endpoint accepted the connection.
    StreamOpened { run_id: RunId },
    /// One `message` event from the stream.
    StreamFrame { run_id: RunId, data: String },
    /// The connection failed or ended. `will_retry` tells whether a reconnect follows.
    StreamDisrupted {
        run_id: RunId,
        error: StreamError,
        will_retry: bool,
    },
}

impl EngineEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            EngineEvent::StreamOpened { run_id }
            | EngineEvent::StreamFrame { run_id, .. }
            | EngineEvent::StreamDisrupted { run_id, .. } => *run_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("unsupported content type {0}")]
    UnsupportedContentType(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("stream closed by server")]
    Closed,
}

impl StreamError {
    /// Errors after which reconnecting can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::Timeout(_) | StreamError::Network(_) | StreamError::Closed
        )
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return StreamError::Timeout(err.to_string());
        }
        StreamError::Network(err.to_string())
    }
}

/// Short label for log lines.
pub(crate) struct RunLabel(pub RunId);

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run {}", self.0)
    }
}
