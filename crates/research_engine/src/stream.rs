use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::endpoint::endpoint_url;
use crate::sse::SseDecoder;
use crate::types::RunLabel;
use crate::{EngineEvent, RunId, StreamError};

const STREAM_PATH: &str = "api/stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

/// How a dropped stream is re-established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive failed attempts before giving up. Zero disables reconnection.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Exponential backoff from the server's `retry:` hint, or from `initial_delay`.
    pub fn delay_for(&self, attempt: u32, server_retry: Option<Duration>) -> Duration {
        let base = server_retry.unwrap_or(self.initial_delay);
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        base.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub api_base: Url,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl StreamSettings {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Query parameters of one stream subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub company: String,
    pub token: String,
    pub user_notes: Option<String>,
    /// JSON text, sent as-is.
    pub extraction_schema: Option<String>,
}

impl StreamQuery {
    pub fn to_url(&self, api_base: &Url) -> Result<Url, StreamError> {
        let mut url = endpoint_url(api_base, STREAM_PATH)
            .map_err(|err| StreamError::InvalidUrl(err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("company", &self.company);
            pairs.append_pair("token", &self.token);
            if let Some(notes) = self.user_notes.as_deref().filter(|n| !n.is_empty()) {
                pairs.append_pair("user_notes", notes);
            }
            if let Some(schema) = self.extraction_schema.as_deref() {
                pairs.append_pair("extraction_schema", schema);
            }
        }
        Ok(url)
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait StreamClient: Send + Sync {
    /// Drives one subscription until it gives up or `cancel` fires.
    /// Nothing is emitted after cancellation.
    async fn run(
        &self,
        run_id: RunId,
        query: &StreamQuery,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    );
}

#[derive(Debug, Clone)]
pub struct ReqwestStreamClient {
    settings: StreamSettings,
    client: reqwest::Client,
}

impl ReqwestStreamClient {
    pub fn new(settings: StreamSettings) -> Result<Self, StreamError> {
        // No overall timeout: the stream stays open for the whole run.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(StreamError::from_reqwest)?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// One connection attempt. Always ends in an error; a clean EOF is `Closed`.
    async fn connect_once(
        &self,
        run_id: RunId,
        url: &Url,
        decoder: &mut SseDecoder,
        sink: &dyn EventSink,
        opened: &mut bool,
    ) -> StreamError {
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = decoder.last_event_id() {
            request = request.header(LAST_EVENT_ID, id);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return StreamError::from_reqwest(err),
        };

        let status = response.status();
        if !status.is_success() {
            return StreamError::HttpStatus(status.as_u16());
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !is_event_stream(content_type) {
            return StreamError::UnsupportedContentType(content_type.to_string());
        }

        *opened = true;
        sink.emit(EngineEvent::StreamOpened { run_id });

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => return StreamError::from_reqwest(err),
            };
            for event in decoder.feed(&chunk) {
                if event.is_message() {
                    sink.emit(EngineEvent::StreamFrame {
                        run_id,
                        data: event.data,
                    });
                } else {
                    engine_debug!("{} skipping {:?} event", RunLabel(run_id), event.event);
                }
            }
        }
        StreamError::Closed
    }
}

#[async_trait::async_trait]
impl StreamClient for ReqwestStreamClient {
    async fn run(
        &self,
        run_id: RunId,
        query: &StreamQuery,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) {
        let url = match query.to_url(&self.settings.api_base) {
            Ok(url) => url,
            Err(error) => {
                sink.emit(EngineEvent::StreamDisrupted {
                    run_id,
                    error,
                    will_retry: false,
                });
                return;
            }
        };

        let policy = &self.settings.reconnect;
        let mut decoder = SseDecoder::new();
        let mut failures: u32 = 0;

        loop {
            engine_info!("{} connecting to {}", RunLabel(run_id), url.path());
            let mut opened = false;
            let error = tokio::select! {
                _ = cancel.cancelled() => break,
                error = self.connect_once(run_id, &url, &mut decoder, sink, &mut opened) => error,
            };
            if cancel.is_cancelled() {
                break;
            }

            if opened {
                failures = 0;
            }
            failures += 1;
            decoder.discard_pending();

            let will_retry = error.is_retryable() && failures <= policy.max_attempts;
            engine_warn!(
                "{} stream disrupted: {} (attempt {}, retry: {})",
                RunLabel(run_id),
                error,
                failures,
                will_retry
            );
            sink.emit(EngineEvent::StreamDisrupted {
                run_id,
                error,
                will_retry,
            });
            if !will_retry {
                break;
            }

            let delay = policy.delay_for(failures, decoder.retry());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        engine_debug!("{} stream task finished", RunLabel(run_id));
    }
}

fn is_event_stream(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    mime.eq_ignore_ascii_case("text/event-stream")
}
