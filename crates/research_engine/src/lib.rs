//! Research engine: stream transport, HTTP clients, export and effect execution.
mod analyze;
mod auth;
mod endpoint;
mod engine;
mod export;
mod filename;
mod output;
mod sse;
mod stream;
mod types;

pub use analyze::{AnalyzeClient, AnalyzeError, AnalyzePayload, ANALYZE_FAILED_MESSAGE};
pub use auth::{AuthClient, AuthError, AuthSession, LoginCredentials, SignupCredentials};
pub use endpoint::{endpoint_url, parse_base_url};
pub use engine::{EngineError, EngineHandle};
pub use export::{
    build_document, export_document, DocLine, ExportDocument, ExportError, ExportOptions,
    ExportSummary, Page,
};
pub use filename::export_filename;
pub use output::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use sse::{SseDecoder, SseEvent};
pub use stream::{
    ChannelEventSink, EventSink, ReconnectPolicy, ReqwestStreamClient, StreamClient,
    StreamQuery, StreamSettings,
};
pub use types::{EngineEvent, RunId, StreamError};
