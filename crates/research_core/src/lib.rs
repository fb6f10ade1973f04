//! Research core: pure state machine, stream controller and view-model helpers.
mod controller;
mod effect;
mod frame;
mod msg;
mod request;
mod results;
mod state;
mod timeline;
mod update;
mod view_model;

pub use controller::{
    ConnectionState, ControllerOutput, Outcome, Run, RunHandle, RunId, StreamController,
    AUTH_REQUIRED_MESSAGE, AUTH_REQUIRED_REASON, COMPLETED_MESSAGE, GAVE_UP_MESSAGE,
    RESTORED_MESSAGE, RETRYING_MESSAGE,
};
pub use effect::{Effect, ExportRequest, Notification, NotificationSeverity};
pub use frame::{Discriminator, Frame};
pub use msg::Msg;
pub use request::{
    validate_schema, AnalysisRequest, ExtractionSchema, RequestError, ResearchForm,
    SchemaError, SchemaTemplate, StreamParams,
};
pub use results::{format_key, render_value, ResearchResult, ResultField, ResultsView};
pub use state::{AppState, Identity, Session};
pub use timeline::{
    compact_text, BadgeSeverity, EventId, EventKind, Timeline, TimelineEvent, TimelineViewport,
};
pub use update::update;
pub use view_model::{AppViewModel, EntryDetail, RunView, TimelineEntryView};
