use chrono::{DateTime, Utc};

use crate::{EventId, ResearchForm, RunId, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Auth exchange succeeded; the session carries the credential.
    SignedIn(Session),
    /// User logged out.
    SignedOut,
    /// User submitted the research form.
    ResearchSubmitted { form: ResearchForm, at: DateTime<Utc> },
    /// Transport opened (or re-opened) the channel for a run.
    StreamOpened { run_id: RunId, at: DateTime<Utc> },
    /// One frame delivered by the transport.
    FrameReceived {
        run_id: RunId,
        data: String,
        at: DateTime<Utc>,
    },
    /// Transport lost the connection.
    StreamDisrupted {
        run_id: RunId,
        reason: String,
        will_retry: bool,
        at: DateTime<Utc>,
    },
    /// User abandoned the current run.
    CancelClicked,
    /// The view owning the timeline is going away.
    ViewClosed,
    /// Pointer rests on a timeline entry.
    EntryHovered { event_id: EventId },
    HoverCleared,
    /// User scrolled the timeline by `delta` rows.
    TimelineScrolled { delta: isize },
    /// User asked for the results document.
    ExportClicked,
    /// Export effect finished with the written path or an error message.
    ExportFinished(Result<String, String>),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
