use std::ops::Range;

use crate::{BadgeSeverity, ConnectionState, EventId, ResultsView, RunId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub signed_in_as: Option<String>,
    pub is_researching: bool,
    pub run: Option<RunView>,
    pub results: Option<ResultsView>,
    pub hovered: Option<EntryDetail>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunView {
    pub run_id: RunId,
    pub company: String,
    pub connection: ConnectionState,
    pub connected: bool,
    pub complete: bool,
    pub entries: Vec<TimelineEntryView>,
    /// Entries inside the timeline viewport.
    pub visible: Range<usize>,
}

impl RunView {
    pub fn status_label(&self) -> &'static str {
        if self.complete {
            "Complete"
        } else if self.connection == ConnectionState::Closed {
            "Closed"
        } else if self.connected {
            "Connected"
        } else {
            "Initiating..."
        }
    }

    pub fn visible_entries(&self) -> &[TimelineEntryView] {
        let end = self.visible.end.min(self.entries.len());
        let start = self.visible.start.min(end);
        &self.entries[start..end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntryView {
    pub id: EventId,
    pub icon: &'static str,
    pub badge: &'static str,
    pub severity: BadgeSeverity,
    pub message: String,
    pub time_label: String,
    pub has_detail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetail {
    pub id: EventId,
    pub message: String,
    pub fields: Vec<(String, String)>,
}
