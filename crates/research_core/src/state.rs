use crate::controller::StreamController;
use crate::results::ResearchResult;
use crate::timeline::{EventId, EventKind, TimelineViewport};
use crate::view_model::{AppViewModel, EntryDetail, RunView, TimelineEntryView};

/// Who is signed in and the credential their requests carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Identity {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    session: Option<Session>,
    controller: StreamController,
    result: Option<ResearchResult>,
    is_researching: bool,
    hovered: Option<EventId>,
    viewport: TimelineViewport,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn controller(&self) -> &StreamController {
        &self.controller
    }

    pub fn result(&self) -> Option<&ResearchResult> {
        self.result.as_ref()
    }

    pub fn is_researching(&self) -> bool {
        self.is_researching
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> AppViewModel {
        let run = self.controller.current().map(|run| {
            let timeline = run.timeline();
            let entries = timeline
                .events()
                .iter()
                .map(|event| TimelineEntryView {
                    id: event.id,
                    icon: event.kind.icon(),
                    badge: event.kind.label(),
                    severity: event.kind.severity(),
                    message: event.message.clone(),
                    time_label: event.time_label(),
                    has_detail: event.kind == EventKind::Info && !event.detail_fields().is_empty(),
                })
                .collect();
            RunView {
                run_id: run.handle().run_id,
                company: run.request().company().to_string(),
                connection: run.handle().connection_state,
                connected: run.is_connected(),
                complete: run.handle().terminal,
                entries,
                visible: self.viewport.visible(timeline.len()),
            }
        });

        let hovered = self.hovered.and_then(|id| {
            let event = self.controller.current()?.timeline().get(id)?;
            Some(EntryDetail {
                id,
                message: event.message.clone(),
                fields: event.detail_fields(),
            })
        });

        AppViewModel {
            signed_in_as: self.session.as_ref().map(|s| s.identity.display_name()),
            is_researching: self.is_researching,
            run,
            results: self.result.as_ref().map(ResearchResult::view),
            hovered,
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn controller_mut(&mut self) -> &mut StreamController {
        &mut self.controller
    }

    pub(crate) fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
        self.mark_dirty();
    }

    pub(crate) fn credential(&self) -> String {
        self.session
            .as_ref()
            .map(|s| s.credential.clone())
            .unwrap_or_default()
    }

    pub(crate) fn begin_research(&mut self) {
        self.result = None;
        self.is_researching = true;
        self.hovered = None;
        self.viewport.reset();
        self.mark_dirty();
    }

    pub(crate) fn stop_research(&mut self) {
        if self.is_researching {
            self.is_researching = false;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_result(&mut self, result: Option<ResearchResult>) {
        self.result = result;
        self.is_researching = false;
        self.mark_dirty();
    }

    pub(crate) fn timeline_len(&self) -> usize {
        self.controller
            .current()
            .map(|run| run.timeline().len())
            .unwrap_or(0)
    }

    /// Keeps the viewport pinned to the newest entry after appends.
    pub(crate) fn sync_viewport(&mut self, previous_len: usize) {
        let len = self.timeline_len();
        if len != previous_len {
            self.viewport.on_append(len);
            self.mark_dirty();
        }
    }

    pub(crate) fn scroll(&mut self, delta: isize) {
        let len = self.timeline_len();
        self.viewport.scroll(delta, len);
        self.mark_dirty();
    }

    /// Only informational entries offer a detail surface.
    pub(crate) fn hover(&mut self, id: EventId) {
        let hoverable = self
            .controller
            .current()
            .and_then(|run| run.timeline().get(id))
            .is_some_and(|event| event.kind == EventKind::Info);
        let next = hoverable.then_some(id);
        if next != self.hovered {
            self.hovered = next;
            self.mark_dirty();
        }
    }

    pub(crate) fn clear_hover(&mut self) {
        if self.hovered.take().is_some() {
            self.mark_dirty();
        }
    }
}
