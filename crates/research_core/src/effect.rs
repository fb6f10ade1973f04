use crate::{ResultField, RunId, Session, StreamParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenStream { run_id: RunId, params: StreamParams },
    CloseStream { run_id: RunId },
    Notify(Notification),
    ExportResult(ExportRequest),
    PersistSession(Session),
    ClearSession,
}

/// A toast shown once, independent of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: NotificationSeverity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: NotificationSeverity::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: NotificationSeverity::Destructive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    Info,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub company: String,
    pub fields: Vec<ResultField>,
}
