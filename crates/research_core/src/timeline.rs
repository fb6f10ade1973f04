use chrono::{DateTime, Utc};
use serde_json::Value;

pub type EventId = u64;

/// Payload keys already surfaced by the entry itself.
const SURFACED_KEYS: &[&str] = &["type", "timestamp", "message"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Error,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Success => "success",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            EventKind::Info => "◷",
            EventKind::Success => "✔",
            EventKind::Warning => "⚠",
            EventKind::Error => "✖",
        }
    }

    pub fn severity(self) -> BadgeSeverity {
        match self {
            EventKind::Info => BadgeSeverity::Outline,
            EventKind::Success => BadgeSeverity::Default,
            EventKind::Warning => BadgeSeverity::Secondary,
            EventKind::Error => BadgeSeverity::Destructive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSeverity {
    Default,
    Secondary,
    Destructive,
    Outline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub id: EventId,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
    pub kind: EventKind,
    pub raw: Option<Value>,
}

impl TimelineEvent {
    /// `HH:MM:SS.mmm`, 24h.
    pub fn time_label(&self) -> String {
        self.occurred_at.format("%H:%M:%S%.3f").to_string()
    }

    /// Payload fields for the detail surface, minus the ones the entry already shows.
    pub fn detail_fields(&self) -> Vec<(String, String)> {
        let Some(Value::Object(map)) = &self.raw else {
            return Vec::new();
        };
        map.iter()
            .filter(|(key, _)| !SURFACED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), compact_text(value)))
            .collect()
    }
}

/// Strings as-is, everything else as compact JSON.
pub fn compact_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Append-only event log for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
    next_id: EventId,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        kind: EventKind,
        message: impl Into<String>,
        raw: Option<Value>,
        at: DateTime<Utc>,
    ) -> EventId {
        self.next_id += 1;
        let id = self.next_id;
        self.events.push(TimelineEvent {
            id,
            message: message.into(),
            occurred_at: at,
            kind,
            raw,
        });
        id
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn get(&self, id: EventId) -> Option<&TimelineEvent> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Scrollable window over the timeline that sticks to the newest entry
/// until the user scrolls away from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineViewport {
    height: usize,
    offset: usize,
    follow: bool,
}

impl Default for TimelineViewport {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_HEIGHT)
    }
}

pub const DEFAULT_VIEWPORT_HEIGHT: usize = 12;

impl TimelineViewport {
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(1),
            offset: 0,
            follow: true,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Called after the timeline grows to `len` entries.
    pub fn on_append(&mut self, len: usize) {
        if self.follow {
            self.offset = self.bottom(len);
        }
    }

    /// Scrolls by `delta` rows; reaching the bottom re-enables following.
    pub fn scroll(&mut self, delta: isize, len: usize) {
        let bottom = self.bottom(len);
        let target = self.offset.saturating_add_signed(delta).min(bottom);
        self.offset = target;
        self.follow = target == bottom;
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.follow = true;
    }

    /// Index range of visible entries.
    pub fn visible(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(len);
        let end = (start + self.height).min(len);
        start..end
    }

    fn bottom(&self, len: usize) -> usize {
        len.saturating_sub(self.height)
    }
}
