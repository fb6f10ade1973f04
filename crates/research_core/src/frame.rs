use serde_json::{json, Value};

use crate::timeline::compact_text;

/// Value of a frame's `type` field that the controller acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    Update,
    Warning,
    Success,
    Complete,
    Error,
}

impl Discriminator {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "update" => Some(Discriminator::Update),
            "warning" => Some(Discriminator::Warning),
            "success" => Some(Discriminator::Success),
            "complete" => Some(Discriminator::Complete),
            "error" => Some(Discriminator::Error),
            _ => None,
        }
    }
}

/// One inbound frame after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Update { message: String, raw: Value },
    Warning { message: String, raw: Value },
    Success { message: String, raw: Value },
    Complete { result: Value, raw: Value },
    Error { message: String, raw: Value },
    /// Frame text that is not JSON. Kept as an informational entry.
    Malformed { text: String },
    /// JSON without a recognised `type`. Dropped by the controller.
    Unrecognized { discriminator: Option<String> },
}

pub const DEFAULT_SUCCESS_MESSAGE: &str = "done";
pub const DEFAULT_ERROR_MESSAGE: &str = "Analysis failed";

impl Frame {
    pub fn classify(text: &str) -> Frame {
        let raw: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                return Frame::Malformed {
                    text: text.to_string(),
                }
            }
        };

        let tag = raw.get("type").and_then(Value::as_str).map(str::to_owned);
        let Some(discriminator) = tag.as_deref().and_then(Discriminator::parse) else {
            return Frame::Unrecognized { discriminator: tag };
        };

        let message = message_of(&raw);
        match discriminator {
            Discriminator::Update => Frame::Update {
                message: message.unwrap_or_default(),
                raw,
            },
            Discriminator::Warning => Frame::Warning {
                message: message.unwrap_or_default(),
                raw,
            },
            Discriminator::Success => Frame::Success {
                message: message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
                raw,
            },
            Discriminator::Complete => Frame::Complete {
                result: raw.get("result").cloned().unwrap_or(Value::Null),
                raw,
            },
            Discriminator::Error => Frame::Error {
                message: message.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
                raw,
            },
        }
    }

    /// Payload kept on the timeline entry for the detail surface.
    pub fn malformed_payload(text: &str) -> Value {
        json!({ "raw": text })
    }
}

fn message_of(raw: &Value) -> Option<String> {
    match raw.get("message") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let text = compact_text(value);
            (!text.is_empty()).then_some(text)
        }
    }
}
