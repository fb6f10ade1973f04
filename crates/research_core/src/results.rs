use serde_json::{Map, Value};

use crate::controller::Outcome;

pub const FAILED_FALLBACK_MESSAGE: &str = "Failed to research company";
pub const NO_INFORMATION_MESSAGE: &str = "No information available";

/// Terminal result of a research run, as shown in the results panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchResult {
    Success {
        company: String,
        info: Map<String, Value>,
    },
    Failure {
        message: String,
    },
}

impl ResearchResult {
    pub fn from_outcome(company: &str, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Completed(payload) => Self::from_payload(company, payload),
            Outcome::Failed(reason) => ResearchResult::Failure {
                message: if reason.is_empty() {
                    FAILED_FALLBACK_MESSAGE.to_string()
                } else {
                    reason.clone()
                },
            },
        }
    }

    /// Uses `payload.info` when present, else the payload itself.
    pub fn from_payload(company: &str, payload: &Value) -> Self {
        let info = match payload.get("info") {
            Some(Value::Object(info)) => info.clone(),
            _ => match payload {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            },
        };
        ResearchResult::Success {
            company: company.to_string(),
            info,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResearchResult::Success { .. })
    }

    pub fn view(&self) -> ResultsView {
        match self {
            ResearchResult::Success { company, info } => ResultsView::Success {
                company: company.clone(),
                fields: info
                    .iter()
                    .map(|(key, value)| ResultField {
                        key: key.clone(),
                        heading: format_key(key),
                        body: render_value(value),
                    })
                    .collect(),
            },
            ResearchResult::Failure { message } => ResultsView::Failure {
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    Success {
        company: String,
        fields: Vec<ResultField>,
    },
    Failure {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultField {
    pub key: String,
    pub heading: String,
    pub body: String,
}

/// `founded_year` -> `Founded Year`.
pub fn format_key(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Objects and arrays as indented JSON, strings verbatim.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_humanized() {
        assert_eq!(format_key("founded_year"), "Founded Year");
        assert_eq!(format_key("industry"), "Industry");
        assert_eq!(format_key("ceo__name"), "Ceo  Name");
    }

    #[test]
    fn values_render_like_the_results_panel() {
        assert_eq!(render_value(&json!("Tech")), "Tech");
        assert_eq!(render_value(&json!(1990)), "1990");
        assert_eq!(render_value(&json!(null)), "null");
        assert_eq!(render_value(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn payload_info_is_preferred_over_payload() {
        let nested = ResearchResult::from_payload("Acme", &json!({"info": {"industry": "Tech"}}));
        let flat = ResearchResult::from_payload("Acme", &json!({"industry": "Tech"}));
        assert_eq!(nested, flat);
    }
}
