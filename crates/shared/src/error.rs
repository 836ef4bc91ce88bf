use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("topic is empty")]
    Empty,
}

/// Body the analysis service attaches to failure responses.
///
/// `detail` is kept as a raw JSON value: validation failures carry a list of
/// issues there instead of a sentence, and only a plain string is shown to
/// the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_message(&self) -> Option<&str> {
        match &self.detail {
            Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => {
                Some(detail.as_str())
            }
            _ => None,
        }
    }
}
