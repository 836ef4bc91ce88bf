use serde::{Deserialize, Serialize};

use crate::error::TopicError;

/// A validated analysis request. The topic is always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    topic: String,
}

impl AnalysisRequest {
    pub fn new(raw_topic: &str) -> Result<Self, TopicError> {
        let topic = raw_topic.trim();
        if topic.is_empty() {
            return Err(TopicError::Empty);
        }
        Ok(Self {
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Success,
    Error,
}

impl Phase {
    pub fn is_busy(self) -> bool {
        self == Phase::Submitting
    }
}
