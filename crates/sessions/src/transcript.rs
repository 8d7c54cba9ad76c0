//! Message log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sg_domain::message::Role;

/// A single line of a thread's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
}

impl TranscriptLine {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            role,
            content: content.into(),
        }
    }
}
