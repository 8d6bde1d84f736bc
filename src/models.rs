use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<serde_json::Value>,
}

impl AskRequest {
    /// The question text, if present and non-blank.
    pub fn question(&self) -> Option<&str> {
        self.question
            .as_ref()
            .and_then(|q| q.as_str())
            .filter(|q| !q.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ready: bool,
    pub documents: usize,
    pub metric: String,
    pub top_k: Option<usize>,
    pub timestamp: DateTime<Utc>,
}
