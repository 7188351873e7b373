use serde::Serialize;
use thiserror::Error;

/// One rejected field of a report submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("report rejected: {} issue(s)", .0.len())]
    Rejected(Vec<FieldIssue>),
    #[error("report body could not be re-encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ModelError {
    pub fn issues(&self) -> Vec<FieldIssue> {
        match self {
            ModelError::Rejected(issues) => issues.clone(),
            ModelError::Encoding(e) => vec![FieldIssue::new("_", e.to_string())],
        }
    }
}
