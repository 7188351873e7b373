use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::FieldIssue;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// JSON error body: `{"error": title, "detail": ..., "issues": [...]}`
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
    pub issues: Vec<FieldIssue>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    #[serde(skip_serializing_if = "no_issues")]
    issues: &'a [FieldIssue],
}

fn no_issues(issues: &&[FieldIssue]) -> bool {
    issues.is_empty()
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail, issues: Vec::new() }
    }

    pub fn unprocessable(issues: Vec<FieldIssue>) -> Self {
        Self { status: StatusCode::UNPROCESSABLE_ENTITY, title: "Validation Error", detail: None, issues }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(detail.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "request failed");
        }
        let body = ErrorBody { error: self.title, detail: self.detail.as_deref(), issues: &self.issues };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
