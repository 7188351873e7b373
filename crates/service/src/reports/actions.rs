//! Caller-facing report operations.
//!
//! Every failure is logged and folded into an [`ActionResult`]; nothing is
//! propagated to the form or the dashboard. The [`FailureKind`] next to it
//! lets an HTTP layer pick a status without parsing messages.

use std::sync::Arc;

use common::types::ActionResult;
use models::{Report, ReportId, ReportInput};
use tracing::{error, info};

use super::repository::ReportRepository;
use crate::errors::ServiceError;

pub const SUBMIT_OK: &str = "Report submitted successfully!";
pub const SUBMIT_FAILED: &str = "Failed to submit report.";
pub const DELETE_OK: &str = "Report deleted successfully!";
pub const DELETE_FAILED: &str = "Failed to delete report.";

/// Why an action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The input was refused before anything was written.
    Invalid,
    NotFound,
    /// The snapshot could not be read or written, or no id was left to allocate.
    Storage,
}

impl From<&ServiceError> for FailureKind {
    fn from(e: &ServiceError) -> Self {
        match e {
            ServiceError::Validation(_) => FailureKind::Invalid,
            ServiceError::NotFound(_) => FailureKind::NotFound,
            ServiceError::Corrupt { .. }
            | ServiceError::Io(_)
            | ServiceError::Serialization(_)
            | ServiceError::IdExhausted => FailureKind::Storage,
        }
    }
}

/// The caller-visible result plus, on failure, its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub result: ActionResult,
    pub failure: Option<FailureKind>,
}

impl ActionOutcome {
    fn ok(message: &str) -> Self {
        Self { result: ActionResult::ok(message), failure: None }
    }

    fn failed(message: &str, error: &ServiceError) -> Self {
        Self { result: ActionResult::failed(message), failure: Some(FailureKind::from(error)) }
    }
}

#[derive(Clone)]
pub struct ReportActions {
    repo: Arc<dyn ReportRepository>,
}

impl ReportActions {
    pub fn new(repo: Arc<dyn ReportRepository>) -> Self { Self { repo } }

    pub async fn submit_report(&self, input: ReportInput) -> ActionOutcome {
        match self.repo.add(input).await {
            Ok(report) => {
                info!(event = "report_submitted", report_id = %report.id);
                ActionOutcome::ok(SUBMIT_OK)
            }
            Err(e) => {
                error!(event = "report_submit_failed", error = %e, "error submitting report");
                ActionOutcome::failed(SUBMIT_FAILED, &e)
            }
        }
    }

    /// Reports newest first; an unreadable store yields an empty list.
    pub async fn get_reports(&self) -> Vec<Report> {
        self.repo.list().await.unwrap_or_else(|e| {
            error!(event = "report_list_failed", error = %e, "error reading reports");
            Vec::new()
        })
    }

    pub async fn delete_report(&self, id: &str) -> ActionOutcome {
        match self.repo.delete(&ReportId::from(id)).await {
            Ok(()) => ActionOutcome::ok(DELETE_OK),
            Err(e) => {
                error!(event = "report_delete_failed", report_id = %id, error = %e, "error deleting report");
                ActionOutcome::failed(DELETE_FAILED, &e)
            }
        }
    }
}
