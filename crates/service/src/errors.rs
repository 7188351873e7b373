use thiserror::Error;

use models::ReportId;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("snapshot {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
    #[error("storage error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("report id sequence exhausted")]
    IdExhausted,
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn report_not_found(id: &ReportId) -> Self {
        Self::NotFound(format!("report with id {id} not found"))
    }
}
