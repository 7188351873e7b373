use async_trait::async_trait;

use models::{Report, ReportId, ReportInput};

use crate::errors::ServiceError;

/// Trait abstraction for report persistence.
/// Implementations can be file-backed, database-backed, or in-memory.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// All reports, newest first.
    async fn list(&self) -> Result<Vec<Report>, ServiceError>;
    /// Store a new report under a freshly allocated id and return it.
    async fn add(&self, input: ReportInput) -> Result<Report, ServiceError>;
    /// Remove every report carrying `id`; `NotFound` when there was none.
    async fn delete(&self, id: &ReportId) -> Result<(), ServiceError>;
}
