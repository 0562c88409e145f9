use crate::error::ServiceError;
use async_trait::async_trait;
use model::core::identifiers::JobId;

pub mod speedyindex;
pub mod types;

pub use speedyindex::{ClientConfig, SpeedyIndexClient};
pub use types::TaskStatus;

/// The remote asynchronous indexation-check service.
///
/// Implementations are shared by every sheet pipeline of a run and must be
/// safe to call concurrently.
#[async_trait]
pub trait CheckService: Send + Sync {
    /// Remaining checker balance. Display only.
    async fn balance(&self) -> Result<f64, ServiceError>;

    /// Submits one job and returns the identifier the service assigned to it.
    async fn create_task(&self, title: &str, urls: &[String]) -> Result<JobId, ServiceError>;

    /// Status of every listed job the service knows about.
    async fn task_status(&self, ids: &[JobId]) -> Result<Vec<TaskStatus>, ServiceError>;

    /// Targets confirmed positive for a completed job.
    async fn task_report(&self, id: &JobId) -> Result<Vec<String>, ServiceError>;
}
