use connectors::error::ServiceError;
use engine_processing::error::ReconcileError;
use model::execution::summary::SheetStatus;
use thiserror::Error;

/// Failure confined to a single sheet's pipeline.
///
/// These never abort a run; the coordinator turns each one into the sheet's
/// summary entry.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Sheet '{0}' has no targets to submit")]
    NoTargets(String),

    #[error("Submission rejected: {0}")]
    SubmissionRejected(#[source] ServiceError),

    #[error("Submission failed: {0}")]
    Transport(#[source] ServiceError),

    #[error("Job did not complete after {attempts} poll attempts")]
    TimedOut { attempts: u32 },

    #[error("Polling failed: {0}")]
    PollError(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl SheetError {
    /// Classifies a failed submission.
    pub fn from_submission(err: ServiceError) -> Self {
        if err.is_rejection() {
            SheetError::SubmissionRejected(err)
        } else {
            SheetError::Transport(err)
        }
    }

    pub fn status(&self) -> SheetStatus {
        match self {
            SheetError::NoTargets(_) => SheetStatus::NoTargets,
            SheetError::SubmissionRejected(_) => SheetStatus::ApiError,
            SheetError::Transport(_) => SheetStatus::TransportError,
            SheetError::TimedOut { .. } => SheetStatus::TimedOut,
            SheetError::PollError(_) => SheetStatus::PollError,
            SheetError::Cancelled => SheetStatus::Cancelled,
            SheetError::Reconcile(_) => SheetStatus::Failed,
        }
    }
}

/// Errors that stop a run before any sheet is processed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Sheet '{0}' does not exist in the workbook")]
    UnknownSheet(String),

    #[error("The workbook holds no sheets")]
    EmptyWorkbook,
}
