use thiserror::Error;

/// Errors raised while talking to the remote check service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection failure, timeout or any other transport-level problem.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be decoded into the expected payload.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// The service answered but reported a non-zero status code in its payload.
    #[error("Request rejected by the service (code {code}): {body}")]
    Rejected { code: i64, body: String },
}

impl ServiceError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::Rejected { .. })
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}
