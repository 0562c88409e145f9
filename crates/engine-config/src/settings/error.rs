use thiserror::Error;

/// Errors raised when loading or validating run settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid run mode: {0}")]
    InvalidMode(String),

    /// One entry per rejected field.
    #[error("Settings validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}
