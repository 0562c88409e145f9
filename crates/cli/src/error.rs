use connectors::{
    error::{NotifyError, ServiceError},
    file::csv::error::FileError,
};
use engine_config::settings::error::SettingsError;
use engine_runtime::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to read or write the workbook: {0}")]
    Workbook(#[from] FileError),

    #[error("Check service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Failed to set up notifications: {0}")]
    Notify(#[from] NotifyError),

    #[error("Failed to run the indexation check: {0}")]
    Runner(#[from] RunError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
