use crate::settings::error::SettingsError;
use connectors::check::speedyindex::{DEFAULT_BASE_URL, DEFAULT_PROVIDER};
use model::core::identifiers::Column;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

pub mod error;
pub mod validated;
pub mod validator;

pub const DEFAULT_HEADER_KEYWORD: &str = "referring page url";
pub const DEFAULT_HEADER_LABEL: &str = "Index";

/// How the per-sheet pipelines are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// One sheet at a time: submit, poll, reconcile, then the next sheet.
    #[default]
    Sequential,
    /// Submit every sheet up front and poll all jobs with one status request per tick.
    Batched,
}

impl FromStr for RunMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(RunMode::Sequential),
            "batched" => Ok(RunMode::Batched),
            other => Err(SettingsError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Sequential => f.write_str("sequential"),
            RunMode::Batched => f.write_str("batched"),
        }
    }
}

/// Raw run settings as read from a settings file or assembled from flags.
///
/// Nothing here is trusted until it has gone through
/// [`validator::SettingsValidator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerSettings {
    pub target_column: Column,
    pub output_column: Column,
    pub header_keywords: Vec<String>,
    pub header_scan_rows: usize,
    pub header_label: String,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub title_prefix: String,
    pub provider: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub low_balance_threshold: f64,
    pub mode: RunMode,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        CheckerSettings {
            target_column: Column::nth(2),
            output_column: Column::nth(4),
            header_keywords: vec![DEFAULT_HEADER_KEYWORD.to_string()],
            header_scan_rows: 20,
            header_label: DEFAULT_HEADER_LABEL.to_string(),
            poll_interval_ms: 3_000,
            max_attempts: 100,
            title_prefix: "Streamlit".to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            low_balance_threshold: 1_000.0,
            mode: RunMode::Sequential,
        }
    }
}

impl CheckerSettings {
    /// Reads a JSON settings file; absent fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Where the extractor looks for URLs and writes its results.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub target_column: Column,
    pub output_column: Column,
    /// Lowercased header markers.
    pub header_keywords: Vec<String>,
    pub header_scan_rows: usize,
    pub header_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CheckerSettings::default();
        assert_eq!(settings.target_column.ordinal(), 2);
        assert_eq!(settings.output_column.ordinal(), 4);
        assert_eq!(settings.header_keywords, vec!["referring page url"]);
        assert_eq!(settings.max_attempts, 100);
        assert_eq!(settings.poll_interval_ms, 3_000);
        assert_eq!(settings.mode, RunMode::Sequential);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = CheckerSettings::from_json(
            r#"{"target_column": "C", "output_column": 6, "mode": "batched", "max_attempts": 5}"#,
        )
        .unwrap();
        assert_eq!(settings.target_column.ordinal(), 3);
        assert_eq!(settings.output_column.ordinal(), 6);
        assert_eq!(settings.mode, RunMode::Batched);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.header_label, "Index");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(CheckerSettings::from_json(r#"{"target_colum": "C"}"#).is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = CheckerSettings::from_file(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("settings.json"));

        let missing = CheckerSettings::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, SettingsError::Read { .. }));
    }

    #[test]
    fn test_run_mode_from_str() {
        assert_eq!("Batched".parse::<RunMode>().unwrap(), RunMode::Batched);
        assert_eq!("sequential".parse::<RunMode>().unwrap(), RunMode::Sequential);
        assert!("parallel".parse::<RunMode>().is_err());
    }
}
