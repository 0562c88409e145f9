use crate::error::CliError;
use clap::{Args, Subcommand};
use engine_config::settings::{
    CheckerSettings, RunMode, validated::ValidatedSettings, validator::SettingsValidator,
};
use model::core::identifiers::Column;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Check every URL of the selected sheets and write the annotated workbook
    Check {
        #[arg(long, help = "Input workbook: a .csv file or a directory of .csv files")]
        input: PathBuf,

        #[arg(long, help = "Where to write the annotated workbook")]
        output: PathBuf,

        #[arg(
            long = "sheet",
            help = "Sheet to check; repeat for several. Defaults to every sheet"
        )]
        sheets: Vec<String>,

        #[command(flatten)]
        settings: SettingsArgs,

        #[arg(
            long,
            help = "If specified, writes the JSON run report to this file"
        )]
        report: Option<PathBuf>,

        #[arg(long, help = "Print the JSON run report instead of the summary table")]
        json: bool,

        #[arg(long, help = "Do not send the chat notification")]
        no_notify: bool,
    },
    /// Show the remaining checker balance
    Balance {
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// List the sheets of a workbook and where their header rows are
    Sheets {
        #[arg(long, help = "Input workbook: a .csv file or a directory of .csv files")]
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Settings file plus per-field overrides.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    #[arg(long, help = "JSON settings file")]
    pub settings: Option<PathBuf>,

    #[arg(long, help = "Scheduling mode: sequential or batched")]
    pub mode: Option<RunMode>,

    #[arg(long, help = "Delay between status polls, in milliseconds")]
    pub poll_interval_ms: Option<u64>,

    #[arg(long, help = "Poll attempts before a job is given up")]
    pub max_attempts: Option<u32>,

    #[arg(long, help = "Column holding the URLs (letter or 1-based number)")]
    pub target_column: Option<Column>,

    #[arg(long, help = "Column receiving the results (letter or 1-based number)")]
    pub output_column: Option<Column>,
}

impl SettingsArgs {
    /// Loads the settings file when given, applies the overrides and
    /// validates the result.
    pub fn resolve(&self) -> Result<ValidatedSettings, CliError> {
        let mut settings = match &self.settings {
            Some(path) => CheckerSettings::from_file(path)?,
            None => CheckerSettings::default(),
        };

        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(interval) = self.poll_interval_ms {
            settings.poll_interval_ms = interval;
        }
        if let Some(attempts) = self.max_attempts {
            settings.max_attempts = attempts;
        }
        if let Some(column) = self.target_column {
            settings.target_column = column;
        }
        if let Some(column) = self.output_column {
            settings.output_column = column;
        }

        Ok(SettingsValidator::validate(settings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"max_attempts": 7, "mode": "batched"}"#).unwrap();

        let args = SettingsArgs {
            settings: Some(path),
            mode: Some(RunMode::Sequential),
            target_column: Some(Column::nth(3)),
            ..Default::default()
        };
        let settings = args.resolve().unwrap();

        assert_eq!(settings.mode(), RunMode::Sequential);
        assert_eq!(settings.poll_policy().max_attempts, 7);
        assert_eq!(settings.layout().target_column, Column::nth(3));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = SettingsArgs {
            output_column: Some(Column::nth(2)),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(CliError::Settings(_))));
    }
}
