use crate::settings::{CheckerSettings, RunMode, SheetLayout};
use connectors::check::ClientConfig;
use engine_core::retry::PollPolicy;
use std::time::Duration;

/// Immutable, validated configuration used throughout a run.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    settings: CheckerSettings,
}

impl ValidatedSettings {
    /// Only the validator builds this; see [`super::validator::SettingsValidator`].
    pub(crate) fn new(mut settings: CheckerSettings) -> Self {
        settings.header_keywords = settings
            .header_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { settings }
    }

    pub fn raw(&self) -> &CheckerSettings {
        &self.settings
    }

    pub fn mode(&self) -> RunMode {
        self.settings.mode
    }

    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            target_column: self.settings.target_column,
            output_column: self.settings.output_column,
            header_keywords: self.settings.header_keywords.clone(),
            header_scan_rows: self.settings.header_scan_rows,
            header_label: self.settings.header_label.clone(),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.settings.max_attempts,
            Duration::from_millis(self.settings.poll_interval_ms),
        )
    }

    pub fn client_config(&self, api_key: impl Into<String>) -> ClientConfig {
        ClientConfig {
            base_url: self.settings.base_url.clone(),
            provider: self.settings.provider.clone(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(self.settings.request_timeout_secs),
        }
    }

    /// Title of the job submitted for `sheet`.
    pub fn job_title(&self, sheet: &str) -> String {
        let prefix = self.settings.title_prefix.trim();
        if prefix.is_empty() {
            sheet.to_string()
        } else {
            format!("{prefix} {sheet}")
        }
    }

    pub fn low_balance_threshold(&self) -> f64 {
        self.settings.low_balance_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_normalized() {
        let mut raw = CheckerSettings::default();
        raw.header_keywords = vec!["  Referring Page URL ".into(), "".into(), "Source".into()];
        let settings = ValidatedSettings::new(raw);

        assert_eq!(
            settings.layout().header_keywords,
            vec!["referring page url", "source"]
        );
    }

    #[test]
    fn test_job_title() {
        let mut raw = CheckerSettings::default();
        assert_eq!(
            ValidatedSettings::new(raw.clone()).job_title("Backlinks"),
            "Streamlit Backlinks"
        );
        raw.title_prefix = " ".into();
        assert_eq!(ValidatedSettings::new(raw).job_title("Backlinks"), "Backlinks");
    }

    #[test]
    fn test_derived_configs() {
        let mut raw = CheckerSettings::default();
        raw.poll_interval_ms = 250;
        raw.max_attempts = 8;
        raw.request_timeout_secs = 7;
        let settings = ValidatedSettings::new(raw);

        let policy = settings.poll_policy();
        assert_eq!(policy.max_attempts, 8);
        assert_eq!(policy.interval, Duration::from_millis(250));

        let client = settings.client_config("key");
        assert_eq!(client.api_key, "key");
        assert_eq!(client.provider, "google");
        assert_eq!(client.timeout, Duration::from_secs(7));
    }
}
