use crate::settings::{CheckerSettings, error::SettingsError, validated::ValidatedSettings};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Validates run settings before a run starts.
pub struct SettingsValidator;

impl SettingsValidator {
    pub fn validate(settings: CheckerSettings) -> Result<ValidatedSettings, SettingsError> {
        let mut errors: Vec<String> = Vec::new();

        Self::validate_columns(&settings, &mut errors);
        Self::validate_header(&settings, &mut errors);
        Self::validate_polling(&settings, &mut errors);
        Self::validate_service(&settings, &mut errors);

        if !errors.is_empty() {
            return Err(SettingsError::ValidationFailed(errors));
        }

        let validated = ValidatedSettings::new(settings);
        Self::log_validated_settings(&validated);
        Ok(validated)
    }

    fn validate_columns(settings: &CheckerSettings, errors: &mut Vec<String>) {
        if settings.target_column == settings.output_column {
            errors.push(format!(
                "output_column must differ from target_column (both are {})",
                settings.target_column
            ));
        }
    }

    fn validate_header(settings: &CheckerSettings, errors: &mut Vec<String>) {
        if settings
            .header_keywords
            .iter()
            .all(|k| k.trim().is_empty())
        {
            errors.push("header_keywords must contain at least one non-empty marker".into());
        }
        if settings.header_scan_rows == 0 {
            errors.push("header_scan_rows must be at least 1".into());
        }
        if settings.header_label.trim().is_empty() {
            errors.push("header_label must not be empty".into());
        }
    }

    fn validate_polling(settings: &CheckerSettings, errors: &mut Vec<String>) {
        if settings.max_attempts == 0 {
            errors.push("max_attempts must be at least 1".into());
        }
        if settings.poll_interval_ms < 500 {
            warn!(
                "poll_interval_ms of {} is very short and may be throttled by the service",
                settings.poll_interval_ms
            );
        }

        let max_wait = Duration::from_millis(settings.poll_interval_ms)
            .saturating_mul(settings.max_attempts);
        if max_wait > Duration::from_secs(3_600) {
            warn!(
                "Polling may wait up to {}s per job before timing out",
                max_wait.as_secs()
            );
        }
    }

    fn validate_service(settings: &CheckerSettings, errors: &mut Vec<String>) {
        if settings.provider.trim().is_empty() {
            errors.push("provider must not be empty".into());
        }
        if settings.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be at least 1".into());
        }
        match Url::parse(&settings.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )),
            Err(err) => errors.push(format!("base_url is not a valid URL: {err}")),
        }
    }

    fn log_validated_settings(settings: &ValidatedSettings) {
        let raw = settings.raw();
        info!(
            target_column = %raw.target_column,
            output_column = %raw.output_column,
            mode = %raw.mode,
            max_attempts = raw.max_attempts,
            poll_interval_ms = raw.poll_interval_ms,
            "Settings validated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::identifiers::Column;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SettingsValidator::validate(CheckerSettings::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut settings = CheckerSettings::default();
        settings.output_column = Column::nth(2);
        settings.header_keywords = vec!["  ".into()];
        settings.max_attempts = 0;
        settings.base_url = "ftp://example.test".into();

        let Err(SettingsError::ValidationFailed(errors)) = SettingsValidator::validate(settings)
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("output_column")));
        assert!(errors.iter().any(|e| e.contains("header_keywords")));
        assert!(errors.iter().any(|e| e.contains("max_attempts")));
        assert!(errors.iter().any(|e| e.contains("base_url")));
    }

    #[test]
    fn test_rejects_unparsable_base_url() {
        let mut settings = CheckerSettings::default();
        settings.base_url = "not a url".into();
        assert!(SettingsValidator::validate(settings).is_err());
    }
}
