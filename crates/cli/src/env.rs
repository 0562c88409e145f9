use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::CliError;

pub const API_KEY_VAR: &str = "SPEEDYINDEX_API_KEY";
pub const SLACK_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
pub const SLACK_CHANNEL_VAR: &str = "SLACK_CHANNEL_ID";

/// Environment variable manager that loads from system and .env files
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
    sensitive_patterns: Vec<String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self {
            vars: std::env::vars().collect(),
            sensitive_patterns: Self::default_sensitive_patterns(),
        }
    }

    /// Load variables from a .env file. Values from the file win over the
    /// process environment.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        let loaded = self.parse_env_content(&content)?;
        debug!("Loaded {} variables from {}", loaded, path.display());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, CliError> {
        self.get(key)
            .ok_or_else(|| CliError::MissingEnv(key.to_string()))
    }

    /// Value safe to print: secrets are masked.
    pub fn display_value(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        if self.is_sensitive(key) {
            let visible: String = value.chars().take(4).collect();
            Some(format!("{visible}****"))
        } else {
            Some(value.to_string())
        }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive_patterns.iter().any(|p| key.contains(p))
    }

    fn parse_env_content(&mut self, content: &str) -> Result<usize, CliError> {
        let mut loaded = 0;
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value));
            loaded += 1;
        }

        Ok(loaded)
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }

        value.to_string()
    }

    fn default_sensitive_patterns() -> Vec<String> {
        ["secret", "token", "key", "auth", "password"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}
