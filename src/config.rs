use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_QUIZ_MINUTES: u32 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client-side settings.
///
/// Read from `<config dir>/smarthub/config.json` when present; missing fields take their
/// defaults. `SMARTHUB_URL`, `SMARTHUB_QUIZ_MINUTES` and `SMARTHUB_TIMEOUT_SECS` override the
/// file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    /// Length of the local quiz countdown. The backend exposes no per-quiz limit.
    pub quiz_duration_minutes: u32,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            quiz_duration_minutes: DEFAULT_QUIZ_MINUTES,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("smarthub").join("config.json"))
    }

    /// Loads the configuration file (if any) and applies environment overrides.
    pub fn load() -> ApiResult<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path)?,
            _ => ClientConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> ApiResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ClientConfig = serde_json::from_str(&text).map_err(|e| {
            ApiError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ApiResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SMARTHUB_URL") {
            self.base_url = url;
        }
        if let Some(minutes) = lookup("SMARTHUB_QUIZ_MINUTES") {
            self.quiz_duration_minutes = minutes.trim().parse().map_err(|_| {
                ApiError::Config(format!("SMARTHUB_QUIZ_MINUTES is not a number: {}", minutes))
            })?;
        }
        if let Some(secs) = lookup("SMARTHUB_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                ApiError::Config(format!("SMARTHUB_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ApiResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "Base URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        if self.quiz_duration_minutes == 0 {
            return Err(ApiError::Config("Quiz duration must be positive".to_string()));
        }
        Ok(())
    }

    pub fn quiz_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.quiz_duration_minutes) * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_fixed_thirty_minute_policy() {
        let config = ClientConfig::default();
        assert_eq!(config.quiz_duration(), Duration::from_secs(30 * 60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"baseUrl":"https://hub.example.edu/api"}"#).unwrap();
        assert_eq!(config.base_url, "https://hub.example.edu/api");
        assert_eq!(config.quiz_duration_minutes, 30);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let env: HashMap<&str, &str> =
            [("SMARTHUB_URL", "https://other/api"), ("SMARTHUB_QUIZ_MINUTES", "45")]
                .into_iter()
                .collect();
        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://other/api");
        assert_eq!(config.quiz_duration_minutes, 45);
    }

    #[test]
    fn bad_override_is_a_config_error() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SMARTHUB_QUIZ_MINUTES").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn zero_duration_and_bad_url_are_rejected() {
        let config = ClientConfig {
            quiz_duration_minutes: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ClientConfig {
            base_url: "localhost".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_path_reads_json() {
        let path = std::env::temp_dir().join(format!("smarthub-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"quizDurationMinutes":10,"requestTimeoutSecs":5}"#).unwrap();
        let config = ClientConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.quiz_duration_minutes, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
