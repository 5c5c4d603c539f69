//! Startup configuration.
//!
//! Loaded once from TOML (all sections optional) and optionally overridden by
//! environment variables. The resulting values are injected into the request
//! layer and the tracker; nothing reads the environment after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::transport::SimulatedFailure;

/// Environment variable selecting `simulated` or `real` mode.
pub const ENV_API_MODE: &str = "ORDER_SYNC_API_MODE";
/// Environment variable overriding the backend base address.
pub const ENV_API_BASE_URL: &str = "ORDER_SYNC_API_BASE_URL";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.message().to_string())
    }
}

/// Whether requests hit the real backend or the in-process simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Simulated,
    Real,
}

impl FromStr for ApiMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "mock" => Ok(ApiMode::Simulated),
            "real" | "live" => Ok(ApiMode::Real),
            other => Err(ConfigError::Validation(format!("Unknown API mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub mode: ApiMode,
    pub base_url: String,
    pub path_prefix: Option<String>,
    /// Bound on each individual attempt.
    pub timeout_ms: u64,
    /// Fixed delay between a failed attempt and its retry.
    pub backoff_ms: u64,
    /// Retries granted to each logical request by the typed clients.
    pub retry_budget: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: ApiMode::Simulated,
            base_url: "http://localhost:8002".to_string(),
            path_prefix: None,
            timeout_ms: 8_000,
            backoff_ms: 500,
            retry_budget: 1,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Artificial latency added to every simulated response.
    pub latency_ms: u64,
    pub failure: Option<SimulatedFailure>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_ms: 350,
            failure: None,
        }
    }
}

impl SimulationConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Poll interval; defaults to 3 s when simulated and 4 s against a real backend.
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the file-backed store. In-memory when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub api: ApiConfig,
    pub simulation: SimulationConfig,
    pub tracking: TrackingConfig,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            api: ApiConfig::default(),
            simulation: SimulationConfig::default(),
            tracking: TrackingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&raw)
    }

    /// Applies [`ENV_API_MODE`] and [`ENV_API_BASE_URL`] from `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_API_MODE) {
            self.api.mode = mode.parse()?;
        }
        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            self.api.base_url = base_url;
        }
        self.validate()?;
        Ok(self)
    }

    /// Effective poll interval for the configured mode.
    pub fn poll_interval(&self) -> Duration {
        let default_ms = match self.api.mode {
            ApiMode::Simulated => 3_000,
            ApiMode::Real => 4_000,
        };
        Duration::from_millis(self.tracking.interval_ms.unwrap_or(default_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.mode == ApiMode::Real && self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.base_url cannot be empty in real mode".into(),
            ));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Validation("api.timeout_ms must be positive".into()));
        }
        if self.tracking.interval_ms == Some(0) {
            return Err(ConfigError::Validation(
                "tracking.interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api.mode, ApiMode::Simulated);
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_full_document() {
        let config = AppConfig::from_toml_str(
            r#"
            log_level = "debug"

            [api]
            mode = "real"
            base_url = "https://canteen.example.edu"
            path_prefix = "/api"
            timeout_ms = 2000
            retry_budget = 3

            [simulation]
            failure = "server_error"

            [tracking]
            interval_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.api.mode, ApiMode::Real);
        assert_eq!(config.api.path_prefix.as_deref(), Some("/api"));
        assert_eq!(config.api.timeout(), Duration::from_secs(2));
        assert_eq!(config.api.backoff_ms, 500);
        assert_eq!(config.simulation.failure, Some(SimulatedFailure::ServerError));
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_validation_errors() {
        let err = AppConfig::from_toml_str("[api]\ntimeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = AppConfig::from_toml_str("[api]\nmode = \"real\"\nbase_url = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = AppConfig::from_toml_str("[api]\nmode = \"sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .apply_env(|key| match key {
                ENV_API_MODE => Some("real".to_string()),
                ENV_API_BASE_URL => Some("http://10.0.0.2:9000".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.api.mode, ApiMode::Real);
        assert_eq!(config.api.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.poll_interval(), Duration::from_secs(4));

        let err = AppConfig::default()
            .apply_env(|key| (key == ENV_API_MODE).then(|| "bogus".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
