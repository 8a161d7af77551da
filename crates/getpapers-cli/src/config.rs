//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// File configuration for get-papers-list
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pubmed: PubmedConfig,
    pub fetch: FetchConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PubmedConfig {
    pub base_url: String,
    pub tool: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub email: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
}

impl Default for PubmedConfig {
    fn default() -> Self {
        let defaults = getpapers_pubmed::Config::default();
        Self {
            base_url: defaults.base_url,
            tool: defaults.tool,
            email: std::env::var("NCBI_EMAIL").ok(),
            api_key: std::env::var("NCBI_API_KEY").ok(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_results: usize,
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let defaults = getpapers_pubmed::Config::default();
        Self {
            max_results: defaults.max_results,
            batch_size: defaults.batch_size,
            max_concurrency: defaults.max_concurrency,
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub calls: usize,
    pub period_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let defaults = getpapers_pubmed::Config::default();
        Self {
            calls: defaults.rate_limit_calls,
            period_ms: defaults.rate_limit_period.as_millis() as u64,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./getpapers.toml (current directory)
    /// 2. ~/.config/getpapers/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("getpapers.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "getpapers") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Pipeline settings from this file configuration
    pub fn pipeline(&self) -> getpapers_pubmed::Config {
        getpapers_pubmed::Config {
            base_url: self.pubmed.base_url.clone(),
            tool: self.pubmed.tool.clone(),
            email: self.pubmed.email.clone(),
            api_key: self.pubmed.api_key.clone(),
            max_results: self.fetch.max_results,
            batch_size: self.fetch.batch_size,
            max_concurrency: self.fetch.max_concurrency,
            rate_limit_calls: self.rate_limit.calls,
            rate_limit_period: Duration::from_millis(self.rate_limit.period_ms),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_pipeline_defaults() {
        let pipeline = Config::default().pipeline();
        assert_eq!(pipeline.max_results, 300);
        assert_eq!(pipeline.batch_size, 50);
        assert_eq!(pipeline.max_concurrency, 5);
        assert_eq!(pipeline.rate_limit_calls, 3);
        assert_eq!(pipeline.rate_limit_period, Duration::from_secs(1));
        assert_eq!(pipeline.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("GETPAPERS_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${GETPAPERS_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("GETPAPERS_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(
            expand_env_var("ops@example.org"),
            Some("ops@example.org".to_string())
        );
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[pubmed]
email = "ops@example.org"
api_key = "${NONEXISTENT_VAR_12345}"

[fetch]
max_results = 120
batch_size = 20

[rate_limit]
calls = 10
period_ms = 1000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.pubmed.email.as_deref(), Some("ops@example.org"));
        assert!(config.pubmed.api_key.is_none());
        assert!(config.pubmed.base_url.starts_with("https://"));

        let pipeline = config.pipeline();
        assert_eq!(pipeline.max_results, 120);
        assert_eq!(pipeline.batch_size, 20);
        assert_eq!(pipeline.max_concurrency, 5);
        assert_eq!(pipeline.rate_limit_calls, 10);
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[fetch\nmax_results = ").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
