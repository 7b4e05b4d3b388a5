//! Configuration management for the token limiter.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LimiterError, Result};
use crate::ratelimit::LimiterOptions;

/// Prefix for environment overrides, e.g. `TOKEN_LIMITER__LIMITER__INTERVAL_MS`.
pub const ENV_PREFIX: &str = "TOKEN_LIMITER";

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rate limiter options
    #[serde(default)]
    pub limiter: LimiterOptions,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| LimiterError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load configuration from an optional YAML file, then apply
    /// `TOKEN_LIMITER__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder
                .add_source(config::File::from(path).format(config::FileFormat::Yaml));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_temp_config(contents: &str) -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token-limiter.yaml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    /// Sets an environment variable for the lifetime of the guard.
    struct EnvVarGuard(&'static str);

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            std::env::set_var(key, value);
            Self(key)
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            std::env::remove_var(self.0);
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.limiter.interval_ms.get(), 60_000);
        assert_eq!(config.limiter.unique_token_per_interval.get(), 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
limiter:
  interval_ms: 1000
  unique_token_per_interval: 50
logging:
  level: debug
  format: json
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.limiter.interval_ms.get(), 1_000);
        assert_eq!(config.limiter.unique_token_per_interval.get(), 50);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_parse_empty_sections_use_defaults() {
        let config = AppConfig::from_yaml("limiter: {}\n").unwrap();
        assert_eq!(config.limiter, LimiterOptions::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_rejects_zero_interval() {
        let err = AppConfig::from_yaml("limiter:\n  interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, LimiterError::Config(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/token-limiter.yaml").unwrap_err();
        assert!(matches!(err, LimiterError::Io(_)));
    }

    #[test]
    fn test_load_file_with_env_override() {
        let (_dir, path) = write_temp_config(
            "limiter:\n  interval_ms: 2000\n  unique_token_per_interval: 7\n",
        );
        let _env = EnvVarGuard::set("TOKEN_LIMITER__LIMITER__UNIQUE_TOKEN_PER_INTERVAL", "9");

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.limiter.interval_ms.get(), 2_000);
        assert_eq!(config.limiter.unique_token_per_interval.get(), 9);
    }

    #[test]
    fn test_load_rejects_zero_interval() {
        let (_dir, path) = write_temp_config("limiter:\n  interval_ms: 0\n");

        let result = AppConfig::load(Some(&path));
        assert!(matches!(result, Err(LimiterError::ConfigSource(_))));
    }

    #[test]
    fn test_env_guard_cleans_up_after_panic() {
        const KEY: &str = "TOKEN_LIMITER__LOGGING__LEVEL";
        let (dir, path) = write_temp_config("limiter:\n  interval_ms: 0\n");
        let dir_path = dir.path().to_path_buf();

        let outcome = std::panic::catch_unwind(move || {
            let _dir = dir;
            let _env = EnvVarGuard::set(KEY, "trace");
            AppConfig::load(Some(&path)).unwrap()
        });

        assert!(outcome.is_err());
        assert!(std::env::var(KEY).is_err());
        assert!(!dir_path.exists());
    }
}
