//! Configuration loading and representation.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional config file (`HUBLEDGER_CONFIG`, or the path passed to [`LedgerConfig::load_from`])
//! 3. `HUBLEDGER__*` environment variables, `__` separating sections
//!    (e.g. `HUBLEDGER__STORAGE__BACKEND=postgres`)

use std::env;

use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;

pub use hubledger_observability::{LogConfig, LogFormat};

const ENV_PREFIX: &str = "HUBLEDGER";
const CONFIG_PATH_VAR: &str = "HUBLEDGER_CONFIG";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which store implementation backs the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Run bundled migrations when the Postgres store connects.
    pub run_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Transparent retries of an adjustment after a transient write conflict.
    pub max_conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub log: LogConfig,
}

impl LedgerConfig {
    /// Load from defaults, `HUBLEDGER_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_VAR).ok();
        Self::load_from(path.as_deref())
    }

    /// Load from defaults, an optional file and the process environment.
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::build(path, None)
    }

    fn build(path: Option<&str>, vars: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("storage.backend", "memory")?
            .set_default("storage.max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
            .set_default("storage.run_migrations", true)?
            .set_default(
                "engine.max_conflict_retries",
                i64::from(DEFAULT_MAX_CONFLICT_RETRIES),
            )?
            .set_default("log.level", "info")?
            .set_default("log.format", "json")?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        let cfg: LedgerConfig = config.try_deserialize()?;
        cfg.validate()?;

        tracing::debug!(backend = ?cfg.storage.backend, "configuration loaded");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Postgres
            && self
                .storage
                .database_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "storage.database_url is required when storage.backend = postgres".to_string(),
            ));
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_use_memory_backend() {
        let cfg = LedgerConfig::build(None, Some(Map::new())).unwrap();
        assert_eq!(cfg, LedgerConfig::default());
        assert_eq!(cfg.engine.max_conflict_retries, 3);
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let cfg = LedgerConfig::build(
            None,
            Some(vars(&[
                ("HUBLEDGER__STORAGE__BACKEND", "postgres"),
                ("HUBLEDGER__STORAGE__DATABASE_URL", "postgres://localhost/hubledger"),
                ("HUBLEDGER__STORAGE__MAX_CONNECTIONS", "4"),
                ("HUBLEDGER__ENGINE__MAX_CONFLICT_RETRIES", "5"),
                ("HUBLEDGER__LOG__FORMAT", "pretty"),
            ])),
        )
        .unwrap();

        assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
        assert_eq!(
            cfg.storage.database_url.as_deref(),
            Some("postgres://localhost/hubledger")
        );
        assert_eq!(cfg.storage.max_connections, 4);
        assert_eq!(cfg.engine.max_conflict_retries, 5);
        assert_eq!(cfg.log.format, LogFormat::Pretty);
    }

    #[test]
    fn postgres_without_url_is_rejected() {
        let err = LedgerConfig::build(
            None,
            Some(vars(&[("HUBLEDGER__STORAGE__BACKEND", "postgres")])),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_connections_is_rejected() {
        let mut cfg = LedgerConfig::default();
        cfg.storage.max_connections = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = LedgerConfig::build(Some("/nonexistent/hubledger"), Some(Map::new()));
        assert!(matches!(err, Err(ConfigError::Load(_))));
    }
}
