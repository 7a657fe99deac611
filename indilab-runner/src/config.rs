//! Pipeline configuration loaded from TOML.
//!
//! Every section and field is optional; missing values take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use indilab_core::EngineConfig;

/// Worker count used when neither config nor CLI sets one.
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Pooled connections; defaults to the worker count.
    pub pool_size: Option<u32>,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("indilab.db"),
            pool_size: None,
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub workers: usize,
    /// Instrument codes to process; empty means all.
    pub codes: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            codes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub store: StoreConfig,
    pub dispatch: DispatchConfig,
    pub engine: EngineConfig,
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.workers == 0 {
            return Err(ConfigError::Invalid("dispatch.workers must be >= 1".into()));
        }
        if self.store.pool_size == Some(0) {
            return Err(ConfigError::Invalid("store.pool_size must be >= 1".into()));
        }
        self.engine
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Pool size actually used: explicit, else one connection per worker.
    pub fn pool_size(&self) -> u32 {
        self.store
            .pool_size
            .unwrap_or_else(|| u32::try_from(self.dispatch.workers).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.dispatch.workers, 10);
        assert_eq!(config.pool_size(), 10);
        assert_eq!(config.store.path, PathBuf::from("indilab.db"));
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
            [store]
            path = "/tmp/prices.db"
            pool_size = 4
            busy_timeout_ms = 250

            [dispatch]
            workers = 3
            codes = ["AAPL", "MSFT"]

            [engine]
            rsi_period = 9
            bollinger_mult = 2.5

            [engine.kama]
            window = 8
        "#;
        let config = PipelineConfig::from_toml(toml).unwrap();
        assert_eq!(config.store.pool_size, Some(4));
        assert_eq!(config.pool_size(), 4);
        assert_eq!(config.store.busy_timeout_ms, 250);
        assert_eq!(config.dispatch.codes, vec!["AAPL", "MSFT"]);
        assert_eq!(config.engine.rsi_period, 9);
        assert_eq!(config.engine.cci_period, 20);
        assert_eq!(config.engine.kama.window, 8);
        assert_eq!(config.engine.kama.pow2, 30);
    }

    #[test]
    fn zero_workers_rejected() {
        let err = PipelineConfig::from_toml("[dispatch]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_engine_period_rejected() {
        let err = PipelineConfig::from_toml("[engine]\natr_period = 0\n").unwrap_err();
        assert!(err.to_string().contains("atr_period"));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = PipelineConfig::from_toml("[dispatch\nworkers = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/indilab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/indilab.toml"));
    }
}
