//! Configuration management for the Elidune catalog

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON document per dataset
    pub data_dir: PathBuf,
    /// Write indented JSON
    pub pretty: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (ELIDUNE_CATALOG_STORAGE__DATA_DIR, ...)
            .add_source(
                Environment::with_prefix("ELIDUNE_CATALOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("storage.data_dir", env::var("CATALOG_DATA_DIR").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn log_directive(&self) -> String {
        format!("elidune_catalog={}", self.logging.level)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.format.eq_ignore_ascii_case("json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            pretty: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
