//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in order,
//! later sources winning:
//!
//! 1. built-in defaults ([`TestbedConfig::default`])
//! 2. the base file (`config/testbed.toml`, or `$TESTBED_CONFIG`)
//! 3. the environment file next to it (`testbed.<env>.toml`)
//! 4. `TESTBED__*` environment variables

use super::TestbedConfig;
use crate::constants;
use crate::error::Result;
use ::config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "config/testbed.toml";

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TestbedConfig,
    environment: String,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection; missing files are skipped
    pub fn load() -> Result<Arc<ConfigManager>> {
        let path = env::var(constants::env::CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_layered(Some(path), false)
    }

    /// Load configuration from a specific file, which must exist
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Arc<ConfigManager>> {
        Self::load_layered(Some(path.as_ref().to_path_buf()), true)
    }

    /// Defaults plus environment variable overrides only
    pub fn from_env() -> Result<Arc<ConfigManager>> {
        Self::load_layered(None, false)
    }

    /// Wrap an already-built configuration
    pub fn from_config(config: TestbedConfig) -> Result<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            source: None,
        }))
    }

    fn load_layered(path: Option<PathBuf>, required: bool) -> Result<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        let mut builder = Config::builder();

        if let Some(path) = &path {
            debug!(
                path = %path.display(),
                environment = %environment,
                "Loading testbed configuration"
            );
            builder = builder.add_source(File::from(path.as_path()).required(required));

            if let Some(env_file) = Self::environment_file(path, &environment) {
                builder = builder.add_source(File::from(env_file).required(false));
            }
        }

        let config: TestbedConfig = builder
            .add_source(
                Environment::with_prefix(constants::env::OVERRIDE_PREFIX)
                    .prefix_separator(constants::env::OVERRIDE_SEPARATOR)
                    .separator(constants::env::OVERRIDE_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::info!(
            environment = %environment,
            default_channel = config.default_channel,
            inter_test_delay_ms = config.inter_test_delay_ms,
            tick_interval_ms = config.tick_interval_ms,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            source: path,
        }))
    }

    /// `config/testbed.toml` + `test` -> `config/testbed.test.toml`
    fn environment_file(base: &Path, environment: &str) -> Option<PathBuf> {
        let stem = base.file_stem()?.to_str()?;
        let extension = base.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        Some(base.with_file_name(format!("{stem}.{environment}.{extension}")))
    }

    fn detect_environment() -> String {
        env::var(constants::env::ENVIRONMENT)
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &TestbedConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Base file the configuration was layered from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
