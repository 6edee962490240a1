//! Configuration Loader
//!
//! Layers configuration sources with the `config` crate and validates the
//! result before handing it out.
//!
//! Precedence, lowest first:
//! 1. `BalancerConfig::default()` (via `#[serde(default)]`)
//! 2. TOML file: the explicit path, `$BALANCER_CONFIG_FILE`, or `config/balancer.toml` if present
//! 3. Environment variables `BALANCER__<FIELD>`, nested with `__`
//!    (e.g. `BALANCER__PROBE__TIMEOUT_MS=5000`)

use super::error::{ConfigResult, ConfigurationError};
use super::BalancerConfig;
use crate::constants::env as env_names;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "config/balancer.toml";

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: BalancerConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with file auto-discovery and process environment overrides
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let explicit = env::var(env_names::CONFIG_FILE).ok().map(PathBuf::from);
        Self::load_from_file(explicit)
    }

    /// Load configuration from a specific file, falling back to discovery when `None`
    pub fn load_from_file(config_file: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_file, None)
    }

    /// Load configuration with an explicit set of environment overrides
    ///
    /// `overrides` replaces the process environment as the override source; keys
    /// use the same `BALANCER__` naming. Useful for testing without touching
    /// global environment variables.
    pub fn load_with_overrides(
        config_file: Option<PathBuf>,
        overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        let config_file = Self::resolve_config_file(config_file)?;

        debug!(
            environment = %environment,
            config_file = ?config_file,
            "Loading balancer configuration"
        );

        let mut builder = Config::builder();
        if let Some(path) = &config_file {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        let mut env_source = Environment::with_prefix(env_names::CONFIG_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        if let Some(overrides) = overrides {
            env_source = env_source.source(Some(overrides.into_iter().collect()));
        }
        builder = builder.add_source(env_source);

        let config: BalancerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            items_per_group = config.items_per_group,
            sort_enabled = config.sort_enabled,
            policy = ?config.probe_failure_policy,
            strategy = ?config.partition_strategy,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_file,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The TOML file that contributed to this configuration, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Get current environment from environment variables
    pub fn detect_environment() -> String {
        env::var(env_names::ENVIRONMENT)
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn resolve_config_file(explicit: Option<PathBuf>) -> ConfigResult<Option<PathBuf>> {
        match explicit {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(path) => Err(ConfigurationError::FileNotFound(
                path.display().to_string(),
            )),
            None => {
                let discovered = PathBuf::from(DEFAULT_CONFIG_FILE);
                Ok(discovered.is_file().then_some(discovered))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PartitionStrategy, ProbeFailurePolicy};
    use std::io::Write;

    fn overrides(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_file_values_are_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
items_per_group = 4
source_manifest_path = "/data/videos.txt"
probe_failure_policy = "fail_fast"
partition_strategy = "least_loaded"

[probe]
max_concurrent_probes = 2
"#
        )
        .unwrap();

        let manager =
            ConfigManager::load_with_overrides(Some(file.path().to_path_buf()), overrides(&[]))
                .unwrap();
        let config = manager.config();

        assert_eq!(config.items_per_group, 4);
        assert_eq!(config.source_manifest().unwrap(), "/data/videos.txt");
        assert_eq!(config.probe_failure_policy, ProbeFailurePolicy::FailFast);
        assert_eq!(config.partition_strategy, PartitionStrategy::LeastLoaded);
        assert_eq!(config.probe.max_concurrent_probes, 2);
        // Untouched nested fields keep their defaults
        assert_eq!(config.probe.retry.max_attempts, 3);
        assert!(manager.config_file().is_some());
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "items_per_group = 4\nsource_manifest_path = \"/data/a.txt\""
        )
        .unwrap();

        let manager = ConfigManager::load_with_overrides(
            Some(file.path().to_path_buf()),
            overrides(&[
                ("BALANCER__ITEMS_PER_GROUP", "6"),
                ("BALANCER__SORT_ENABLED", "false"),
                ("BALANCER__PROBE__TIMEOUT_MS", "250"),
            ]),
        )
        .unwrap();

        assert_eq!(manager.config().items_per_group, 6);
        assert!(!manager.config().sort_enabled);
        assert_eq!(manager.config().probe.timeout_ms, 250);
    }

    #[test]
    fn test_invalid_cardinality_fails_validation() {
        let result = ConfigManager::load_with_overrides(
            None,
            overrides(&[
                ("BALANCER__SOURCE_MANIFEST_PATH", "/data/a.txt"),
                ("BALANCER__ITEMS_PER_GROUP", "0"),
            ]),
        );

        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "items_per_group"
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_reported() {
        let result = ConfigManager::load_with_overrides(
            Some(PathBuf::from("/definitely/not/here.toml")),
            overrides(&[]),
        );
        assert!(matches!(result, Err(ConfigurationError::FileNotFound(_))));
    }
}
