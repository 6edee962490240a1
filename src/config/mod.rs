//! # Balancer Configuration
//!
//! Typed configuration consumed by the orchestrator. Values are layered by
//! [`ConfigManager`]: built-in defaults, then an optional TOML file, then
//! `BALANCER__*` environment variables.
//!
//! ## Cross-system invariant
//!
//! `items_per_group` must equal the lines-per-task setting of the external
//! splitter that consumes the written manifest. The balanced order only holds
//! when both sides chunk on the same stride; a mismatch is not detectable here.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use manifest_balancer::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let k = manager.config().group_cardinality()?;
//! println!("balancing into groups of {k}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// What to do when an item cannot be sized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailurePolicy {
    /// Abort the run on the first item that cannot be sized
    FailFast,
    /// Exclude unsizable items from the plan, log them and continue
    #[default]
    SkipFailed,
    /// Probe everything, then abort listing every failed item
    FailAtEnd,
}

/// Group assignment heuristic used by the partitioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Alternating-direction round robin over size-sorted items
    #[default]
    Serpentine,
    /// Largest item first into the lightest group that still has room
    LeastLoaded,
}

/// Retry schedule for transient probe failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            initial_delay_ms: defaults::RETRY_INITIAL_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            multiplier: defaults::RETRY_MULTIPLIER,
        }
    }
}

impl BackoffConfig {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Size probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Upper bound on in-flight metadata requests
    pub max_concurrent_probes: usize,
    /// Deadline for a single metadata request
    pub timeout_ms: u64,
    pub retry: BackoffConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: defaults::MAX_CONCURRENT_PROBES,
            timeout_ms: defaults::PROBE_TIMEOUT_MS,
            retry: BackoffConfig::default(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level configuration for a balancing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Fixed group cardinality `k`; signed so that non-positive values are
    /// reported as invalid configuration instead of a parse failure
    pub items_per_group: i64,
    pub sort_enabled: bool,
    pub source_manifest_path: Option<String>,
    pub probe_failure_policy: ProbeFailurePolicy,
    pub partition_strategy: PartitionStrategy,
    pub probe: ProbeConfig,
    pub write_timeout_ms: u64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            items_per_group: defaults::ITEMS_PER_GROUP,
            sort_enabled: defaults::SORT_ENABLED,
            source_manifest_path: None,
            probe_failure_policy: ProbeFailurePolicy::default(),
            partition_strategy: PartitionStrategy::default(),
            probe: ProbeConfig::default(),
            write_timeout_ms: defaults::WRITE_TIMEOUT_MS,
        }
    }
}

impl BalancerConfig {
    pub fn new(source_manifest_path: impl Into<String>) -> Self {
        Self {
            source_manifest_path: Some(source_manifest_path.into()),
            ..Self::default()
        }
    }

    pub fn with_items_per_group(mut self, items_per_group: i64) -> Self {
        self.items_per_group = items_per_group;
        self
    }

    pub fn with_probe_failure_policy(mut self, policy: ProbeFailurePolicy) -> Self {
        self.probe_failure_policy = policy;
        self
    }

    pub fn with_partition_strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.partition_strategy = strategy;
        self
    }

    pub fn with_sort_enabled(mut self, enabled: bool) -> Self {
        self.sort_enabled = enabled;
        self
    }

    /// The validated group cardinality
    pub fn group_cardinality(&self) -> ConfigResult<NonZeroUsize> {
        usize::try_from(self.items_per_group)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                ConfigurationError::invalid_value(
                    "items_per_group",
                    self.items_per_group.to_string(),
                    "must be a positive integer",
                )
            })
    }

    /// The configured source manifest, which is required for a run
    pub fn source_manifest(&self) -> ConfigResult<&str> {
        match self.source_manifest_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(ConfigurationError::missing_required_field(
                "source_manifest_path",
                "balancer configuration",
            )),
        }
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Validate every field without touching storage
    pub fn validate(&self) -> ConfigResult<()> {
        self.group_cardinality()?;
        self.source_manifest()?;

        if self.probe.max_concurrent_probes == 0 {
            return Err(ConfigurationError::invalid_value(
                "probe.max_concurrent_probes",
                "0",
                "concurrency must be greater than 0",
            ));
        }

        if self.probe.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "probe.timeout_ms",
                "0",
                "every storage call needs a deadline",
            ));
        }

        if self.write_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "write_timeout_ms",
                "0",
                "every storage call needs a deadline",
            ));
        }

        if self.probe.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "probe.retry.max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }

        if !self.probe.retry.multiplier.is_finite() || self.probe.retry.multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "probe.retry.multiplier",
                self.probe.retry.multiplier.to_string(),
                "multiplier must be a finite value >= 1.0",
            ));
        }

        Ok(())
    }
}
