//! # System Constants
//!
//! Naming conventions, wire format and default values shared by the manifest
//! reader, writer, probe and orchestrator.

/// Manifest format and output naming
pub mod manifest {
    /// Prefix applied to the source manifest's file name for the balanced output
    pub const SORTED_MANIFEST_PREFIX: &str = "sort_";

    /// Line terminator written after every item reference
    pub const LINE_SEPARATOR: &str = "\n";
}

/// Pipeline stage names used in logs and cancellation errors
pub mod stages {
    pub const VALIDATE: &str = "validate";
    pub const READ_MANIFEST: &str = "read_manifest";
    pub const PROBE_SIZES: &str = "probe_sizes";
    pub const PARTITION: &str = "partition";
    pub const WRITE_MANIFEST: &str = "write_manifest";
    pub const SUBMIT: &str = "submit";
}

/// Configuration defaults
pub mod defaults {
    /// Items per group; must match the downstream splitter's lines per task
    pub const ITEMS_PER_GROUP: i64 = 2;

    pub const SORT_ENABLED: bool = true;

    pub const MAX_CONCURRENT_PROBES: usize = 8;

    pub const PROBE_TIMEOUT_MS: u64 = 30_000;

    pub const WRITE_TIMEOUT_MS: u64 = 60_000;

    pub const RETRY_MAX_ATTEMPTS: u32 = 3;

    pub const RETRY_INITIAL_DELAY_MS: u64 = 100;

    pub const RETRY_MAX_DELAY_MS: u64 = 5_000;

    pub const RETRY_MULTIPLIER: f64 = 2.0;
}

/// Environment variable names
pub mod env {
    /// Prefix for configuration overrides, e.g. `BALANCER__ITEMS_PER_GROUP=4`
    pub const CONFIG_PREFIX: &str = "BALANCER";

    /// Explicit configuration file path
    pub const CONFIG_FILE: &str = "BALANCER_CONFIG_FILE";

    pub const ENVIRONMENT: &str = "BALANCER_ENV";

    pub const LOG_FORMAT: &str = "BALANCER_LOG_FORMAT";
}

pub use manifest::{LINE_SEPARATOR, SORTED_MANIFEST_PREFIX};
