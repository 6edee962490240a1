//! # Structured Logging Module
//!
//! Environment-aware structured logging for balancing runs. Console output is
//! human readable by default and switches to JSON lines when
//! `BALANCER_LOG_FORMAT=json`, which suits batch schedulers that ship logs.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::env as env_names;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; also tolerates a global subscriber installed
/// by an embedding application.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if use_json_format() {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_names::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_format() -> bool {
    std::env::var(env_names::LOG_FORMAT)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log the completion of a pipeline stage
pub fn log_stage_completed(
    run_id: &str,
    stage: &str,
    item_count: usize,
    duration_ms: u64,
    details: Option<&str>,
) {
    tracing::info!(
        run_id = %run_id,
        stage = %stage,
        item_count = item_count,
        duration_ms = duration_ms,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "STAGE_COMPLETED"
    );
}

/// Log an item excluded from the plan
pub fn log_item_skipped(run_id: &str, item: &str, kind: &str, reason: &str) {
    tracing::warn!(
        run_id = %run_id,
        item = %item,
        kind = %kind,
        reason = %reason,
        timestamp = %Utc::now().to_rfc3339(),
        "ITEM_SKIPPED"
    );
}

/// Log error with full context
pub fn log_error(run_id: &str, stage: &str, error: &str, path: Option<&str>) {
    tracing::error!(
        run_id = %run_id,
        stage = %stage,
        error = %error,
        path = path,
        timestamp = %Utc::now().to_rfc3339(),
        "RUN_FAILED"
    );
}
