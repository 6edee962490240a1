//! # Size Probe
//!
//! Resolves item references to byte sizes against the backing store.
//!
//! Each lookup carries a deadline. Timeouts and connectivity faults are retried
//! with exponential backoff; once the attempts are used up the item counts as a
//! permanent failure and the configured [`ProbeFailurePolicy`] decides what
//! happens to the run.
//!
//! Probes are independent pure reads, so [`SizeProbe::probe_all`] issues them
//! with bounded concurrency. Results land in a map keyed by reference; the
//! completion order never leaks into the plan because the partitioner re-sorts
//! by size anyway.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ProbeConfig, ProbeFailurePolicy};
use crate::error::{BalancerError, ProbeFailure, Result};
use crate::models::{ItemRef, SizedItem};
use crate::storage::Storage;

/// Outcome of probing a whole manifest
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub sizes: HashMap<ItemRef, u64>,
    /// Items that could not be sized, ordered by reference
    pub failures: Vec<ProbeFailure>,
}

impl ProbeReport {
    pub fn sized_items(&self) -> Vec<SizedItem> {
        self.sizes
            .iter()
            .map(|(item_ref, size)| SizedItem::new(item_ref.clone(), *size))
            .collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.sizes.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SizeProbe {
    config: ProbeConfig,
}

impl SizeProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Size one item, retrying transient faults
    ///
    /// Fails with `NotFound` if the reference does not resolve, `NotAFile` if it
    /// resolves to a directory, and `TransientIo` if every attempt timed out or
    /// hit a connectivity fault.
    pub async fn probe(&self, storage: &dyn Storage, item: &ItemRef) -> Result<SizedItem> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.probe_once(storage, item).await {
                Ok(sized) => return Ok(sized),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    warn!(
                        item = %item,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure probing item, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn probe_once(&self, storage: &dyn Storage, item: &ItemRef) -> Result<SizedItem> {
        let path = item.as_str();
        let timeout = self.config.timeout();

        let status = tokio::time::timeout(timeout, storage.status(path))
            .await
            .map_err(|_| BalancerError::transient(path, format!("no response within {timeout:?}")))??;

        if !status.is_file {
            return Err(BalancerError::not_a_file(path));
        }

        debug!(
            file = %path,
            block_size = ?status.block_size,
            len = status.len,
            "Probed item size"
        );

        Ok(SizedItem::new(item.clone(), status.len))
    }

    /// Size every item with bounded concurrency and apply `policy` to failures
    ///
    /// - `FailFast`: the first failing item's error is returned and in-flight
    ///   probes are dropped
    /// - `SkipFailed`: failures are logged and reported, never fatal
    /// - `FailAtEnd`: every item is probed, then `PartialProbeFailure` lists
    ///   all failures
    #[instrument(skip(self, storage, items), fields(concurrency = self.config.max_concurrent_probes))]
    pub async fn probe_all<I>(
        &self,
        storage: &dyn Storage,
        items: I,
        policy: ProbeFailurePolicy,
    ) -> Result<ProbeReport>
    where
        I: IntoIterator<Item = ItemRef>,
    {
        let mut items: Vec<ItemRef> = items.into_iter().collect();
        // Issue order is deterministic even though completion order is not
        items.sort();
        let requested = items.len();
        let started = Instant::now();

        let mut results = stream::iter(items)
            .map(|item| async move {
                let result = self.probe(storage, &item).await;
                (item, result)
            })
            .buffer_unordered(self.config.max_concurrent_probes.max(1));

        let mut report = ProbeReport {
            sizes: HashMap::with_capacity(requested),
            failures: Vec::new(),
        };

        while let Some((item, result)) = results.next().await {
            match result {
                Ok(sized) => {
                    report.sizes.insert(item, sized.size());
                }
                Err(e) if policy == ProbeFailurePolicy::FailFast => {
                    error!(item = %item, error = %e, "Probe failed, aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(item = %item, kind = %e.kind(), error = %e, "Item could not be sized");
                    report.failures.push(e.to_probe_failure(item.as_str()));
                }
            }
        }

        report.failures.sort_by(|a, b| a.item.cmp(&b.item));

        info!(
            requested = requested,
            sized = report.sizes.len(),
            failed = report.failures.len(),
            total_bytes = report.total_bytes(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Size probing completed"
        );

        if policy == ProbeFailurePolicy::FailAtEnd && !report.failures.is_empty() {
            return Err(BalancerError::PartialProbeFailure {
                failures: report.failures,
            });
        }

        Ok(report)
    }
}
