use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{render_manifest, sorted_manifest_path};
use crate::constants::defaults;
use crate::error::{BalancerError, Result};
use crate::models::{ItemRef, PartitionPlan};
use crate::storage::Storage;

/// Serializes a plan next to its source manifest as `sort_<name>`
///
/// The whole manifest is rendered in memory and handed to storage in a single
/// atomic write, so a failed run never leaves a truncated manifest for the
/// execution engine to pick up.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    timeout: Duration,
}

impl Default for ManifestWriter {
    fn default() -> Self {
        Self::new(Duration::from_millis(defaults::WRITE_TIMEOUT_MS))
    }
}

impl ManifestWriter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Write `plan` in group order and return the written manifest path
    #[instrument(skip(self, storage, plan), fields(groups = plan.group_count(), items = plan.item_count()))]
    pub async fn write(
        &self,
        storage: &dyn Storage,
        original_path: &str,
        plan: &PartitionPlan,
    ) -> Result<String> {
        self.write_refs(storage, original_path, plan.item_refs()).await
    }

    /// Write references in the given order and return the written manifest path
    ///
    /// Any existing entry at the target path is deleted first.
    pub async fn write_refs<'a, I>(
        &self,
        storage: &dyn Storage,
        original_path: &str,
        refs: I,
    ) -> Result<String>
    where
        I: IntoIterator<Item = &'a ItemRef>,
    {
        let target = sorted_manifest_path(original_path)?;
        let buffer = render_manifest(refs);
        let lines = buffer.lines().count();

        let replace = async {
            if storage.exists(&target).await? {
                info!(path = %target, "Sorted manifest already exists, deleting first");
                storage.delete(&target).await?;
            }
            storage.write_atomic(&target, buffer.as_bytes()).await
        };

        match tokio::time::timeout(self.timeout, replace).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(into_write_failure(&target, e)),
            Err(_) => {
                return Err(BalancerError::write_failed(
                    &target,
                    format!("no response within {:?}", self.timeout),
                ))
            }
        }

        debug!(path = %target, bytes = buffer.len(), "Manifest buffer written");
        info!(path = %target, records = lines, "Sorted records have been written");

        Ok(target)
    }
}

fn into_write_failure(target: &str, error: BalancerError) -> BalancerError {
    match error {
        BalancerError::WriteFailed { .. } => error,
        other => BalancerError::write_failed(target, other),
    }
}
