use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::parse_manifest;
use crate::constants::defaults;
use crate::error::{BalancerError, Result};
use crate::models::ItemRef;
use crate::storage::Storage;

/// Loads a manifest into a deduplicated, unordered set of references
///
/// ```rust
/// use manifest_balancer::manifest::ManifestReader;
/// use manifest_balancer::storage::InMemoryStorage;
///
/// # tokio_test::block_on(async {
/// let storage = InMemoryStorage::new();
/// storage.insert_file("/jobs/videos.txt", "/v/b.mp4\n/v/a.mp4\n/v/b.mp4\n");
///
/// let items = ManifestReader::default()
///     .read(&storage, "/jobs/videos.txt")
///     .await
///     .unwrap();
/// assert_eq!(items.len(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ManifestReader {
    timeout: Duration,
}

impl Default for ManifestReader {
    fn default() -> Self {
        Self::new(Duration::from_millis(defaults::PROBE_TIMEOUT_MS))
    }
}

impl ManifestReader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Read `path` and return its distinct, non-blank references
    ///
    /// Fails with `NotFound` if nothing exists at `path` and `NotAFile` if it
    /// is a directory. Callers must not rely on the manifest's line order.
    #[instrument(skip(self, storage))]
    pub async fn read(&self, storage: &dyn Storage, path: &str) -> Result<HashSet<ItemRef>> {
        let status = self.with_deadline(path, storage.status(path)).await?;
        if !status.is_file {
            return Err(BalancerError::not_a_file(path));
        }

        let content = self.with_deadline(path, storage.read_to_string(path)).await?;
        let items = parse_manifest(&content);

        debug!(path = %path, bytes = content.len(), "Manifest content loaded");
        info!(path = %path, records = items.len(), "Manifest records have been read");

        Ok(items)
    }

    async fn with_deadline<T>(
        &self,
        path: &str,
        operation: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| {
                BalancerError::transient(path, format!("no response within {:?}", self.timeout))
            })?
    }
}
