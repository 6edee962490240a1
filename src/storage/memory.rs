use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::Duration;

use super::{FileStatus, Storage};
use crate::error::{BalancerError, Result};

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Directory,
}

/// Concurrent in-memory store
///
/// Backs tests and dry runs. Faults can be injected per path: a number of
/// transient failures before metadata lookups succeed, an artificial lookup
/// latency, and a rejection of all writes.
#[derive(Debug)]
pub struct InMemoryStorage {
    entries: DashMap<String, Entry>,
    block_size: u64,
    transient_failures: DashMap<String, u32>,
    status_delays: DashMap<String, Duration>,
    status_calls: DashMap<String, u32>,
    write_failure: Mutex<Option<String>>,
    writes: Mutex<Vec<String>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub const DEFAULT_BLOCK_SIZE: u64 = 128 * 1024 * 1024;

    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            block_size: Self::DEFAULT_BLOCK_SIZE,
            transient_failures: DashMap::new(),
            status_delays: DashMap::new(),
            status_calls: DashMap::new(),
            write_failure: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_file(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), Entry::File(contents.into()));
    }

    /// Insert a file of `len` zero bytes
    pub fn insert_sized(&self, path: impl Into<String>, len: usize) {
        self.insert_file(path, vec![0u8; len]);
    }

    pub fn insert_directory(&self, path: impl Into<String>) {
        self.entries.insert(path.into(), Entry::Directory);
    }

    /// Fail the next `count` metadata lookups of `path` with `TransientIo`
    pub fn fail_transiently(&self, path: impl Into<String>, count: u32) {
        self.transient_failures.insert(path.into(), count);
    }

    /// Delay every metadata lookup of `path`
    pub fn delay_status(&self, path: impl Into<String>, delay: Duration) {
        self.status_delays.insert(path.into(), delay);
    }

    /// Reject every subsequent write with the given reason
    pub fn fail_writes(&self, reason: impl Into<String>) {
        *self.write_failure.lock() = Some(reason.into());
    }

    pub fn file_contents(&self, path: &str) -> Option<String> {
        match self.entries.get(path).as_deref() {
            Some(Entry::File(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of metadata lookups issued for `path`
    pub fn status_calls(&self, path: &str) -> u32 {
        self.status_calls.get(path).map(|calls| *calls).unwrap_or(0)
    }

    /// Paths written so far, in write order
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    fn take_transient_failure(&self, path: &str) -> bool {
        match self.transient_failures.get_mut(path) {
            Some(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn status(&self, path: &str) -> Result<FileStatus> {
        *self.status_calls.entry(path.to_string()).or_insert(0) += 1;

        let delay = self.status_delays.get(path).map(|delay| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_transient_failure(path) {
            return Err(BalancerError::transient(path, "injected connectivity fault"));
        }

        match self.entries.get(path).as_deref() {
            Some(Entry::File(bytes)) => Ok(FileStatus::file(bytes.len() as u64, Some(self.block_size))),
            Some(Entry::Directory) => Ok(FileStatus::directory()),
            None => Err(BalancerError::not_found(path)),
        }
    }

    async fn read_to_string(&self, path: &str) -> Result<String> {
        match self.entries.get(path).as_deref() {
            Some(Entry::File(bytes)) => String::from_utf8(bytes.clone())
                .map_err(|e| BalancerError::io(path, format!("invalid UTF-8: {e}"))),
            Some(Entry::Directory) => Err(BalancerError::not_a_file(path)),
            None => Err(BalancerError::not_found(path)),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.entries.contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.entries
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        Ok(())
    }

    async fn write_atomic(&self, path: &str, contents: &[u8]) -> Result<()> {
        let failure = self.write_failure.lock().clone();
        if let Some(reason) = failure {
            return Err(BalancerError::write_failed(path, reason));
        }

        self.entries
            .insert(path.to_string(), Entry::File(contents.to_vec()));
        self.writes.lock().push(path.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transient_failures_are_consumed() {
        let storage = InMemoryStorage::new();
        storage.insert_sized("/v/a.mp4", 10);
        storage.fail_transiently("/v/a.mp4", 2);

        for _ in 0..2 {
            let error = storage.status("/v/a.mp4").await.unwrap_err();
            assert!(error.is_retryable());
        }
        let status = storage.status("/v/a.mp4").await.unwrap();
        assert_eq!(status.len, 10);
        assert_eq!(status.block_size, Some(InMemoryStorage::DEFAULT_BLOCK_SIZE));
        assert_eq!(storage.status_calls("/v/a.mp4"), 3);
    }

    #[tokio::test]
    async fn test_recursive_delete() {
        let storage = InMemoryStorage::new();
        storage.insert_directory("/out");
        storage.insert_file("/out/part-0", "x");
        storage.insert_file("/outside", "y");

        storage.delete("/out").await.unwrap();

        assert!(!storage.contains("/out"));
        assert!(!storage.contains("/out/part-0"));
        assert!(storage.contains("/outside"));
    }

    #[tokio::test]
    async fn test_rejected_write_leaves_previous_contents() {
        let storage = InMemoryStorage::new();
        storage.insert_file("/m.txt", "old\n");
        storage.fail_writes("disk full");

        let error = storage.write_atomic("/m.txt", b"new\n").await.unwrap_err();
        assert!(matches!(error, BalancerError::WriteFailed { .. }));
        assert_eq!(storage.file_contents("/m.txt").as_deref(), Some("old\n"));
        assert!(storage.writes().is_empty());
    }
}
