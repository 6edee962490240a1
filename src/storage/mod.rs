//! # Storage Abstraction
//!
//! The backing store that holds manifests and the items they reference. The
//! pipeline only needs metadata lookups, whole-file reads, deletes and a single
//! all-or-nothing write, so any distributed filesystem client can sit behind
//! [`Storage`].
//!
//! - [`LocalStorage`]: the local filesystem via `tokio::fs`
//! - [`InMemoryStorage`]: a concurrent in-memory store with fault injection

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use local::LocalStorage;
pub use memory::InMemoryStorage;

/// Metadata for one storage entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStatus {
    /// Length in bytes; meaningless for directories
    pub len: u64,
    /// Preferred block size reported by the store, for diagnostics only
    pub block_size: Option<u64>,
    pub is_file: bool,
}

impl FileStatus {
    pub fn file(len: u64, block_size: Option<u64>) -> Self {
        Self {
            len,
            block_size,
            is_file: true,
        }
    }

    pub fn directory() -> Self {
        Self {
            len: 0,
            block_size: None,
            is_file: false,
        }
    }
}

/// Operations the balancing pipeline performs against its backing store
///
/// Implementations map their native failures onto the crate taxonomy:
/// a missing entry is `NotFound`, timeouts and connectivity faults are
/// `TransientIo`, anything else is `Io`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Metadata for `path`; fails with `NotFound` if nothing exists there
    async fn status(&self, path: &str) -> Result<FileStatus>;

    /// Whole contents of the file at `path` as UTF-8
    async fn read_to_string(&self, path: &str) -> Result<String>;

    async fn exists(&self, path: &str) -> Result<bool>;

    /// Remove whatever is at `path`, recursively for directories
    async fn delete(&self, path: &str) -> Result<()>;

    /// Replace `path` with `contents` in one step
    ///
    /// Readers observe either the previous state or the complete new file,
    /// never a truncated one.
    async fn write_atomic(&self, path: &str, contents: &[u8]) -> Result<()>;

    /// Name used in logs
    fn backend_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
