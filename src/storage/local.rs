use async_trait::async_trait;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{FileStatus, Storage};
use crate::error::{BalancerError, Result};

/// Local filesystem storage
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    /// Sibling temp file that is unlinked when dropped
    ///
    /// The file is created synchronously and handed to tokio as an open
    /// handle, so dropping the write future at any await point removes it.
    fn sibling_temp(path: &Path) -> std::io::Result<(TempPath, tokio::fs::File)> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let prefix = format!(".{file_name}.tmp-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }
        let temp = builder.tempfile_in(parent)?;
        let file = temp.reopen()?;
        Ok((temp.into_temp_path(), tokio::fs::File::from_std(file)))
    }

    async fn write_temp(mut file: tokio::fs::File, contents: &[u8]) -> std::io::Result<()> {
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(unix)]
fn block_size(metadata: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.blksize())
}

#[cfg(not(unix))]
fn block_size(_metadata: &std::fs::Metadata) -> Option<u64> {
    None
}

#[async_trait]
impl Storage for LocalStorage {
    async fn status(&self, path: &str) -> Result<FileStatus> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| BalancerError::from_io(path, &e))?;

        if metadata.is_file() {
            Ok(FileStatus::file(metadata.len(), block_size(&metadata)))
        } else {
            Ok(FileStatus::directory())
        }
    }

    async fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BalancerError::from_io(path, &e))?;
        String::from_utf8(bytes).map_err(|e| BalancerError::io(path, format!("invalid UTF-8: {e}")))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| BalancerError::from_io(path, &e))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let status = self.status(path).await?;
        let outcome = if status.is_file {
            tokio::fs::remove_file(path).await
        } else {
            tokio::fs::remove_dir_all(path).await
        };
        outcome.map_err(|e| BalancerError::from_io(path, &e))
    }

    async fn write_atomic(&self, path: &str, contents: &[u8]) -> Result<()> {
        let target = Path::new(path);
        let (temp, file) =
            Self::sibling_temp(target).map_err(|e| BalancerError::write_failed(path, e))?;

        let written = match Self::write_temp(file, contents).await {
            Ok(()) => tokio::fs::rename(&temp, target).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => {
                // Renamed into place; nothing left to unlink
                if let Err(e) = temp.keep() {
                    debug!(error = %e, "Temporary manifest already moved");
                }
            }
            Err(e) => {
                if let Err(cleanup) = temp.close() {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(error = %cleanup, "Failed to remove temporary manifest");
                    }
                }
                return Err(BalancerError::write_failed(path, e));
            }
        }

        debug!(path = %path, bytes = contents.len(), "Atomically replaced file");
        Ok(())
    }
}
