use manifest_balancer::config::{BackoffConfig, BalancerConfig, ProbeConfig};
use manifest_balancer::manifest::{manifest_lines, rechunk};
use manifest_balancer::ItemRef;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary job directory with item files and a source manifest
pub struct LocalJob {
    pub dir: TempDir,
    pub manifest: PathBuf,
}

impl LocalJob {
    /// Create one file per `(name, size)` and a manifest listing `lines`
    ///
    /// Lines that name a created file are rewritten to its absolute path; other
    /// lines are kept verbatim so tests can reference missing items.
    pub fn new(files: &[(&str, usize)], lines: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let videos = dir.path().join("videos");
        std::fs::create_dir_all(&videos).expect("create videos dir");

        for (name, size) in files {
            std::fs::write(videos.join(name), vec![0u8; *size]).expect("write item");
        }

        let content: String = lines
            .iter()
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    format!("{line}\n")
                } else {
                    format!("{}\n", videos.join(trimmed).display())
                }
            })
            .collect();

        let manifest = dir.path().join("videos.txt");
        std::fs::write(&manifest, content).expect("write manifest");

        Self { dir, manifest }
    }

    pub fn item_path(&self, name: &str) -> String {
        self.dir.path().join("videos").join(name).display().to_string()
    }

    pub fn manifest_path(&self) -> String {
        self.manifest.display().to_string()
    }

    pub fn sorted_manifest(&self) -> PathBuf {
        self.dir.path().join("sort_videos.txt")
    }

    pub fn config(&self) -> BalancerConfig {
        BalancerConfig {
            probe: fast_probe_config(),
            ..BalancerConfig::new(self.manifest_path())
        }
    }
}

/// Probe settings with tiny backoff delays for tests
pub fn fast_probe_config() -> ProbeConfig {
    ProbeConfig {
        max_concurrent_probes: 4,
        timeout_ms: 5_000,
        retry: BackoffConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 4,
            multiplier: 2.0,
        },
    }
}

/// Re-chunk written manifest text the way a fixed-stride splitter would
pub fn chunk_manifest(content: &str, items_per_group: usize) -> Vec<Vec<ItemRef>> {
    let lines = manifest_lines(content);
    rechunk(&lines, items_per_group)
        .into_iter()
        .map(<[ItemRef]>::to_vec)
        .collect()
}

/// Byte totals for each chunk, given a size lookup
pub fn chunk_sums(chunks: &[Vec<ItemRef>], sizes: &HashMap<String, u64>) -> Vec<u64> {
    chunks
        .iter()
        .map(|chunk| chunk.iter().map(|r| sizes[r.as_str()]).sum())
        .collect()
}

pub fn read_to_string(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}
