//! # Manifest Format
//!
//! A manifest is UTF-8 text with one item reference per line, no header and no
//! blank lines. Read manifests are sets: duplicates collapse and input order is
//! discarded. Written manifests encode a [`PartitionPlan`](crate::models::PartitionPlan)
//! by plain concatenation, so group boundaries are implicit and only
//! recoverable by re-chunking every `k` lines, which is exactly what the
//! downstream fixed-stride splitter does.

pub mod reader;
pub mod writer;

use std::collections::HashSet;
use std::path::Path;

use crate::constants::{LINE_SEPARATOR, SORTED_MANIFEST_PREFIX};
use crate::error::{BalancerError, Result};
use crate::models::ItemRef;

pub use reader::ManifestReader;
pub use writer::ManifestWriter;

/// Non-blank, trimmed lines in file order, duplicates kept
pub fn manifest_lines(content: &str) -> Vec<ItemRef> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ItemRef::from)
        .collect()
}

/// Deduplicated set of references in `content`
pub fn parse_manifest(content: &str) -> HashSet<ItemRef> {
    manifest_lines(content).into_iter().collect()
}

/// Serialize references one per line, each terminated by the line separator
pub fn render_manifest<'a, I>(refs: I) -> String
where
    I: IntoIterator<Item = &'a ItemRef>,
{
    let mut buffer = String::new();
    for item_ref in refs {
        buffer.push_str(item_ref.as_str());
        buffer.push_str(LINE_SEPARATOR);
    }
    buffer
}

/// Split lines into the fixed-stride chunks the downstream splitter will see
pub fn rechunk<T>(lines: &[T], items_per_group: usize) -> Vec<&[T]> {
    if items_per_group == 0 {
        return Vec::new();
    }
    lines.chunks(items_per_group).collect()
}

/// `<parent>/sort_<file name>` next to the source manifest
pub fn sorted_manifest_path(original_path: &str) -> Result<String> {
    let original = Path::new(original_path);
    let file_name = original
        .file_name()
        .map(|name| name.to_string_lossy())
        .ok_or_else(|| {
            BalancerError::InvalidConfig(format!(
                "manifest path '{original_path}' has no file name"
            ))
        })?;

    let sorted_name = format!("{SORTED_MANIFEST_PREFIX}{file_name}");
    let sorted = match original.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(sorted_name),
        _ => sorted_name.into(),
    };

    Ok(sorted.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_trimmed_and_blank_lines_dropped() {
        let lines = manifest_lines("  /v/a.mp4 \r\n\n/v/b.mp4\n   \n/v/a.mp4\n");
        let lines: Vec<&str> = lines.iter().map(ItemRef::as_str).collect();
        assert_eq!(lines, vec!["/v/a.mp4", "/v/b.mp4", "/v/a.mp4"]);
    }

    #[test]
    fn test_parse_deduplicates() {
        let set = parse_manifest("/v/a.mp4\n/v/a.mp4\n/v/b.mp4");
        assert_eq!(set.len(), 2);
        assert!(set.contains("/v/a.mp4"));
    }

    #[test]
    fn test_render_terminates_every_line() {
        let refs = vec![ItemRef::from("/a"), ItemRef::from("/b")];
        assert_eq!(render_manifest(&refs), "/a\n/b\n");
        assert_eq!(render_manifest(&Vec::<ItemRef>::new()), "");
    }

    #[test]
    fn test_rechunk_by_stride() {
        let lines = vec![1, 2, 3, 4, 5];
        let chunks = rechunk(&lines, 2);
        assert_eq!(chunks, vec![&[1, 2][..], &[3, 4][..], &[5][..]]);
        assert!(rechunk(&lines, 0).is_empty());
    }

    #[test]
    fn test_sorted_manifest_path() {
        assert_eq!(
            sorted_manifest_path("/data/jobs/videos.txt").unwrap(),
            "/data/jobs/sort_videos.txt"
        );
        assert_eq!(
            sorted_manifest_path("hdfs://namenode:8020/jobs/list").unwrap(),
            "hdfs://namenode:8020/jobs/sort_list"
        );
        assert_eq!(sorted_manifest_path("videos.txt").unwrap(), "sort_videos.txt");
        assert!(matches!(
            sorted_manifest_path("/"),
            Err(BalancerError::InvalidConfig(_))
        ));
    }
}
