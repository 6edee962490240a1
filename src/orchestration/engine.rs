//! Hand-off to the external batch execution engine.
//!
//! The engine splits the written manifest into chunks of `items_per_group`
//! lines and runs one task per chunk. Dispatch, retries and worker lifecycle
//! belong to the engine; this crate only supplies the manifest path and the
//! stride it was balanced for.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BalancerError, Result};

/// What the engine needs to run a balanced batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub run_id: Uuid,
    pub manifest_path: String,
    /// Lines per task; the engine's splitter must be configured with this value
    pub items_per_group: usize,
}

impl JobSubmission {
    /// JSON job descriptor for engines that accept submissions over HTTP or a queue
    pub fn to_payload(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| {
            BalancerError::Internal(format!("failed to serialize job submission: {e}"))
        })
    }
}

/// Acknowledgement returned once the engine accepted a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub job_id: String,
    pub submission: JobSubmission,
    pub submitted_at: DateTime<Utc>,
}

/// External engine that consumes balanced manifests
#[async_trait]
pub trait BatchEngine: Send + Sync {
    /// Submit the manifest for execution and return the engine's job id
    async fn submit(&self, submission: &JobSubmission) -> Result<String>;

    fn engine_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_carries_manifest_and_stride() {
        let submission = JobSubmission {
            run_id: Uuid::nil(),
            manifest_path: "/jobs/sort_videos.txt".to_string(),
            items_per_group: 4,
        };

        let payload = submission.to_payload().unwrap();
        assert_eq!(payload["manifest_path"], "/jobs/sort_videos.txt");
        assert_eq!(payload["items_per_group"], 4);
        assert_eq!(payload["run_id"], "00000000-0000-0000-0000-000000000000");
    }
}
