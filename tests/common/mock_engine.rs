use async_trait::async_trait;
use manifest_balancer::orchestration::{BatchEngine, JobSubmission};
use manifest_balancer::{BalancerError, Result};
use parking_lot::Mutex;

/// Mock batch engine that records submissions instead of running them
///
/// Keeps the JSON payload of each accepted submission alongside it, the way an
/// HTTP-backed engine would receive it.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub submissions: Mutex<Vec<JobSubmission>>,
    pub payloads: Mutex<Vec<serde_json::Value>>,
    pub reject_with: Option<String>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<JobSubmission> {
        self.submissions.lock().clone()
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().clone()
    }
}

#[async_trait]
impl BatchEngine for MockEngine {
    async fn submit(&self, submission: &JobSubmission) -> Result<String> {
        if let Some(reason) = &self.reject_with {
            return Err(BalancerError::Engine(reason.clone()));
        }

        self.payloads.lock().push(submission.to_payload()?);

        let mut submissions = self.submissions.lock();
        submissions.push(submission.clone());
        Ok(format!("job_{:04}", submissions.len()))
    }

    fn engine_name(&self) -> &'static str {
        "mock_engine"
    }
}
