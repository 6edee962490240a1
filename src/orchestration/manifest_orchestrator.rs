use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::engine::{BatchEngine, JobSubmission, SubmissionReceipt};
use crate::config::{BalancerConfig, ConfigManager};
use crate::constants::stages;
use crate::error::{BalancerError, ProbeFailure, Result};
use crate::logging::{log_error, log_item_skipped, log_stage_completed};
use crate::manifest::{ManifestReader, ManifestWriter};
use crate::models::{ItemRef, PlanSummary};
use crate::partition::Partitioner;
use crate::probe::SizeProbe;
use crate::storage::Storage;

/// Result of a completed balancing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingOutcome {
    pub run_id: Uuid,
    pub source_manifest_path: String,
    /// The manifest to hand to the execution engine
    pub manifest_path: String,
    pub items_per_group: usize,
    /// Distinct references read from the source manifest
    pub items_read: usize,
    /// References written to the output manifest
    pub items_written: usize,
    pub group_count: usize,
    /// False when sorting was disabled and the manifest was passed through
    pub balanced: bool,
    pub strategy: Option<String>,
    pub summary: Option<PlanSummary>,
    /// Items excluded because they could not be sized
    pub skipped: Vec<ProbeFailure>,
    pub duration_ms: u64,
}

/// Runs read → probe → partition → write for one source manifest
pub struct ManifestOrchestrator {
    config: BalancerConfig,
    storage: Arc<dyn Storage>,
    reader: ManifestReader,
    probe: SizeProbe,
    partitioner: Partitioner,
    writer: ManifestWriter,
    cancelled: Arc<AtomicBool>,
}

impl std::fmt::Debug for ManifestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestOrchestrator")
            .field("config", &self.config)
            .field("storage", &self.storage.backend_name())
            .field("partitioner", &self.partitioner)
            .finish()
    }
}

impl ManifestOrchestrator {
    /// Build an orchestrator, rejecting invalid configuration up front
    pub fn new(config: BalancerConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            reader: ManifestReader::new(config.probe.timeout()),
            probe: SizeProbe::new(config.probe.clone()),
            partitioner: Partitioner::new(config.partition_strategy),
            writer: ManifestWriter::new(config.write_timeout()),
            config,
            storage,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn from_manager(manager: &ConfigManager, storage: Arc<dyn Storage>) -> Result<Self> {
        Self::new(manager.config().clone(), storage)
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Flag that aborts the run at the next stage boundary once set
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check that the source manifest exists and is a single file
    pub async fn validate(&self) -> Result<()> {
        let source = self.config.source_manifest()?;
        let status = self.storage.status(source).await?;
        if !status.is_file {
            return Err(BalancerError::not_a_file(source));
        }
        Ok(())
    }

    /// Run the pipeline and return where the balanced manifest was written
    ///
    /// Manifest-level failures abort before any output exists. Per-item probe
    /// failures follow the configured policy. Write failures are always fatal.
    pub async fn run(&self) -> Result<BalancingOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("balancing_run", run_id = %run_id);

        self.run_stages(run_id).instrument(span).await
    }

    /// Run the pipeline, then submit the written manifest to `engine`
    pub async fn run_and_submit(
        &self,
        engine: &dyn BatchEngine,
    ) -> Result<(BalancingOutcome, SubmissionReceipt)> {
        let outcome = self.run().await?;
        self.check_cancelled(stages::SUBMIT)?;

        let submission = JobSubmission {
            run_id: outcome.run_id,
            manifest_path: outcome.manifest_path.clone(),
            items_per_group: outcome.items_per_group,
        };

        let job_id = engine.submit(&submission).await.map_err(|e| {
            log_error(
                &outcome.run_id.to_string(),
                stages::SUBMIT,
                &e.to_string(),
                Some(&outcome.manifest_path),
            );
            e
        })?;

        info!(
            run_id = %outcome.run_id,
            job_id = %job_id,
            engine = engine.engine_name(),
            manifest = %outcome.manifest_path,
            items_per_group = outcome.items_per_group,
            "Balanced manifest submitted"
        );

        let receipt = SubmissionReceipt {
            job_id,
            submission,
            submitted_at: chrono::Utc::now(),
        };
        Ok((outcome, receipt))
    }

    async fn run_stages(&self, run_id: Uuid) -> Result<BalancingOutcome> {
        let started = Instant::now();
        let run_label = run_id.to_string();
        let mut stage = stages::VALIDATE;

        let result: Result<BalancingOutcome> = async {
            let source = self.config.source_manifest()?.to_string();
            let k = self.config.group_cardinality()?.get();

            self.check_cancelled(stage)?;
            self.validate().await?;

            stage = stages::READ_MANIFEST;
            self.check_cancelled(stage)?;
            let stage_started = Instant::now();
            let items = self.reader.read(self.storage.as_ref(), &source).await?;
            let items_read = items.len();
            log_stage_completed(&run_label, stage, items_read, elapsed_ms(stage_started), None);

            if !self.config.sort_enabled {
                stage = stages::WRITE_MANIFEST;
                self.check_cancelled(stage)?;
                return self
                    .pass_through(run_id, &source, k, items.into_iter().collect(), started)
                    .await;
            }

            stage = stages::PROBE_SIZES;
            self.check_cancelled(stage)?;
            let stage_started = Instant::now();
            let report = self
                .probe
                .probe_all(self.storage.as_ref(), items, self.config.probe_failure_policy)
                .await?;
            for failure in &report.failures {
                log_item_skipped(
                    &run_label,
                    &failure.item,
                    &failure.kind.to_string(),
                    &failure.reason,
                );
            }
            log_stage_completed(
                &run_label,
                stage,
                report.sizes.len(),
                elapsed_ms(stage_started),
                Some(&format!("{} skipped", report.failures.len())),
            );

            stage = stages::PARTITION;
            self.check_cancelled(stage)?;
            let stage_started = Instant::now();
            let plan = self.partitioner.partition(report.sized_items(), k)?;
            log_stage_completed(&run_label, stage, plan.item_count(), elapsed_ms(stage_started), None);

            stage = stages::WRITE_MANIFEST;
            self.check_cancelled(stage)?;
            let stage_started = Instant::now();
            let manifest_path = self.writer.write(self.storage.as_ref(), &source, &plan).await?;
            log_stage_completed(&run_label, stage, plan.item_count(), elapsed_ms(stage_started), None);

            Ok(BalancingOutcome {
                run_id,
                source_manifest_path: source,
                manifest_path,
                items_per_group: k,
                items_read,
                items_written: plan.item_count(),
                group_count: plan.group_count(),
                balanced: true,
                strategy: Some(self.partitioner.strategy_name().to_string()),
                summary: Some(plan.summary()),
                skipped: report.failures,
                duration_ms: elapsed_ms(started),
            })
        }
        .await;

        match result {
            Ok(outcome) => {
                info!(
                    manifest = %outcome.manifest_path,
                    items = outcome.items_written,
                    groups = outcome.group_count,
                    skipped = outcome.skipped.len(),
                    balanced = outcome.balanced,
                    duration_ms = outcome.duration_ms,
                    "Balancing run completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                log_error(&run_label, stage, &e.to_string(), e.path());
                Err(e)
            }
        }
    }

    /// Sorting disabled: write the deduplicated references without probing
    async fn pass_through(
        &self,
        run_id: Uuid,
        source: &str,
        k: usize,
        mut refs: Vec<ItemRef>,
        started: Instant,
    ) -> Result<BalancingOutcome> {
        refs.sort();
        let manifest_path = self
            .writer
            .write_refs(self.storage.as_ref(), source, &refs)
            .await?;

        info!(
            manifest = %manifest_path,
            items = refs.len(),
            "Sorting disabled, manifest passed through without balancing"
        );

        Ok(BalancingOutcome {
            run_id,
            source_manifest_path: source.to_string(),
            manifest_path,
            items_per_group: k,
            items_read: refs.len(),
            items_written: refs.len(),
            group_count: refs.len().div_ceil(k),
            balanced: false,
            strategy: None,
            summary: None,
            skipped: Vec::new(),
            duration_ms: elapsed_ms(started),
        })
    }

    fn check_cancelled(&self, stage: &str) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(BalancerError::Cancelled {
                stage: stage.to_string(),
            });
        }
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeFailurePolicy;
    use crate::storage::InMemoryStorage;

    fn storage_with_manifest(lines: &str) -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        storage.insert_file("/jobs/videos.txt", lines);
        storage
    }

    #[tokio::test]
    async fn test_invalid_cardinality_rejected_at_construction() {
        let storage = Arc::new(InMemoryStorage::new());
        let config = BalancerConfig::new("/jobs/videos.txt").with_items_per_group(0);
        let error = ManifestOrchestrator::new(config, storage).unwrap_err();
        assert!(matches!(error, BalancerError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_missing_source_aborts_without_output() {
        let storage = Arc::new(InMemoryStorage::new());
        let orchestrator =
            ManifestOrchestrator::new(BalancerConfig::new("/jobs/videos.txt"), storage.clone())
                .unwrap();

        let error = orchestrator.run().await.unwrap_err();
        assert_eq!(error, BalancerError::not_found("/jobs/videos.txt"));
        assert!(storage.writes().is_empty());
    }

    #[tokio::test]
    async fn test_directory_source_is_not_a_file() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.insert_directory("/jobs/videos.txt");
        let orchestrator =
            ManifestOrchestrator::new(BalancerConfig::new("/jobs/videos.txt"), storage.clone())
                .unwrap();

        let error = orchestrator.run().await.unwrap_err();
        assert_eq!(error, BalancerError::not_a_file("/jobs/videos.txt"));
    }

    #[tokio::test]
    async fn test_balanced_run_writes_sorted_manifest() {
        let storage = storage_with_manifest("/v/a\n/v/b\n/v/c\n/v/d\n");
        storage.insert_sized("/v/a", 100);
        storage.insert_sized("/v/b", 100);
        storage.insert_sized("/v/c", 100);
        storage.insert_sized("/v/d", 100);

        let orchestrator =
            ManifestOrchestrator::new(BalancerConfig::new("/jobs/videos.txt"), storage.clone())
                .unwrap();
        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome.manifest_path, "/jobs/sort_videos.txt");
        assert!(outcome.balanced);
        assert_eq!(outcome.group_count, 2);
        let summary = outcome.summary.unwrap();
        assert_eq!(summary.max_group_size, 200);
        assert_eq!(summary.min_group_size, 200);
        assert_eq!(
            storage.file_contents("/jobs/sort_videos.txt").as_deref(),
            Some("/v/a\n/v/d\n/v/b\n/v/c\n")
        );
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_output() {
        let storage = storage_with_manifest("/v/a\n");
        storage.insert_sized("/v/a", 1);
        let orchestrator =
            ManifestOrchestrator::new(BalancerConfig::new("/jobs/videos.txt"), storage.clone())
                .unwrap();

        orchestrator.cancellation_flag().store(true, Ordering::SeqCst);
        let error = orchestrator.run().await.unwrap_err();

        assert!(matches!(error, BalancerError::Cancelled { ref stage } if stage == stages::VALIDATE));
        assert!(storage.writes().is_empty());
    }

    #[tokio::test]
    async fn test_pass_through_skips_probing() {
        let storage = storage_with_manifest("/v/b\n/v/a\n/v/b\n/v/missing\n");
        let config = BalancerConfig::new("/jobs/videos.txt")
            .with_sort_enabled(false)
            .with_probe_failure_policy(ProbeFailurePolicy::FailFast);
        let orchestrator = ManifestOrchestrator::new(config, storage.clone()).unwrap();

        let outcome = orchestrator.run().await.unwrap();

        assert!(!outcome.balanced);
        assert!(outcome.summary.is_none());
        assert_eq!(outcome.items_written, 3);
        assert_eq!(storage.status_calls("/v/missing"), 0);
        assert_eq!(
            storage.file_contents(&outcome.manifest_path).as_deref(),
            Some("/v/a\n/v/b\n/v/missing\n")
        );
    }
}
