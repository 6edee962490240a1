//! # Orchestration
//!
//! Sequences the balancing pipeline and hands the result to the batch engine:
//!
//! ```text
//! validate → ManifestReader → SizeProbe (per item) → Partitioner → ManifestWriter → BatchEngine
//! ```
//!
//! Stages run strictly in order with no state shared between them. Probing is
//! the only concurrent stage and it completes fully before partitioning starts.
//! A run can be cancelled between stages; once the output write has started it
//! runs to completion or fails without leaving a partial manifest.

pub mod engine;
pub mod manifest_orchestrator;

pub use engine::{BatchEngine, JobSubmission, SubmissionReceipt};
pub use manifest_orchestrator::{BalancingOutcome, ManifestOrchestrator};
