//! # Partitioner
//!
//! Splits sized items into `G = ceil(N / k)` ordered groups of exactly `k`
//! items (the last group takes the remainder) while keeping the per-group byte
//! sums close together.
//!
//! Cardinality is the hard constraint here, not weight: the external splitter
//! cuts the manifest every `k` lines no matter what, so the only lever left is
//! which items share a chunk. Finding the optimal assignment is NP-hard; the
//! assigners are heuristics whose contract is determinism, fixed cardinality,
//! full coverage and low skew.
//!
//! ```text
//! sorted by size desc:  9 8 7 6 5 4 3 2 1      k = 3, G = 3
//!
//!            group 0   group 1   group 2
//! pass 1  →     9         8         7
//! pass 2  ←     4         5         6
//! pass 3  →     3         2         1
//!              16        15        14
//! ```

pub mod least_loaded;
pub mod serpentine;

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::PartitionStrategy;
use crate::error::{BalancerError, Result};
use crate::models::{Group, PartitionPlan, SizedItem};

pub use least_loaded::LeastLoadedAssigner;
pub use serpentine::SerpentineAssigner;

/// Strategy for distributing size-sorted items over fixed-capacity groups
pub trait GroupAssigner: Send + Sync {
    /// Assign items to groups
    ///
    /// `sorted` is in balancing order (size descending, reference ascending)
    /// and `capacities[i]` is the exact number of items group `i` must receive;
    /// capacities sum to `sorted.len()`. Returns, per group, indices into
    /// `sorted` in assignment order.
    fn assign(&self, sorted: &[SizedItem], capacities: &[usize]) -> Vec<Vec<usize>>;

    fn name(&self) -> &'static str;
}

/// Computes a [`PartitionPlan`] from a set of sized items
pub struct Partitioner {
    assigner: Box<dyn GroupAssigner>,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(PartitionStrategy::default())
    }
}

impl std::fmt::Debug for Partitioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partitioner")
            .field("assigner", &self.assigner.name())
            .finish()
    }
}

impl Partitioner {
    pub fn new(strategy: PartitionStrategy) -> Self {
        match strategy {
            PartitionStrategy::Serpentine => Self::with_assigner(Box::new(SerpentineAssigner)),
            PartitionStrategy::LeastLoaded => Self::with_assigner(Box::new(LeastLoadedAssigner)),
        }
    }

    pub fn with_assigner(assigner: Box<dyn GroupAssigner>) -> Self {
        Self { assigner }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.assigner.name()
    }

    /// Partition `items` into groups of `items_per_group`
    ///
    /// Fails with `InvalidConfig` when `items_per_group` is zero. An empty input
    /// yields a plan with zero groups; fewer than `k` items yield one group.
    /// Identical input sets produce identical plans regardless of input order.
    pub fn partition<I>(&self, items: I, items_per_group: usize) -> Result<PartitionPlan>
    where
        I: IntoIterator<Item = SizedItem>,
    {
        let k = NonZeroUsize::new(items_per_group).ok_or_else(|| {
            BalancerError::InvalidConfig("items_per_group must be a positive integer".to_string())
        })?;

        let mut sorted: Vec<SizedItem> = items.into_iter().collect();
        sorted.sort_by(SizedItem::cmp_for_balancing);
        // Identity is the reference; a repeated reference keeps its largest size
        let mut seen = HashSet::with_capacity(sorted.len());
        sorted.retain(|item| seen.insert(item.item_ref().clone()));

        let item_count = sorted.len();
        if item_count == 0 {
            debug!("No items to partition, returning empty plan");
            return Ok(PartitionPlan::empty(k));
        }

        let started = Instant::now();
        let capacities = group_capacities(item_count, k.get());
        let assignments = self.assigner.assign(&sorted, &capacities);

        let groups = assignments
            .into_iter()
            .enumerate()
            .map(|(index, members)| {
                Group::new(index, members.into_iter().map(|i| sorted[i].clone()).collect())
            })
            .collect();

        let plan = PartitionPlan::from_groups(k, groups, item_count)?;
        let summary = plan.summary();

        info!(
            strategy = self.assigner.name(),
            items = summary.item_count,
            groups = summary.group_count,
            items_per_group = k.get(),
            max_group_bytes = summary.max_group_size,
            min_group_bytes = summary.min_group_size,
            skew = summary.skew,
            duration_us = started.elapsed().as_micros() as u64,
            "Partition plan computed"
        );

        Ok(plan)
    }
}

/// Exact item count for each of the `ceil(n / k)` groups
pub fn group_capacities(item_count: usize, items_per_group: usize) -> Vec<usize> {
    if item_count == 0 || items_per_group == 0 {
        return Vec::new();
    }

    let group_count = item_count.div_ceil(items_per_group);
    let mut capacities = vec![items_per_group; group_count];
    if let Some(last) = capacities.last_mut() {
        *last = item_count - items_per_group * (group_count - 1);
    }
    capacities
}
