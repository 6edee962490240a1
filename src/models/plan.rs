use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;

use super::item::{ItemRef, SizedItem};
use crate::error::{BalancerError, Result};

/// One bin of the plan; becomes one task once the manifest is chunked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    index: usize,
    items: Vec<SizedItem>,
}

impl Group {
    pub fn new(index: usize, items: Vec<SizedItem>) -> Self {
        Self { index, items }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Items in assignment order
    pub fn items(&self) -> &[SizedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.items
            .iter()
            .map(SizedItem::size)
            .fold(0u64, u64::saturating_add)
    }

    pub fn item_refs(&self) -> impl Iterator<Item = &ItemRef> {
        self.items.iter().map(SizedItem::item_ref)
    }
}

/// Balance statistics for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    pub group_count: usize,
    pub item_count: usize,
    pub total_size: u64,
    pub max_group_size: u64,
    pub min_group_size: u64,
    /// `max_group_size - min_group_size`
    pub skew: u64,
}

/// Ordered groups covering every sized item exactly once
///
/// Every group except the last holds exactly `items_per_group` items, so the
/// group boundaries survive serialization as fixed-stride line chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    items_per_group: NonZeroUsize,
    groups: Vec<Group>,
}

impl PartitionPlan {
    pub fn empty(items_per_group: NonZeroUsize) -> Self {
        Self {
            items_per_group,
            groups: Vec::new(),
        }
    }

    /// Build a plan from assigned groups, verifying the cardinality and coverage invariants
    pub fn from_groups(
        items_per_group: NonZeroUsize,
        groups: Vec<Group>,
        expected_items: usize,
    ) -> Result<Self> {
        let plan = Self {
            items_per_group,
            groups,
        };
        plan.verify(expected_items)?;
        Ok(plan)
    }

    pub fn items_per_group(&self) -> NonZeroUsize {
        self.items_per_group
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every reference in manifest order: groups in index order, items in assignment order
    pub fn item_refs(&self) -> impl Iterator<Item = &ItemRef> {
        self.groups.iter().flat_map(Group::item_refs)
    }

    /// Check the plan against its structural invariants
    ///
    /// - group count is `ceil(N / k)` and indices run `0..G`
    /// - every group but the last holds exactly `k` items, the last `1..=k`
    /// - no reference appears twice and the total is `expected_items`
    pub fn verify(&self, expected_items: usize) -> Result<()> {
        let k = self.items_per_group.get();
        let expected_groups = expected_items.div_ceil(k);

        if self.groups.len() != expected_groups {
            return Err(BalancerError::Internal(format!(
                "plan has {} groups, expected {} for {} items at k={}",
                self.groups.len(),
                expected_groups,
                expected_items,
                k
            )));
        }

        let last = self.groups.len().saturating_sub(1);
        let mut seen: HashSet<&ItemRef> = HashSet::with_capacity(expected_items);

        for (position, group) in self.groups.iter().enumerate() {
            if group.index != position {
                return Err(BalancerError::Internal(format!(
                    "group at position {position} carries index {}",
                    group.index
                )));
            }

            let cardinality_ok = if position < last {
                group.len() == k
            } else {
                (1..=k).contains(&group.len())
            };
            if !cardinality_ok {
                return Err(BalancerError::Internal(format!(
                    "group {position} holds {} items with k={k}",
                    group.len()
                )));
            }

            for item_ref in group.item_refs() {
                if !seen.insert(item_ref) {
                    return Err(BalancerError::Internal(format!(
                        "item {item_ref} assigned to more than one group"
                    )));
                }
            }
        }

        if seen.len() != expected_items {
            return Err(BalancerError::Internal(format!(
                "plan covers {} items, expected {expected_items}",
                seen.len()
            )));
        }

        Ok(())
    }

    pub fn summary(&self) -> PlanSummary {
        let sums: Vec<u64> = self.groups.iter().map(Group::total_size).collect();
        let max_group_size = sums.iter().copied().max().unwrap_or(0);
        let min_group_size = sums.iter().copied().min().unwrap_or(0);

        PlanSummary {
            group_count: self.groups.len(),
            item_count: self.item_count(),
            total_size: sums.iter().copied().fold(0u64, u64::saturating_add),
            max_group_size,
            min_group_size,
            skew: max_group_size - min_group_size,
        }
    }
}
