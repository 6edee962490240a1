use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::GroupAssigner;
use crate::models::SizedItem;

/// Greedy longest-processing-time assignment under a cardinality cap
///
/// Each item, largest first, goes to the group with the smallest running byte
/// sum among the groups that still have room; ties go to the lower group
/// index. Keeping the cap preserves chunk alignment with the splitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLoadedAssigner;

impl GroupAssigner for LeastLoadedAssigner {
    fn assign(&self, sorted: &[SizedItem], capacities: &[usize]) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = capacities
            .iter()
            .map(|capacity| Vec::with_capacity(*capacity))
            .collect();

        let mut open: BinaryHeap<Reverse<(u64, usize)>> = capacities
            .iter()
            .enumerate()
            .filter(|(_, capacity)| **capacity > 0)
            .map(|(group, _)| Reverse((0, group)))
            .collect();

        for (index, item) in sorted.iter().enumerate() {
            let Some(Reverse((load, group))) = open.pop() else {
                break;
            };

            groups[group].push(index);
            if groups[group].len() < capacities[group] {
                open.push(Reverse((load.saturating_add(item.size()), group)));
            }
        }

        groups
    }

    fn name(&self) -> &'static str {
        "least_loaded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(sizes: &[u64]) -> Vec<SizedItem> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, size)| SizedItem::new(format!("/v/{i}"), *size))
            .collect()
    }

    #[test]
    fn test_lightest_open_group_receives_next_item() {
        // 10 -> g0, 6 -> g1, 5 -> g1 (6 < 10), 4 -> g0 (g1 is full)
        let assignment = LeastLoadedAssigner.assign(&sized(&[10, 6, 5, 4]), &[2, 2]);
        assert_eq!(assignment, vec![vec![0, 3], vec![1, 2]]);
    }

    #[test]
    fn test_capacity_is_a_hard_limit() {
        // One huge item cannot pull every small item into the other group
        let assignment = LeastLoadedAssigner.assign(&sized(&[100, 1, 1, 1, 1, 1]), &[3, 3]);
        assert_eq!(assignment[0].len(), 3);
        assert_eq!(assignment[1].len(), 3);
        assert_eq!(assignment[0][0], 0);
    }

    #[test]
    fn test_tail_group_capacity_respected() {
        let assignment = LeastLoadedAssigner.assign(&sized(&[5, 4, 3, 2, 1]), &[2, 2, 1]);
        let lens: Vec<usize> = assignment.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![2, 2, 1]);
    }
}
