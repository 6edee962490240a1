use super::GroupAssigner;
use crate::models::SizedItem;

/// Boustrophedon round robin
///
/// Walks the groups left to right, then right to left, repeatedly, handing the
/// next largest item to each visited group that still has room. Large items
/// are spread across distinct groups and each reversal gives the groups that
/// just received the smallest item of a pass the largest item of the next.
/// With equal sizes it degenerates to plain round robin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerpentineAssigner;

impl GroupAssigner for SerpentineAssigner {
    fn assign(&self, sorted: &[SizedItem], capacities: &[usize]) -> Vec<Vec<usize>> {
        let group_count = capacities.len();
        let mut groups: Vec<Vec<usize>> = capacities
            .iter()
            .map(|capacity| Vec::with_capacity(*capacity))
            .collect();

        let mut next = 0;
        let mut forward = true;

        while next < sorted.len() {
            let placed_before = next;

            for step in 0..group_count {
                if next == sorted.len() {
                    break;
                }
                let group = if forward { step } else { group_count - 1 - step };
                if groups[group].len() < capacities[group] {
                    groups[group].push(next);
                    next += 1;
                }
            }

            // Capacities exhausted before items; plan verification reports it
            if next == placed_before {
                break;
            }
            forward = !forward;
        }

        groups
    }

    fn name(&self) -> &'static str {
        "serpentine"
    }
}
