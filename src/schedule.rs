//! `TreeScheduler`: the per-level merge-group assignment.

use std::collections::HashMap;

use crate::error::{HsvdError, HsvdResult};

/// The parent assignment computed for one level.
pub struct MergePlan {
    /// `S_{ℓ+1}`, in ascending-rank order; its first element is always
    /// `S_ℓ[0]` so that rank 0 survives to the final level.
    pub future_nodes: Vec<i32>,
    /// `child -> parent`, present only for ranks that are not themselves a
    /// future node.
    pub send_to: HashMap<i32, i32>,
    /// `parent -> [children]`, ascending child-rank order (the order
    /// `MergeTransport` must concatenate in).
    pub recv_from: HashMap<i32, Vec<i32>>,
}

/// Computes the level-to-level merge schedule.
pub struct TreeScheduler;

impl TreeScheduler {
    /// Fails fast if `maxmergedim` could never admit a single two-child
    /// group given `maxrank`/`safetyshift`; reused verbatim by
    /// `FrontendGates`.
    pub fn check_feasible(maxmergedim: usize, maxrank: usize, safetyshift: usize) -> HsvdResult<()> {
        let floor = 2 * (maxrank + safetyshift) + 1;
        if maxmergedim < floor {
            return Err(HsvdError::Scheduling(format!(
                "maxmergedim={maxmergedim} is too small; need maxmergedim >= \
                 2*(maxrank+safetyshift)+1 = {floor} (or leave maxmergedim unset)"
            )));
        }
        Ok(())
    }

    /// `active`: `S_ℓ`, ascending rank order. `widths`: indexed by global
    /// rank, `widths[r]` is `r`'s current local factor width (only entries
    /// for ranks in `active` are read).
    pub fn plan(active: &[i32], widths: &[usize], maxmergedim: usize, no_of_merges: Option<usize>) -> MergePlan {
        assert!(!active.is_empty());

        let mut future_nodes = vec![active[0]];
        let mut send_to = HashMap::new();
        let mut current_future = active[0];
        let mut used = widths[active[0] as usize];
        let mut count = 1usize;

        for &c in &active[1..] {
            let w = widths[c as usize];
            let start_new_group = used + w > maxmergedim || no_of_merges == Some(count);
            if start_new_group {
                current_future = c;
                future_nodes.push(current_future);
                used = w;
                count = 1;
            } else {
                send_to.insert(c, current_future);
                used += w;
                count += 1;
            }
        }

        let mut recv_from: HashMap<i32, Vec<i32>> =
            future_nodes.iter().map(|&f| (f, Vec::new())).collect();
        for (&child, &parent) in &send_to {
            recv_from.get_mut(&parent).unwrap().push(child);
        }
        for children in recv_from.values_mut() {
            children.sort_unstable();
        }

        MergePlan {
            future_nodes,
            send_to,
            recv_from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_tree_pairs_up_adjacent_ranks() {
        let active: Vec<i32> = (0..4).collect();
        let widths = vec![10, 10, 10, 10];
        let plan = TreeScheduler::plan(&active, &widths, 100, Some(2));
        assert_eq!(plan.future_nodes, vec![0, 2]);
        assert_eq!(plan.send_to.get(&1), Some(&0));
        assert_eq!(plan.send_to.get(&3), Some(&2));
        assert_eq!(plan.recv_from[&0], vec![1]);
        assert_eq!(plan.recv_from[&2], vec![3]);
    }

    #[test]
    fn merge_width_cap_forces_a_new_group() {
        let active: Vec<i32> = (0..3).collect();
        let widths = vec![8, 8, 8];
        // only two widths of 8 fit under 17, so rank 2 must start a new group
        let plan = TreeScheduler::plan(&active, &widths, 17, None);
        assert_eq!(plan.future_nodes, vec![0, 2]);
        assert_eq!(plan.send_to.get(&1), Some(&0));
        assert!(!plan.send_to.contains_key(&2));
    }

    #[test]
    fn rank_zero_always_survives_as_first_future_node() {
        let active: Vec<i32> = (0..8).collect();
        let widths = vec![1; 8];
        let plan = TreeScheduler::plan(&active, &widths, 1000, Some(2));
        assert_eq!(plan.future_nodes[0], 0);
    }

    #[test]
    fn infeasible_merge_width_is_rejected() {
        assert!(TreeScheduler::check_feasible(3, 5, 5).is_err());
        assert!(TreeScheduler::check_feasible(21, 5, 5).is_ok());
    }
}
