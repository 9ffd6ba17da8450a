//! Level assignment
//!
//! The root sits at level 0. A task's blockers sit one level lower than the
//! task itself, its dependents one level higher. When a task is reachable by
//! several paths the longest one wins, so a dependent is always strictly
//! above every in-chain blocker it has on its side of the root.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::chain::Chain;
use crate::domain::TaskId;

/// Signed depth of every task in a chain relative to its root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    levels: BTreeMap<TaskId, i64>,
}

impl Levels {
    pub fn get(&self, task: TaskId) -> Option<i64> {
        self.levels.get(&task).copied()
    }

    /// Blockers of the root, nearest first
    pub fn upstream(&self) -> Vec<(TaskId, i64)> {
        let mut upstream: Vec<_> = self
            .iter()
            .filter(|(_, level)| *level < 0)
            .collect();
        upstream.sort_by_key(|(task, level)| (-level, *task));
        upstream
    }

    /// Dependents of the root, nearest first
    pub fn downstream(&self) -> Vec<(TaskId, i64)> {
        let mut downstream: Vec<_> = self
            .iter()
            .filter(|(_, level)| *level > 0)
            .collect();
        downstream.sort_by_key(|(task, level)| (*level, *task));
        downstream
    }

    /// Largest distance from the root in either direction
    pub fn max_depth(&self) -> u64 {
        self.levels
            .values()
            .map(|level| level.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, i64)> + '_ {
        self.levels.iter().map(|(task, level)| (*task, *level))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Assigns a level to every task in the chain
///
/// Propagates breadth-first from the root: blockers of non-positive tasks are
/// pushed lower, dependents of non-negative tasks are pushed higher. A task is
/// re-queued only when its level moves further from the root. Magnitudes are
/// capped at the chain size, which no acyclic chain can reach, so stored
/// cycles end the propagation instead of looping.
pub fn assign_levels(chain: &Chain) -> Levels {
    let mut blockers: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for link in chain.links() {
        blockers.entry(link.blocked).or_default().push(link.blocker);
        dependents.entry(link.blocker).or_default().push(link.blocked);
    }

    let limit = chain.len() as i64;
    let mut levels = BTreeMap::from([(chain.root, 0i64)]);
    let mut queue = VecDeque::from([chain.root]);

    while let Some(current) = queue.pop_front() {
        let level = levels[&current];

        if level <= 0 {
            for &blocker in blockers.get(&current).into_iter().flatten() {
                let proposed = level - 1;
                if relax(&mut levels, blocker, proposed, limit, |new, old| new < old) {
                    queue.push_back(blocker);
                }
            }
        }

        if level >= 0 {
            for &dependent in dependents.get(&current).into_iter().flatten() {
                let proposed = level + 1;
                if relax(&mut levels, dependent, proposed, limit, |new, old| new > old) {
                    queue.push_back(dependent);
                }
            }
        }
    }

    Levels { levels }
}

fn relax(
    levels: &mut BTreeMap<TaskId, i64>,
    task: TaskId,
    proposed: i64,
    limit: i64,
    further: impl Fn(i64, i64) -> bool,
) -> bool {
    match levels.get(&task) {
        None => {
            levels.insert(task, proposed);
            true
        }
        Some(&current) if proposed.abs() < limit && further(proposed, current) => {
            levels.insert(task, proposed);
            true
        }
        Some(_) => false,
    }
}
