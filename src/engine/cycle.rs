//! Cycle guard for prospective blocking edges
//!
//! A new link `blocker -> blocked` closes a cycle exactly when `blocker` is
//! already reachable from `blocked` by following existing links downstream.

use std::collections::{HashMap, HashSet, VecDeque};

use super::downstream_of;
use crate::domain::{BlockingLink, DependencyType, TaskId};
use crate::storage::{EdgeSource, StoreError};

/// Returns true if recording the edge would create a blocking cycle
pub fn would_create_cycle<S: EdgeSource + ?Sized>(
    source: &S,
    task_id: TaskId,
    depends_on_task_id: TaskId,
    dependency_type: DependencyType,
) -> Result<bool, StoreError> {
    Ok(find_cycle_path(source, task_id, depends_on_task_id, dependency_type)?.is_some())
}

/// Returns the existing path that the edge would close into a cycle
///
/// The path runs from the task the new edge would block to the task that
/// would block it, both inclusive. `relates_to` edges never produce a path.
pub fn find_cycle_path<S: EdgeSource + ?Sized>(
    source: &S,
    task_id: TaskId,
    depends_on_task_id: TaskId,
    dependency_type: DependencyType,
) -> Result<Option<Vec<TaskId>>, StoreError> {
    let Some(link) = BlockingLink::of(task_id, depends_on_task_id, dependency_type) else {
        return Ok(None);
    };

    if link.blocker == link.blocked {
        return Ok(Some(vec![link.blocked]));
    }

    let mut parents: HashMap<TaskId, TaskId> = HashMap::new();
    let mut visited = HashSet::from([link.blocked]);
    let mut queue = VecDeque::from([link.blocked]);

    while let Some(current) = queue.pop_front() {
        let edges = source.edges_for_task(current)?;
        for next in downstream_of(&edges, current) {
            if !visited.insert(next) {
                continue;
            }
            parents.insert(next, current);

            if next == link.blocker {
                return Ok(Some(trace_back(&parents, link.blocked, next)));
            }
            queue.push_back(next);
        }
    }

    Ok(None)
}

fn trace_back(parents: &HashMap<TaskId, TaskId>, start: TaskId, end: TaskId) -> Vec<TaskId> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match parents.get(&current) {
            Some(parent) => {
                current = *parent;
                path.push(current);
            }
            None => break,
        }
    }
    path.reverse();
    path
}
