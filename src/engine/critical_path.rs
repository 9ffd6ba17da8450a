//! Critical path search
//!
//! Longest chain of blocking links inside a collected chain, from a task with
//! no blockers to a task with no dependents. Runs in O(V + E): tasks are
//! visited in topological order and each keeps the length of the longest
//! path ending at it.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use super::chain::Chain;
use crate::domain::TaskId;

/// Returns the task IDs on the longest blocking chain, blockers first
///
/// Ties prefer the smaller predecessor ID at each step and then the smaller
/// final task ID. A chain without links, or one whose stored edges contain a
/// cycle, yields the root alone.
pub fn find_critical_path(chain: &Chain) -> Vec<TaskId> {
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
    for task in &chain.tasks {
        graph.add_node(*task);
    }
    for link in chain.links() {
        graph.add_edge(link.blocker, link.blocked, ());
    }

    if graph.edge_count() == 0 {
        return vec![chain.root];
    }

    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(_) => return vec![chain.root],
    };

    let mut length: HashMap<TaskId, usize> = HashMap::with_capacity(order.len());
    let mut previous: HashMap<TaskId, TaskId> = HashMap::new();

    for task in &order {
        let mut blockers: Vec<TaskId> = graph
            .neighbors_directed(*task, Direction::Incoming)
            .collect();
        blockers.sort();

        let mut best = 1;
        for blocker in blockers {
            let candidate = length.get(&blocker).copied().unwrap_or(1) + 1;
            if candidate > best {
                best = candidate;
                previous.insert(*task, blocker);
            }
        }
        length.insert(*task, best);
    }

    let mut end: Option<(TaskId, usize)> = None;
    for task in &chain.tasks {
        let is_sink = graph
            .neighbors_directed(*task, Direction::Outgoing)
            .next()
            .is_none();
        let task_length = length.get(task).copied().unwrap_or(1);
        if is_sink && end.map_or(true, |(_, best)| task_length > best) {
            end = Some((*task, task_length));
        }
    }

    let Some((mut current, _)) = end else {
        return vec![chain.root];
    };

    let mut path = vec![current];
    while let Some(blocker) = previous.get(&current) {
        current = *blocker;
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, NewDependency};
    use crate::engine::{assign_levels, collect_chain};
    use crate::storage::{DependencyStore, MemoryStore};

    fn store_with(count: usize) -> (MemoryStore, Vec<TaskId>) {
        let mut store = MemoryStore::new();
        let ids = (1..=count)
            .map(|i| store.add_task("alice", &format!("Task {}", i)))
            .collect();
        (store, ids)
    }

    fn blocks(store: &mut MemoryStore, blocker: TaskId, blocked: TaskId) {
        store
            .insert_edge(NewDependency {
                task_id: blocker,
                depends_on_task_id: blocked,
                dependency_type: DependencyType::Blocks,
            })
            .unwrap();
    }

    fn path_for(store: &MemoryStore, root: TaskId) -> Vec<TaskId> {
        find_critical_path(&collect_chain(store, root).unwrap())
    }

    #[test]
    fn isolated_task_is_its_own_path() {
        let (store, t) = store_with(1);
        assert_eq!(path_for(&store, t[0]), vec![t[0]]);
    }

    #[test]
    fn linear_chain_from_the_middle() {
        let (mut store, t) = store_with(3);
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[1], t[2]);

        assert_eq!(path_for(&store, t[1]), vec![t[0], t[1], t[2]]);
    }

    #[test]
    fn picks_the_longer_branch() {
        let (mut store, t) = store_with(5);
        // A blocks B; A blocks C -> D -> E
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[0], t[2]);
        blocks(&mut store, t[2], t[3]);
        blocks(&mut store, t[3], t[4]);

        assert_eq!(path_for(&store, t[0]), vec![t[0], t[2], t[3], t[4]]);
    }

    #[test]
    fn skips_shortcut_edges() {
        let (mut store, t) = store_with(3);
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[1], t[2]);
        blocks(&mut store, t[0], t[2]);

        assert_eq!(path_for(&store, t[0]), vec![t[0], t[1], t[2]]);
    }

    #[test]
    fn ties_prefer_smaller_ids() {
        let (mut store, t) = store_with(4);
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[0], t[2]);
        blocks(&mut store, t[1], t[3]);
        blocks(&mut store, t[2], t[3]);

        assert_eq!(path_for(&store, t[0]), vec![t[0], t[1], t[3]]);
    }

    #[test]
    fn longest_route_into_the_root() {
        let (mut store, t) = store_with(4);
        // A blocks root B directly and through C -> D
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[0], t[2]);
        blocks(&mut store, t[2], t[3]);
        blocks(&mut store, t[3], t[1]);

        let path = path_for(&store, t[1]);
        assert_eq!(path, vec![t[0], t[2], t[3], t[1]]);
    }

    #[test]
    fn legacy_cycle_falls_back_to_root() {
        let (mut store, t) = store_with(2);
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[1], t[0]);

        assert_eq!(path_for(&store, t[0]), vec![t[0]]);
    }

    #[test]
    fn path_fits_within_the_level_span() {
        let (mut store, t) = store_with(6);
        blocks(&mut store, t[0], t[1]);
        blocks(&mut store, t[1], t[2]);
        blocks(&mut store, t[2], t[3]);
        blocks(&mut store, t[1], t[4]);
        blocks(&mut store, t[5], t[2]);

        let chain = collect_chain(&store, t[2]).unwrap();
        let levels = assign_levels(&chain);
        let path = find_critical_path(&chain);

        let lowest = levels.iter().map(|(_, level)| level).min().unwrap();
        let highest = levels.iter().map(|(_, level)| level).max().unwrap();
        assert!(path.len() as i64 <= highest - lowest + 1);
    }
}
