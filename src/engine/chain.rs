//! Chain collection
//!
//! Expands outward from a root task: one frontier follows blockers
//! (upstream), the other follows blocked tasks (downstream). The result is the
//! root plus all of its transitive blockers and dependents, together with
//! every edge touching one of those tasks.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::{downstream_of, upstream_of};
use crate::domain::{BlockingLink, DependencyEdge, EdgeId, TaskId};
use crate::storage::{EdgeSource, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upstream,
    Downstream,
}

/// Tasks and edges around a root task
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub root: TaskId,
    /// Root, its transitive blockers and its transitive dependents
    pub tasks: BTreeSet<TaskId>,
    /// Every edge touching a task in `tasks`, ordered by edge ID
    pub edges: Vec<DependencyEdge>,
}

impl Chain {
    /// Blocking links with both endpoints inside the chain, deduplicated
    ///
    /// A `blocks` edge and its mirrored `blocked_by` edge yield one link.
    pub fn links(&self) -> BTreeSet<BlockingLink> {
        self.edges
            .iter()
            .filter_map(DependencyEdge::blocking_link)
            .filter(|link| link.blocker != link.blocked)
            .filter(|link| self.tasks.contains(&link.blocker) && self.tasks.contains(&link.blocked))
            .collect()
    }

    /// `relates_to` edges touching the chain
    pub fn related_edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges
            .iter()
            .filter(|edge| !edge.dependency_type.is_blocking())
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.tasks.contains(&task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Collects the chain around `root`
///
/// Each task's edges are fetched once. A task already in the chain is never
/// expanded again, so inconsistent stored data cannot make this loop.
pub fn collect_chain<S: EdgeSource + ?Sized>(source: &S, root: TaskId) -> Result<Chain, StoreError> {
    let mut tasks = BTreeSet::from([root]);
    let mut fetched: HashMap<TaskId, Vec<DependencyEdge>> = HashMap::new();
    let mut frontier = VecDeque::from([(root, Direction::Upstream), (root, Direction::Downstream)]);

    while let Some((current, direction)) = frontier.pop_front() {
        let edges = match fetched.entry(current) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut edges = source.edges_for_task(current)?;
                edges.retain(|edge| edge.touches(current));
                entry.insert(edges)
            }
        };

        let neighbors: Vec<TaskId> = match direction {
            Direction::Upstream => upstream_of(edges, current).collect(),
            Direction::Downstream => downstream_of(edges, current).collect(),
        };

        for next in neighbors {
            if tasks.insert(next) {
                frontier.push_back((next, direction));
            }
        }
    }

    let edges: BTreeMap<EdgeId, DependencyEdge> = fetched
        .into_values()
        .flatten()
        .map(|edge| (edge.id, edge))
        .collect();

    Ok(Chain {
        root,
        tasks,
        edges: edges.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, NewDependency};
    use crate::storage::{DependencyStore, MemoryStore};

    fn store_with(count: usize) -> (MemoryStore, Vec<TaskId>) {
        let mut store = MemoryStore::new();
        let ids = (1..=count)
            .map(|i| store.add_task("alice", &format!("Task {}", i)))
            .collect();
        (store, ids)
    }

    fn link(store: &mut MemoryStore, task: TaskId, on: TaskId, dependency_type: DependencyType) {
        store
            .insert_edge(NewDependency {
                task_id: task,
                depends_on_task_id: on,
                dependency_type,
            })
            .unwrap();
    }

    #[test]
    fn isolated_root_is_a_singleton() {
        let (store, t) = store_with(1);

        let chain = collect_chain(&store, t[0]).unwrap();
        assert_eq!(chain.tasks, BTreeSet::from([t[0]]));
        assert!(chain.edges.is_empty());
        assert!(chain.links().is_empty());
    }

    #[test]
    fn collects_both_directions() {
        let (mut store, t) = store_with(3);
        link(&mut store, t[0], t[1], DependencyType::Blocks);
        link(&mut store, t[1], t[2], DependencyType::Blocks);

        let chain = collect_chain(&store, t[1]).unwrap();
        assert_eq!(chain.tasks, BTreeSet::from([t[0], t[1], t[2]]));
        assert_eq!(chain.edges.len(), 2);
    }

    #[test]
    fn siblings_are_not_part_of_the_chain() {
        let (mut store, t) = store_with(3);
        // A blocks B and A blocks C; B's chain is {A, B}
        link(&mut store, t[0], t[1], DependencyType::Blocks);
        link(&mut store, t[0], t[2], DependencyType::Blocks);

        let chain = collect_chain(&store, t[1]).unwrap();
        assert_eq!(chain.tasks, BTreeSet::from([t[0], t[1]]));
        // The A -> C edge still touches A, so it is reported
        assert_eq!(chain.edges.len(), 2);
        // but it is not a link inside the chain
        assert_eq!(chain.links().len(), 1);
    }

    #[test]
    fn relates_to_does_not_expand() {
        let (mut store, t) = store_with(3);
        link(&mut store, t[0], t[1], DependencyType::Blocks);
        link(&mut store, t[1], t[2], DependencyType::RelatesTo);

        let chain = collect_chain(&store, t[1]).unwrap();
        assert_eq!(chain.tasks, BTreeSet::from([t[0], t[1]]));
        assert_eq!(chain.related_edges().count(), 1);
    }

    #[test]
    fn mirrored_edges_collapse_to_one_link() {
        let (mut store, t) = store_with(2);
        link(&mut store, t[0], t[1], DependencyType::Blocks);
        link(&mut store, t[1], t[0], DependencyType::BlockedBy);

        let chain = collect_chain(&store, t[0]).unwrap();
        assert_eq!(chain.edges.len(), 2);
        assert_eq!(chain.links().len(), 1);
    }

    #[test]
    fn legacy_cycle_terminates() {
        let (mut store, t) = store_with(3);
        link(&mut store, t[0], t[1], DependencyType::Blocks);
        link(&mut store, t[1], t[2], DependencyType::Blocks);
        link(&mut store, t[2], t[0], DependencyType::Blocks);

        let chain = collect_chain(&store, t[0]).unwrap();
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn each_task_is_fetched_once() {
        let (mut store, t) = store_with(4);
        // Diamond: A blocks B and C, both block D
        link(&mut store, t[0], t[1], DependencyType::Blocks);
        link(&mut store, t[0], t[2], DependencyType::Blocks);
        link(&mut store, t[1], t[3], DependencyType::Blocks);
        link(&mut store, t[2], t[3], DependencyType::Blocks);

        let chain = collect_chain(&store, t[0]).unwrap();
        assert_eq!(chain.len(), 4);
        assert_eq!(store.edge_fetches(), 4);
    }
}
