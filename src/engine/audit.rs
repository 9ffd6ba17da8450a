//! Whole-graph consistency check
//!
//! The cycle guard keeps new edges safe, but rows written before it existed,
//! or two racing inserts, can still leave a loop behind. The audit builds the
//! full blocking graph for one owner and reports every such loop.

use std::collections::BTreeSet;

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;

use crate::domain::{DependencyEdge, TaskId};

/// Result of auditing a set of edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Tasks touched by at least one edge
    pub task_count: usize,
    /// Distinct blocking links after normalization
    pub blocking_links: usize,
    /// Informational `relates_to` edges
    pub related_edges: usize,
    /// Groups of tasks that block each other in a loop, each sorted by ID
    pub cycles: Vec<Vec<TaskId>>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Audits the given edges for blocking cycles
pub fn audit(edges: &[DependencyEdge]) -> AuditReport {
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
    let mut tasks = BTreeSet::new();
    let mut related_edges = 0;

    for edge in edges {
        tasks.insert(edge.task_id);
        tasks.insert(edge.depends_on_task_id);
        match edge.blocking_link() {
            Some(link) => {
                graph.add_edge(link.blocker, link.blocked, ());
            }
            None => related_edges += 1,
        }
    }

    let mut cycles = Vec::new();
    if is_cyclic_directed(&graph) {
        for mut component in tarjan_scc(&graph) {
            let looped = component.len() > 1
                || component
                    .first()
                    .is_some_and(|task| graph.contains_edge(*task, *task));
            if looped {
                component.sort();
                cycles.push(component);
            }
        }
        cycles.sort();
    }

    AuditReport {
        task_count: tasks.len(),
        blocking_links: graph.edge_count(),
        related_edges,
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, EdgeId};
    use chrono::Utc;

    fn edge(id: i64, task: i64, on: i64, dependency_type: DependencyType) -> DependencyEdge {
        DependencyEdge {
            id: EdgeId::new(id).unwrap(),
            task_id: TaskId::new(task).unwrap(),
            depends_on_task_id: TaskId::new(on).unwrap(),
            dependency_type,
            created_at: Utc::now(),
        }
    }

    fn ids(raw: &[i64]) -> Vec<TaskId> {
        raw.iter().map(|n| TaskId::new(*n).unwrap()).collect()
    }

    #[test]
    fn clean_graph() {
        let report = audit(&[
            edge(1, 1, 2, DependencyType::Blocks),
            edge(2, 3, 2, DependencyType::BlockedBy),
            edge(3, 1, 3, DependencyType::RelatesTo),
        ]);

        assert!(report.is_clean());
        assert_eq!(report.task_count, 3);
        assert_eq!(report.blocking_links, 2);
        assert_eq!(report.related_edges, 1);
    }

    #[test]
    fn mirrored_edges_count_once() {
        let report = audit(&[
            edge(1, 1, 2, DependencyType::Blocks),
            edge(2, 2, 1, DependencyType::BlockedBy),
        ]);

        assert!(report.is_clean());
        assert_eq!(report.blocking_links, 1);
    }

    #[test]
    fn reports_each_loop() {
        let report = audit(&[
            edge(1, 1, 2, DependencyType::Blocks),
            edge(2, 2, 3, DependencyType::Blocks),
            edge(3, 3, 1, DependencyType::Blocks),
            edge(4, 5, 4, DependencyType::Blocks),
            edge(5, 5, 4, DependencyType::BlockedBy),
            edge(6, 6, 7, DependencyType::Blocks),
        ]);

        assert_eq!(report.cycles, vec![ids(&[1, 2, 3]), ids(&[4, 5])]);
    }

    #[test]
    fn relates_to_loops_are_ignored() {
        let report = audit(&[
            edge(1, 1, 2, DependencyType::RelatesTo),
            edge(2, 2, 1, DependencyType::RelatesTo),
        ]);

        assert!(report.is_clean());
    }
}
