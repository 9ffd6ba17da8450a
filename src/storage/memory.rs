//! In-memory store
//!
//! Keeps tasks and edges in ordered maps. Used by tests and by callers that
//! embed the engine over data they already hold.

use std::cell::Cell;
use std::collections::BTreeMap;

use chrono::Utc;

use super::adapter::{DependencyStore, EdgeSource, StoreError};
use crate::domain::{DependencyEdge, EdgeId, NewDependency, TaskId, TaskSummary};

#[derive(Debug, Clone)]
struct OwnedTask {
    owner: String,
    summary: TaskSummary,
}

/// Store backed by `BTreeMap`s
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, OwnedTask>,
    edges: BTreeMap<EdgeId, DependencyEdge>,
    last_task_id: i64,
    last_edge_id: i64,
    /// Number of `edges_for_task` calls served
    edge_fetches: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a todo task for `owner` and returns its ID
    pub fn add_task(&mut self, owner: &str, title: &str) -> TaskId {
        self.last_task_id += 1;
        let id = TaskId::new(self.last_task_id).expect("task IDs start at 1");
        self.insert_task(owner, TaskSummary::new(id, title));
        id
    }

    /// Inserts or replaces a task summary
    pub fn insert_task(&mut self, owner: &str, summary: TaskSummary) {
        self.last_task_id = self.last_task_id.max(summary.id.get());
        self.tasks.insert(
            summary.id,
            OwnedTask {
                owner: owner.to_string(),
                summary,
            },
        );
    }

    /// Number of edges currently stored
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of per-task edge lookups served so far
    pub fn edge_fetches(&self) -> usize {
        self.edge_fetches.get()
    }
}

impl EdgeSource for MemoryStore {
    fn edges_for_task(&self, task: TaskId) -> Result<Vec<DependencyEdge>, StoreError> {
        self.edge_fetches.set(self.edge_fetches.get() + 1);
        Ok(self
            .edges
            .values()
            .filter(|edge| edge.touches(task))
            .cloned()
            .collect())
    }

    fn tasks_by_ids(&self, ids: &[TaskId], owner: &str) -> Result<Vec<TaskSummary>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .filter(|task| task.owner == owner)
            .map(|task| task.summary.clone())
            .collect())
    }
}

impl DependencyStore for MemoryStore {
    fn insert_edge(&mut self, new: NewDependency) -> Result<DependencyEdge, StoreError> {
        if self.edges.values().any(|edge| edge.same_as(&new)) {
            return Err(StoreError::Conflict {
                task_id: new.task_id,
                depends_on_task_id: new.depends_on_task_id,
                dependency_type: new.dependency_type,
            });
        }

        self.last_edge_id += 1;
        let id = EdgeId::new(self.last_edge_id).map_err(|e| StoreError::Corrupt {
            table: "task_dependencies",
            row: self.last_edge_id,
            message: e.to_string(),
        })?;
        let edge = DependencyEdge {
            id,
            task_id: new.task_id,
            depends_on_task_id: new.depends_on_task_id,
            dependency_type: new.dependency_type,
            created_at: Utc::now(),
        };
        self.edges.insert(edge.id, edge.clone());
        Ok(edge)
    }

    fn find_edge(&self, id: EdgeId) -> Result<Option<DependencyEdge>, StoreError> {
        Ok(self.edges.get(&id).cloned())
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<bool, StoreError> {
        Ok(self.edges.remove(&id).is_some())
    }

    fn edges_for_owner(&self, owner: &str) -> Result<Vec<DependencyEdge>, StoreError> {
        Ok(self
            .edges
            .values()
            .filter(|edge| {
                self.tasks
                    .get(&edge.task_id)
                    .is_some_and(|task| task.owner == owner)
            })
            .cloned()
            .collect())
    }
}
