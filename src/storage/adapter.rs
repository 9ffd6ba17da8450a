//! Store contracts consumed by the dependency engine
//!
//! [`EdgeSource`] is the read side the graph algorithms need: edges touching
//! one task, and an owner-scoped bulk task lookup. [`DependencyStore`] adds
//! the single-edge writes used by the service layer.

use thiserror::Error;

use crate::domain::{DependencyEdge, EdgeId, NewDependency, TaskId, TaskSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Dependency {task_id} -> {depends_on_task_id} ({dependency_type}) already exists")]
    Conflict {
        task_id: TaskId,
        depends_on_task_id: TaskId,
        dependency_type: crate::domain::DependencyType,
    },

    #[error("Corrupt {table} row {row}: {message}")]
    Corrupt {
        table: &'static str,
        row: i64,
        message: String,
    },
}

/// Read access to persisted dependency edges and task summaries
pub trait EdgeSource {
    /// Returns every edge where `task` is either endpoint, ordered by edge ID
    fn edges_for_task(&self, task: TaskId) -> Result<Vec<DependencyEdge>, StoreError>;

    /// Returns the summaries of the tasks in `ids` that belong to `owner`.
    /// Unknown or foreign IDs are silently skipped.
    fn tasks_by_ids(&self, ids: &[TaskId], owner: &str) -> Result<Vec<TaskSummary>, StoreError>;
}

/// Read/write access to dependency edges
///
/// Writes are single-edge and atomic. Implementations must reject an exact
/// duplicate `(task_id, depends_on_task_id, dependency_type)` with
/// [`StoreError::Conflict`].
pub trait DependencyStore: EdgeSource {
    fn insert_edge(&mut self, new: NewDependency) -> Result<DependencyEdge, StoreError>;

    fn find_edge(&self, id: EdgeId) -> Result<Option<DependencyEdge>, StoreError>;

    /// Removes an edge, returning false if it did not exist
    fn delete_edge(&mut self, id: EdgeId) -> Result<bool, StoreError>;

    /// Returns every edge recorded on a task owned by `owner`
    fn edges_for_owner(&self, owner: &str) -> Result<Vec<DependencyEdge>, StoreError>;
}
