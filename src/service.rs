//! Dependency operations for one task owner
//!
//! [`DependencyService`] validates and persists single edges and answers the
//! read queries by running the engine and attaching task summaries. It holds
//! no state beyond the injected store and the owner it acts for, so callers
//! build one per request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    DependencyEdge, DependencyType, EdgeId, IdError, InvalidDependencyType, NewDependency, TaskId,
    TaskSummary,
};
use crate::engine::{self, AuditReport};
use crate::storage::{DependencyStore, StoreError};

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Dependency task not found: {0}")]
    DependencyTaskNotFound(TaskId),

    #[error("Task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    #[error(transparent)]
    InvalidDependencyType(#[from] InvalidDependencyType),

    #[error("Dependency already exists: {task_id} {dependency_type} {depends_on_task_id}")]
    DuplicateEdge {
        existing: Option<EdgeId>,
        task_id: TaskId,
        depends_on_task_id: TaskId,
        dependency_type: DependencyType,
    },

    #[error(
        "Circular dependency: {task_id} {dependency_type} {depends_on_task_id} would close {}",
        format_path(.path)
    )]
    CircularDependency {
        task_id: TaskId,
        depends_on_task_id: TaskId,
        dependency_type: DependencyType,
        path: Vec<TaskId>,
    },

    #[error("Dependency not found: {0}")]
    DependencyNotFound(EdgeId),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for DependencyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                task_id,
                depends_on_task_id,
                dependency_type,
            } => DependencyError::DuplicateEdge {
                existing: None,
                task_id,
                depends_on_task_id,
                dependency_type,
            },
            other => DependencyError::Store(other),
        }
    }
}

/// Parses a caller-supplied task ID
pub fn parse_task_id(raw: &str) -> Result<TaskId, DependencyError> {
    Ok(raw.parse()?)
}

/// Parses a caller-supplied dependency edge ID
pub fn parse_edge_id(raw: &str) -> Result<EdgeId, DependencyError> {
    Ok(raw.parse()?)
}

/// Parses a caller-supplied dependency type
pub fn parse_dependency_type(raw: &str) -> Result<DependencyType, DependencyError> {
    Ok(raw.parse()?)
}

fn format_path(path: &[TaskId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// What to do when asked to delete an edge that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingEdgePolicy {
    /// Report `DependencyNotFound`
    #[default]
    Error,
    /// Treat the delete as already done
    Ignore,
}

/// An edge together with the task on its other end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyEntry {
    pub edge: DependencyEdge,
    pub task: TaskSummary,
}

/// Direct dependencies of one task, grouped by meaning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDependencies {
    pub task_id: TaskId,
    /// Tasks that must finish before this one
    pub blocked_by: Vec<DependencyEntry>,
    /// Tasks waiting on this one
    pub blocks: Vec<DependencyEntry>,
    pub relates_to: Vec<DependencyEntry>,
}

/// A task in a chain with its level relative to the root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainTask {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub level: i64,
}

/// Transitive dependency view around a root task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyChain {
    pub root_task: TaskSummary,
    /// Blockers, nearest first
    pub upstream_dependencies: Vec<ChainTask>,
    /// Dependents, nearest first
    pub downstream_dependencies: Vec<ChainTask>,
    /// Root included, ordered by level
    pub all_tasks_in_chain: Vec<ChainTask>,
    pub critical_path: Vec<TaskId>,
    pub max_depth: u64,
    /// `relates_to` edges touching the chain
    pub related_edges: Vec<DependencyEdge>,
}

/// Owner-scoped dependency operations over a store
pub struct DependencyService<S> {
    store: S,
    owner: String,
    missing_edge: MissingEdgePolicy,
}

impl<S: DependencyStore> DependencyService<S> {
    pub fn new(store: S, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
            missing_edge: MissingEdgePolicy::default(),
        }
    }

    pub fn with_missing_edge_policy(mut self, policy: MissingEdgePolicy) -> Self {
        self.missing_edge = policy;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Looks up owned tasks by ID
    fn summaries(&self, ids: &[TaskId]) -> Result<HashMap<TaskId, TaskSummary>, StoreError> {
        Ok(self
            .store
            .tasks_by_ids(ids, &self.owner)?
            .into_iter()
            .map(|task| (task.id, task))
            .collect())
    }

    fn owned_task(&self, id: TaskId) -> Result<Option<TaskSummary>, StoreError> {
        Ok(self.summaries(&[id])?.remove(&id))
    }

    /// Direct dependencies of `task_id`, split into blocked-by, blocks and relates-to
    ///
    /// Peers that are not visible to the owner are left out.
    pub fn get_dependencies(&self, task_id: TaskId) -> Result<TaskDependencies, DependencyError> {
        if self.owned_task(task_id)?.is_none() {
            return Err(DependencyError::TaskNotFound(task_id));
        }

        let mut edges = self.store.edges_for_task(task_id)?;
        edges.retain(|edge| edge.touches(task_id));
        edges.sort_by_key(|edge| edge.id);

        let peers: Vec<TaskId> = edges.iter().map(|edge| edge.peer_of(task_id)).collect();
        let summaries = self.summaries(&peers)?;

        let mut result = TaskDependencies {
            task_id,
            blocked_by: Vec::new(),
            blocks: Vec::new(),
            relates_to: Vec::new(),
        };

        for edge in edges {
            let Some(task) = summaries.get(&edge.peer_of(task_id)).cloned() else {
                continue;
            };
            let bucket = match edge.blocking_link() {
                Some(link) if link.blocked == task_id => &mut result.blocked_by,
                Some(_) => &mut result.blocks,
                None => &mut result.relates_to,
            };
            bucket.push(DependencyEntry { edge, task });
        }

        Ok(result)
    }

    /// Validates and records a new edge
    ///
    /// Checks run in order: self-dependency, both tasks owned, exact
    /// duplicate, blocking cycle. Nothing is written unless all pass.
    pub fn create_dependency(
        &mut self,
        task_id: TaskId,
        depends_on_task_id: TaskId,
        dependency_type: DependencyType,
    ) -> Result<DependencyEdge, DependencyError> {
        if task_id == depends_on_task_id {
            return Err(DependencyError::SelfDependency(task_id));
        }

        let owned = self.summaries(&[task_id, depends_on_task_id])?;
        if !owned.contains_key(&task_id) {
            return Err(DependencyError::TaskNotFound(task_id));
        }
        if !owned.contains_key(&depends_on_task_id) {
            return Err(DependencyError::DependencyTaskNotFound(depends_on_task_id));
        }

        let new = NewDependency {
            task_id,
            depends_on_task_id,
            dependency_type,
        };

        if let Some(existing) = self
            .store
            .edges_for_task(task_id)?
            .into_iter()
            .find(|edge| edge.same_as(&new))
        {
            return Err(DependencyError::DuplicateEdge {
                existing: Some(existing.id),
                task_id,
                depends_on_task_id,
                dependency_type,
            });
        }

        if let Some(path) =
            engine::find_cycle_path(&self.store, task_id, depends_on_task_id, dependency_type)?
        {
            return Err(DependencyError::CircularDependency {
                task_id,
                depends_on_task_id,
                dependency_type,
                path,
            });
        }

        Ok(self.store.insert_edge(new)?)
    }

    /// Removes an edge recorded on one of the owner's tasks
    ///
    /// Returns the removed edge, or `None` when it was already gone and the
    /// policy is [`MissingEdgePolicy::Ignore`].
    pub fn delete_dependency(
        &mut self,
        edge_id: EdgeId,
    ) -> Result<Option<DependencyEdge>, DependencyError> {
        let Some(edge) = self.store.find_edge(edge_id)? else {
            return self.missing(edge_id);
        };
        if self.owned_task(edge.task_id)?.is_none() {
            return self.missing(edge_id);
        }

        if !self.store.delete_edge(edge_id)? {
            return self.missing(edge_id);
        }
        Ok(Some(edge))
    }

    fn missing(&self, edge_id: EdgeId) -> Result<Option<DependencyEdge>, DependencyError> {
        match self.missing_edge {
            MissingEdgePolicy::Error => Err(DependencyError::DependencyNotFound(edge_id)),
            MissingEdgePolicy::Ignore => Ok(None),
        }
    }

    /// Transitive blockers and dependents of `root`, with levels and critical path
    pub fn get_dependency_chain(&self, root: TaskId) -> Result<DependencyChain, DependencyError> {
        let root_task = self
            .owned_task(root)?
            .ok_or(DependencyError::TaskNotFound(root))?;

        let analysis = engine::analyze_chain(&self.store, root)?;
        let ids: Vec<TaskId> = analysis.chain.tasks.iter().copied().collect();
        let summaries = self.summaries(&ids)?;

        let to_chain_task = |(task, level): (TaskId, i64)| {
            summaries.get(&task).map(|summary| ChainTask {
                task: summary.clone(),
                level,
            })
        };

        let upstream_dependencies = analysis
            .levels
            .upstream()
            .into_iter()
            .filter_map(to_chain_task)
            .collect();
        let downstream_dependencies = analysis
            .levels
            .downstream()
            .into_iter()
            .filter_map(to_chain_task)
            .collect();

        let mut all: Vec<(TaskId, i64)> = analysis.levels.iter().collect();
        all.sort_by_key(|(task, level)| (*level, *task));
        let all_tasks_in_chain = all.into_iter().filter_map(to_chain_task).collect();

        Ok(DependencyChain {
            root_task,
            upstream_dependencies,
            downstream_dependencies,
            all_tasks_in_chain,
            critical_path: analysis.critical_path,
            max_depth: analysis.levels.max_depth(),
            related_edges: analysis.chain.related_edges().cloned().collect(),
        })
    }

    /// Checks every edge on the owner's tasks for blocking cycles
    pub fn audit(&self) -> Result<AuditReport, DependencyError> {
        let edges = self.store.edges_for_owner(&self.owner)?;
        Ok(engine::audit(&edges))
    }
}
