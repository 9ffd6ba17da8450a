//! taskchain - Dependency tracking between tasks
//!
//! Tasks are linked by `blocks`, `blocked_by` and `relates_to` edges. The
//! engine refuses edges that would close a blocking cycle and answers chain
//! queries: every transitive blocker and dependent of a task, its level
//! relative to that task, and the longest blocking path through the chain.

pub mod cli;
pub mod domain;
pub mod engine;
pub mod service;
pub mod storage;

pub use domain::{DependencyEdge, DependencyType, EdgeId, TaskId, TaskSummary};
pub use service::{DependencyChain, DependencyError, DependencyService, MissingEdgePolicy};
