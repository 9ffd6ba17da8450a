//! Domain models for taskchain
//!
//! Task and dependency types without any I/O concerns.

mod dependency;
mod id;
mod task;

pub use dependency::{
    BlockingLink, DependencyEdge, DependencyType, InvalidDependencyType, NewDependency,
};
pub use id::{EdgeId, IdError, TaskId};
pub use task::{TaskPriority, TaskStatus, TaskSummary};
