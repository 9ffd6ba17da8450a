//! Dependency edges between tasks
//!
//! An edge is stored on one task (`task_id`) and points at another
//! (`depends_on_task_id`). The two blocking types describe the same kind of
//! relationship from opposite ends, so every consumer goes through
//! [`DependencyEdge::blocking_link`] instead of reading the raw columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::{EdgeId, TaskId};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid dependency type '{0}': expected blocks, blocked_by or relates_to")]
pub struct InvalidDependencyType(pub String);

/// Type of dependency between two tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// `task_id` must finish before `depends_on_task_id` can start
    Blocks,
    /// `depends_on_task_id` must finish before `task_id` can start
    #[default]
    BlockedBy,
    /// Informational link, never affects ordering
    RelatesTo,
}

impl DependencyType {
    /// Returns true if this type orders the two tasks
    pub fn is_blocking(&self) -> bool {
        !matches!(self, DependencyType::RelatesTo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Blocks => "blocks",
            DependencyType::BlockedBy => "blocked_by",
            DependencyType::RelatesTo => "relates_to",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = InvalidDependencyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "blocks" => Ok(DependencyType::Blocks),
            "blocked_by" => Ok(DependencyType::BlockedBy),
            "relates_to" => Ok(DependencyType::RelatesTo),
            other => Err(InvalidDependencyType(other.to_string())),
        }
    }
}

/// Normalized blocking relationship: `blocker` must finish before `blocked`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockingLink {
    pub blocker: TaskId,
    pub blocked: TaskId,
}

impl BlockingLink {
    /// Builds the link a prospective edge would introduce
    pub fn of(
        task_id: TaskId,
        depends_on_task_id: TaskId,
        dependency_type: DependencyType,
    ) -> Option<Self> {
        match dependency_type {
            DependencyType::Blocks => Some(Self {
                blocker: task_id,
                blocked: depends_on_task_id,
            }),
            DependencyType::BlockedBy => Some(Self {
                blocker: depends_on_task_id,
                blocked: task_id,
            }),
            DependencyType::RelatesTo => None,
        }
    }
}

/// A persisted dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub id: EdgeId,
    /// The task the edge is recorded on
    pub task_id: TaskId,
    /// The task on the other end
    pub depends_on_task_id: TaskId,
    pub dependency_type: DependencyType,
    pub created_at: DateTime<Utc>,
}

impl DependencyEdge {
    /// Returns the ordering this edge expresses, or `None` for `relates_to`
    pub fn blocking_link(&self) -> Option<BlockingLink> {
        BlockingLink::of(self.task_id, self.depends_on_task_id, self.dependency_type)
    }

    /// Returns true if `task` is either endpoint
    pub fn touches(&self, task: TaskId) -> bool {
        self.task_id == task || self.depends_on_task_id == task
    }

    /// Returns the endpoint that is not `task`
    pub fn peer_of(&self, task: TaskId) -> TaskId {
        if self.task_id == task {
            self.depends_on_task_id
        } else {
            self.task_id
        }
    }

    /// Returns true if the edge has the same endpoints and type as `new`
    pub fn same_as(&self, new: &NewDependency) -> bool {
        self.task_id == new.task_id
            && self.depends_on_task_id == new.depends_on_task_id
            && self.dependency_type == new.dependency_type
    }
}

/// An edge that has passed validation and is ready to be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewDependency {
    pub task_id: TaskId,
    pub depends_on_task_id: TaskId,
    pub dependency_type: DependencyType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> TaskId {
        TaskId::new(n).unwrap()
    }

    fn edge(task: i64, on: i64, dependency_type: DependencyType) -> DependencyEdge {
        DependencyEdge {
            id: EdgeId::new(1).unwrap(),
            task_id: id(task),
            depends_on_task_id: id(on),
            dependency_type,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn blocks_and_blocked_by_mirror_each_other() {
        // B blocks A, stored on B
        let forward = edge(2, 1, DependencyType::Blocks);
        // A blocked_by B, stored on A
        let mirrored = edge(1, 2, DependencyType::BlockedBy);

        assert_eq!(forward.blocking_link(), mirrored.blocking_link());
        assert_eq!(
            forward.blocking_link(),
            Some(BlockingLink {
                blocker: id(2),
                blocked: id(1)
            })
        );
    }

    #[test]
    fn relates_to_has_no_link() {
        assert_eq!(edge(1, 2, DependencyType::RelatesTo).blocking_link(), None);
        assert!(!DependencyType::RelatesTo.is_blocking());
    }

    #[test]
    fn parse_dependency_type() {
        assert_eq!(
            "blocked_by".parse::<DependencyType>().unwrap(),
            DependencyType::BlockedBy
        );
        assert_eq!(
            "depends".parse::<DependencyType>(),
            Err(InvalidDependencyType("depends".to_string()))
        );
    }

    #[test]
    fn peer_of_returns_other_endpoint() {
        let e = edge(3, 9, DependencyType::RelatesTo);
        assert_eq!(e.peer_of(id(3)), id(9));
        assert_eq!(e.peer_of(id(9)), id(3));
        assert!(e.touches(id(9)));
        assert!(!e.touches(id(4)));
    }

    #[test]
    fn type_serializes_snake_case() {
        let json = serde_json::to_string(&DependencyType::BlockedBy).unwrap();
        assert_eq!(json, "\"blocked_by\"");
    }
}
