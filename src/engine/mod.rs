//! # Dependency Engine
//!
//! Graph questions over the blocking edges between tasks. The engine never
//! writes; it reads edges through an [`EdgeSource`] and works on a private
//! in-memory copy for the duration of one call.
//!
//! ## Pipeline
//!
//! | Step | Function | Answers |
//! |------|----------|---------|
//! | Guard | [`find_cycle_path`] | Would this edge close a blocking cycle? |
//! | Collect | [`collect_chain`] | Which tasks are upstream or downstream of the root? |
//! | Level | [`assign_levels`] | How far is each of them from the root? |
//! | Critical path | [`find_critical_path`] | What is the longest blocking chain? |
//! | Audit | [`audit`] | Does the stored data already contain cycles? |
//!
//! `blocks` and `blocked_by` edges are normalized to a single
//! [`BlockingLink`](crate::domain::BlockingLink) before any of these steps.
//! `relates_to` edges are carried along but never affect ordering.

mod audit;
mod chain;
mod critical_path;
mod cycle;
mod levels;

pub use audit::{audit, AuditReport};
pub use chain::{collect_chain, Chain};
pub use critical_path::find_critical_path;
pub use cycle::{find_cycle_path, would_create_cycle};
pub use levels::{assign_levels, Levels};

use crate::domain::{DependencyEdge, TaskId};
use crate::storage::{EdgeSource, StoreError};

/// Everything a chain query computes before task details are attached
#[derive(Debug, Clone)]
pub struct ChainAnalysis {
    pub chain: Chain,
    pub levels: Levels,
    pub critical_path: Vec<TaskId>,
}

/// Collects the chain around `root` and runs leveling and critical path on it
pub fn analyze_chain<S: EdgeSource + ?Sized>(
    source: &S,
    root: TaskId,
) -> Result<ChainAnalysis, StoreError> {
    let chain = collect_chain(source, root)?;
    let levels = assign_levels(&chain);
    let critical_path = find_critical_path(&chain);

    Ok(ChainAnalysis {
        chain,
        levels,
        critical_path,
    })
}

/// Tasks that `task` blocks, according to the given edges
fn downstream_of(edges: &[DependencyEdge], task: TaskId) -> impl Iterator<Item = TaskId> + '_ {
    edges
        .iter()
        .filter_map(DependencyEdge::blocking_link)
        .filter(move |link| link.blocker == task && link.blocked != task)
        .map(|link| link.blocked)
}

/// Tasks that block `task`, according to the given edges
fn upstream_of(edges: &[DependencyEdge], task: TaskId) -> impl Iterator<Item = TaskId> + '_ {
    edges
        .iter()
        .filter_map(DependencyEdge::blocking_link)
        .filter(move |link| link.blocked == task && link.blocker != task)
        .map(|link| link.blocker)
}
