//! Dependency CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::{describe_edge, Output};
use crate::service::{parse_dependency_type, parse_edge_id, parse_task_id};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add a dependency between two tasks
    ///
    /// Examples:
    ///   taskchain dep add 3 2                  # 3 is blocked by 2
    ///   taskchain dep add 2 3 --type blocks    # same link, recorded on 2
    ///   taskchain dep add 4 1 --type relates_to
    Add {
        /// Task the edge is recorded on
        task: String,

        /// Task on the other end
        depends_on: String,

        /// Edge type (blocks, blocked_by, relates_to)
        #[arg(long = "type", short = 't', default_value = "blocked_by")]
        dependency_type: String,
    },

    /// List the direct dependencies of a task
    List {
        /// Task ID
        task: String,
    },

    /// Remove a dependency by edge ID
    Rm {
        /// Edge ID (shown by 'dep list')
        edge: String,
    },

    /// Show every transitive blocker and dependent of a task
    Chain {
        /// Root task ID
        task: String,
    },

    /// Check all dependencies for blocking cycles
    Check,
}

pub fn run(cmd: DepCommands, output: &Output) -> Result<()> {
    match cmd {
        DepCommands::Add {
            task,
            depends_on,
            dependency_type,
        } => add_dependency(output, &task, &depends_on, &dependency_type),
        DepCommands::List { task } => list_dependencies(output, &task),
        DepCommands::Rm { edge } => remove_dependency(output, &edge),
        DepCommands::Chain { task } => show_chain(output, &task),
        DepCommands::Check => check(output),
    }
}

fn add_dependency(
    output: &Output,
    task_str: &str,
    depends_on_str: &str,
    type_str: &str,
) -> Result<()> {
    let task_id = parse_task_id(task_str)?;
    let depends_on = parse_task_id(depends_on_str)?;
    let dependency_type = parse_dependency_type(type_str)?;

    let project = Project::open_current()?;
    let mut service = project.dependency_service()?;

    output.verbose_ctx(
        "dep",
        &format!(
            "Adding {} {} {} for owner '{}'",
            task_id,
            dependency_type,
            depends_on,
            service.owner()
        ),
    );

    let edge = service.create_dependency(task_id, depends_on, dependency_type)?;

    if output.is_json() {
        output.data(&edge);
    } else {
        output.success(&format!("Added dependency {}: {}", edge.id, describe_edge(&edge)));
    }

    Ok(())
}

fn list_dependencies(output: &Output, task_str: &str) -> Result<()> {
    let task_id = parse_task_id(task_str)?;

    let project = Project::open_current()?;
    let service = project.dependency_service()?;
    let deps = service.get_dependencies(task_id)?;

    output.dependencies(&deps);

    Ok(())
}

fn remove_dependency(output: &Output, edge_str: &str) -> Result<()> {
    let edge_id = parse_edge_id(edge_str)?;

    let project = Project::open_current()?;
    let mut service = project.dependency_service()?;

    match service.delete_dependency(edge_id)? {
        Some(edge) => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "removed": true,
                    "edge": edge,
                }));
            } else {
                output.success(&format!("Removed dependency {}: {}", edge.id, describe_edge(&edge)));
            }
        }
        None => {
            output.verbose_ctx("dep", &format!("Edge {} already gone, ignoring", edge_id));
            if output.is_json() {
                output.data(&serde_json::json!({
                    "removed": false,
                    "edge_id": edge_id,
                }));
            } else {
                output.success(&format!("Dependency {} not found, nothing to remove", edge_id));
            }
        }
    }

    Ok(())
}

fn show_chain(output: &Output, task_str: &str) -> Result<()> {
    let root = parse_task_id(task_str)?;

    let project = Project::open_current()?;
    let service = project.dependency_service()?;
    let chain = service.get_dependency_chain(root)?;

    output.verbose_ctx(
        "chain",
        &format!(
            "{} tasks, {} upstream, {} downstream",
            chain.all_tasks_in_chain.len(),
            chain.upstream_dependencies.len(),
            chain.downstream_dependencies.len()
        ),
    );

    output.chain(&chain);

    Ok(())
}

fn check(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let service = project.dependency_service()?;
    let report = service.audit()?;

    output.verbose_ctx(
        "check",
        &format!(
            "{} tasks, {} blocking links, {} related edges",
            report.task_count, report.blocking_links, report.related_edges
        ),
    );

    output.audit(&report);

    if !report.is_clean() {
        anyhow::bail!("{} dependency cycle(s) found", report.cycles.len());
    }

    Ok(())
}
