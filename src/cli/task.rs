//! Task CLI commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{TaskPriority, TaskStatus, TaskSummary};
use crate::service::{parse_task_id, DependencyEntry};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   taskchain task add "Design schema"
    ///   taskchain task add "Ship release" --priority high --due 2026-03-01
    Add {
        /// Task title
        title: String,

        /// Priority (low, medium, high, urgent)
        #[arg(long, default_value = "medium")]
        priority: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks
    List,

    /// Show task details and direct dependencies
    Show {
        /// Task ID
        id: String,
    },

    /// Mark task as in progress
    Start {
        /// Task ID
        id: String,
    },

    /// Mark task as done
    Done {
        /// Task ID
        id: String,
    },

    /// Move task back to todo
    Reopen {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            priority,
            due,
        } => add_task(output, &title, &priority, due.as_deref()),
        TaskCommands::List => list_tasks(output),
        TaskCommands::Show { id } => show_task(output, &id),
        TaskCommands::Start { id } => set_status(output, &id, TaskStatus::InProgress),
        TaskCommands::Done { id } => set_status(output, &id, TaskStatus::Done),
        TaskCommands::Reopen { id } => set_status(output, &id, TaskStatus::Todo),
    }
}

fn add_task(output: &Output, title: &str, priority: &str, due: Option<&str>) -> Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("Task title cannot be empty");
    }

    let priority: TaskPriority = priority.parse().map_err(anyhow::Error::msg)?;
    let due_date = due
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .with_context(|| format!("Invalid due date '{}', expected YYYY-MM-DD", d))
        })
        .transpose()?;

    let project = Project::open_current()?;
    let owner = project.owner();
    let store = project.open_store()?;

    output.verbose_ctx("task", &format!("Creating task for owner '{}'", owner));
    let task = store.create_task(&owner, title, priority, due_date)?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Created task {}: {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let owner = project.owner();
    let tasks = project.open_store()?.list_tasks(&owner)?;

    output.verbose_ctx("task", &format!("{} tasks for owner '{}'", tasks.len(), owner));

    if output.is_json() {
        output.data(&tasks);
    } else if tasks.is_empty() {
        println!("No tasks");
    } else {
        println!("{:<6} {:<12} {:<8} TITLE", "ID", "STATUS", "PRIORITY");
        println!("{}", "-".repeat(60));

        for task in &tasks {
            println!(
                "{:<6} {:<12} {:<8} {}",
                task.id.to_string(),
                task.status.as_str(),
                task.priority.as_str(),
                task.title
            );
        }
    }

    Ok(())
}

fn show_task(output: &Output, id_str: &str) -> Result<()> {
    let id = parse_task_id(id_str)?;

    let project = Project::open_current()?;
    let service = project.dependency_service()?;

    let task = service
        .store()
        .get_task(service.owner(), id)?
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;
    let deps = service.get_dependencies(id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "dependencies": deps,
        }));
        return Ok(());
    }

    print_summary(&task);

    let sections: [(&str, &[DependencyEntry]); 3] = [
        ("Blocked by", deps.blocked_by.as_slice()),
        ("Blocks", deps.blocks.as_slice()),
        ("Related to", deps.relates_to.as_slice()),
    ];
    for (heading, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        println!("\n{}:", heading);
        for entry in entries {
            println!(
                "  {} {} ({}) [edge {}]",
                entry.task.id, entry.task.title, entry.task.status, entry.edge.id
            );
        }
    }

    if !deps.blocked_by.is_empty() {
        let open = deps
            .blocked_by
            .iter()
            .filter(|entry| !entry.task.status.is_complete())
            .count();
        println!();
        if open == 0 {
            println!("Status: READY (all blockers complete)");
        } else {
            println!("Status: BLOCKED ({} open blockers)", open);
        }
    }

    Ok(())
}

fn print_summary(task: &TaskSummary) {
    println!("Task: {}", task.id);
    println!("Title: {}", task.title);
    println!("Status: {}", task.status);
    println!("Priority: {}", task.priority);
    if let Some(due) = task.due_date {
        println!("Due: {}", due.format("%Y-%m-%d"));
    }
}

fn set_status(output: &Output, id_str: &str, status: TaskStatus) -> Result<()> {
    let id = parse_task_id(id_str)?;

    let project = Project::open_current()?;
    let owner = project.owner();
    let store = project.open_store()?;

    if !store.set_status(&owner, id, status)? {
        anyhow::bail!("Task not found: {}", id);
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "status": status,
        }));
    } else {
        let verb = match status {
            TaskStatus::Todo => "Reopened",
            TaskStatus::InProgress => "Started",
            TaskStatus::Done => "Completed",
        };
        output.success(&format!("{} task: {}", verb, id));
    }

    Ok(())
}
