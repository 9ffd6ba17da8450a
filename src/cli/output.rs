//! Output formatting for CLI commands

use serde::Serialize;

use crate::domain::DependencyEdge;
use crate::engine::AuditReport;
use crate::service::{ChainTask, DependencyChain, DependencyEntry, TaskDependencies};
pub use crate::storage::OutputFormat;

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Text callers normally render themselves; pretty JSON is the fallback
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints the direct dependencies of a task grouped by meaning
    pub fn dependencies(&self, deps: &TaskDependencies) {
        match self.format {
            OutputFormat::Text => print_lines(&dependency_lines(deps)),
            OutputFormat::Json => self.data(deps),
        }
    }

    /// Prints a dependency chain with levels and critical path
    pub fn chain(&self, chain: &DependencyChain) {
        match self.format {
            OutputFormat::Text => print_lines(&chain_lines(chain)),
            OutputFormat::Json => self.data(chain),
        }
    }

    /// Prints an audit report; a clean report is a success message in text mode
    pub fn audit(&self, report: &AuditReport) {
        match self.format {
            OutputFormat::Text if report.is_clean() => self.success(&format!(
                "No dependency cycles ({} blocking links across {} tasks)",
                report.blocking_links, report.task_count
            )),
            OutputFormat::Text => print_lines(&audit_lines(report)),
            OutputFormat::Json => self.data(report),
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// One-line description of an edge, e.g. `3 blocked_by 2`
pub fn describe_edge(edge: &DependencyEdge) -> String {
    format!(
        "{} {} {}",
        edge.task_id, edge.dependency_type, edge.depends_on_task_id
    )
}

/// Text rendering of direct dependencies, one section per non-empty group
pub fn dependency_lines(deps: &TaskDependencies) -> Vec<String> {
    let sections: [(&str, &[DependencyEntry]); 3] = [
        ("Blocked by", deps.blocked_by.as_slice()),
        ("Blocks", deps.blocks.as_slice()),
        ("Related to", deps.relates_to.as_slice()),
    ];

    let mut lines = Vec::new();
    for (heading, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(format!("{}:", heading));
        for entry in entries {
            lines.push(format!(
                "  [{}] {} {} ({})",
                entry.edge.id, entry.task.id, entry.task.title, entry.task.status
            ));
        }
    }

    if lines.is_empty() {
        lines.push(format!("Task {} has no dependencies", deps.task_id));
    }
    lines
}

/// Text rendering of a chain: header, upstream and downstream levels, related edges, critical path
pub fn chain_lines(chain: &DependencyChain) -> Vec<String> {
    let mut lines = vec![format!(
        "Chain for task {}: {} ({} tasks, max depth {})",
        chain.root_task.id,
        chain.root_task.title,
        chain.all_tasks_in_chain.len(),
        chain.max_depth
    )];

    level_section(&mut lines, "Upstream", &chain.upstream_dependencies);
    level_section(&mut lines, "Downstream", &chain.downstream_dependencies);

    if !chain.related_edges.is_empty() {
        lines.push(String::new());
        lines.push("Related:".to_string());
        for edge in &chain.related_edges {
            lines.push(format!("  [{}] {}", edge.id, describe_edge(edge)));
        }
    }

    let path: Vec<String> = chain.critical_path.iter().map(|id| id.to_string()).collect();
    lines.push(String::new());
    lines.push(format!("Critical path: {}", path.join(" -> ")));
    lines
}

fn level_section(lines: &mut Vec<String>, heading: &str, tasks: &[ChainTask]) {
    if tasks.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{}:", heading));
    for entry in tasks {
        lines.push(format!(
            "  {:>+4}  {:<6} {:<12} {}",
            entry.level,
            entry.task.id.to_string(),
            entry.task.status.as_str(),
            entry.task.title
        ));
    }
}

/// Text rendering of the cycles in an audit report
pub fn audit_lines(report: &AuditReport) -> Vec<String> {
    let mut lines = vec!["Dependency cycles found:".to_string()];
    for cycle in &report.cycles {
        let tasks: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
        lines.push(format!("  cycle\t{}", tasks.join(", ")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, TaskSummary};

    fn task(id: i64, title: &str) -> TaskSummary {
        TaskSummary::new(TaskId::new(id).unwrap(), title)
    }

    fn chain_task(id: i64, title: &str, level: i64) -> ChainTask {
        ChainTask {
            task: task(id, title),
            level,
        }
    }

    #[test]
    fn chain_lines_show_levels_and_path() {
        let chain = DependencyChain {
            root_task: task(2, "Build"),
            upstream_dependencies: vec![chain_task(1, "Design", -1)],
            downstream_dependencies: vec![chain_task(3, "Ship", 1)],
            all_tasks_in_chain: vec![
                chain_task(1, "Design", -1),
                chain_task(2, "Build", 0),
                chain_task(3, "Ship", 1),
            ],
            critical_path: [1, 2, 3].map(|id| TaskId::new(id).unwrap()).to_vec(),
            max_depth: 1,
            related_edges: Vec::new(),
        };

        let lines = chain_lines(&chain);
        assert_eq!(lines[0], "Chain for task 2: Build (3 tasks, max depth 1)");
        assert!(lines.contains(&"Upstream:".to_string()));
        assert!(lines.iter().any(|l| l.contains("  -1  1") && l.ends_with("Design")));
        assert!(lines.iter().any(|l| l.contains("  +1  3") && l.ends_with("Ship")));
        assert!(!lines.contains(&"Related:".to_string()));
        assert_eq!(lines.last().unwrap(), "Critical path: 1 -> 2 -> 3");
    }

    #[test]
    fn dependency_lines_group_by_meaning() {
        let empty = TaskDependencies {
            task_id: TaskId::new(9).unwrap(),
            blocked_by: Vec::new(),
            blocks: Vec::new(),
            relates_to: Vec::new(),
        };
        assert_eq!(dependency_lines(&empty), vec!["Task 9 has no dependencies"]);
    }

    #[test]
    fn audit_lines_list_each_cycle() {
        let report = AuditReport {
            cycles: vec![[4, 5].map(|id| TaskId::new(id).unwrap()).to_vec()],
            ..AuditReport::default()
        };

        assert_eq!(
            audit_lines(&report),
            vec!["Dependency cycles found:", "  cycle\t4, 5"]
        );
    }

    #[test]
    fn format_flags() {
        assert!(Output::new(OutputFormat::Json, false).is_json());
        assert!(!Output::new(OutputFormat::Text, true).is_json());
    }
}
