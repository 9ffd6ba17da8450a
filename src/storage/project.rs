//! Project management
//!
//! Handles project initialization and provides access to the task database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::PROJECT_DIR;
use super::{Config, SqliteStore};
use crate::service::DependencyService;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskchain project. Run 'taskchain init' first.")]
    NotInProject,
}

/// A taskchain project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Safe to run on an existing project: the config file is left alone and
    /// the database schema is only created when missing.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(&project_dir).with_context(|| {
            format!(
                "Failed to create {} directory: {}",
                PROJECT_DIR,
                project_dir.display()
            )
        })?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# taskchain configuration

# Owner all tasks are scoped to (defaults to $TASKCHAIN_OWNER, then $USER)
# owner = "me"

[dependencies]
# What 'dep rm' does with an edge that is already gone: "error" or "ignore"
missing_edge = "error"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = project_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# SQLite write-ahead log files
tasks.db-wal
tasks.db-shm
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let project = Self::open(root)?;
        project.open_store()?;
        Ok(project)
    }

    /// Returns the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `.taskchain` directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Returns the path of the task database
    pub fn db_path(&self) -> PathBuf {
        self.project_dir().join("tasks.db")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Owner every query in this project is scoped to
    pub fn owner(&self) -> String {
        self.config.effective_owner()
    }

    /// Opens the task database
    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.db_path())
    }

    /// Builds a dependency service over the task database for this project's owner
    pub fn dependency_service(&self) -> Result<DependencyService<SqliteStore>> {
        Ok(DependencyService::new(self.open_store()?, self.owner())
            .with_missing_edge_policy(self.config.missing_edge_policy()))
    }
}
