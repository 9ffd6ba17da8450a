//! Configuration handling for taskchain
//!
//! Configuration is stored in `.taskchain/config.toml` (project) and
//! `~/.config/taskchain/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::MissingEdgePolicy;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".taskchain";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Dependency command settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DependencyConfig {
    /// Behavior of `dep rm` for an edge that no longer exists
    pub missing_edge: MissingEdgePolicy,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Owner all tasks in this project are scoped to
    pub owner: Option<String>,

    pub dependencies: DependencyConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Owner used when the project does not set one
    pub owner: Option<String>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "taskchain", "taskchain")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Default output format from the global config, falling back to text
    pub fn default_format() -> OutputFormat {
        Self::load_global()
            .map(|global| global.default_format)
            .unwrap_or_default()
    }

    /// Finds the project root by looking for a `.taskchain/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolves the owner: project, then global, then `$TASKCHAIN_OWNER`, then `$USER`
    ///
    /// Blank values are skipped, so `owner = ""` falls through to the next source.
    pub fn effective_owner(&self) -> String {
        let non_blank = |owner: &String| !owner.trim().is_empty();

        self.project
            .owner
            .clone()
            .filter(non_blank)
            .or_else(|| self.global.owner.clone().filter(non_blank))
            .or_else(|| std::env::var("TASKCHAIN_OWNER").ok().filter(non_blank))
            .or_else(|| std::env::var("USER").ok().filter(non_blank))
            .unwrap_or_else(|| "anonymous".to_string())
    }

    pub fn missing_edge_policy(&self) -> MissingEdgePolicy {
        self.project.dependencies.missing_edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(project: ProjectConfig, global: GlobalConfig) -> Config {
        Config {
            project,
            global,
            project_root: None,
        }
    }

    #[test]
    fn default_config() {
        let config = config(ProjectConfig::default(), GlobalConfig::default());

        assert_eq!(config.missing_edge_policy(), MissingEdgePolicy::Error);
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
owner = "alice"

[dependencies]
missing_edge = "ignore"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.owner.as_deref(), Some("alice"));
        assert_eq!(config.dependencies.missing_edge, MissingEdgePolicy::Ignore);
    }

    #[test]
    fn reject_unknown_policy() {
        let toml = r#"
[dependencies]
missing_edge = "shrug"
"#;

        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
owner = "bob"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
        assert_eq!(config.owner.as_deref(), Some("bob"));
    }

    #[test]
    fn project_owner_wins_over_global() {
        let project = ProjectConfig {
            owner: Some("alice".to_string()),
            ..ProjectConfig::default()
        };
        let global = GlobalConfig {
            owner: Some("bob".to_string()),
            ..GlobalConfig::default()
        };

        assert_eq!(config(project, global.clone()).effective_owner(), "alice");
        assert_eq!(
            config(ProjectConfig::default(), global).effective_owner(),
            "bob"
        );
    }

    #[test]
    fn blank_project_owner_falls_through_to_global() {
        let project = ProjectConfig {
            owner: Some("   ".to_string()),
            ..ProjectConfig::default()
        };
        let global = GlobalConfig {
            owner: Some("bob".to_string()),
            ..GlobalConfig::default()
        };

        assert_eq!(config(project, global).effective_owner(), "bob");
    }

    #[test]
    fn blank_global_owner_is_skipped() {
        let project = ProjectConfig {
            owner: Some(String::new()),
            ..ProjectConfig::default()
        };
        let global = GlobalConfig {
            owner: Some(String::new()),
            ..GlobalConfig::default()
        };

        let owner = config(project, global).effective_owner();
        assert!(!owner.trim().is_empty());
    }
}
