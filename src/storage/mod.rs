//! # Storage Layer
//!
//! Persistence for tasks and dependency edges, plus project configuration.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks and dependencies | SQLite | `.taskchain/tasks.db` |
//! | Config | TOML | `.taskchain/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - Each edge insert or delete is a single SQLite statement
//! - Exact duplicate edges are refused by a `UNIQUE` constraint
//! - The cycle check and the insert are separate steps, so two writers
//!   racing on the same tasks can still close a loop; `taskchain dep check`
//!   finds such loops after the fact
//!
//! ## Key Types
//!
//! - [`EdgeSource`] / [`DependencyStore`] - What the engine and service need from a store
//! - [`SqliteStore`] - Persistent store
//! - [`MemoryStore`] - In-process store for tests and embedding
//! - [`Project`] - Entry point for a taskchain project directory
//! - [`Config`] - Project and global configuration

mod adapter;
mod config;
mod memory;
mod project;
mod sqlite;

pub use adapter::{DependencyStore, EdgeSource, StoreError};
pub use config::{Config, ConfigError, DependencyConfig, GlobalConfig, OutputFormat, ProjectConfig};
pub use memory::MemoryStore;
pub use project::{Project, ProjectError};
pub use sqlite::SqliteStore;
