// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Duplicate task name: {0}")]
    DuplicateName(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// A leaf task's underlying operation failed (process exit, IO, ...).
    #[error("Task '{task}' failed: {reason}")]
    TaskExecution { task: String, reason: String },

    /// Invalid task graph: empty composite or a task containing itself.
    #[error("Composition error: {0}")]
    Composition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitepipeError {
    /// Name of the leaf task that failed, if this is a task execution error.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            SitepipeError::TaskExecution { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
