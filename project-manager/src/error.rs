//! Error types for the project manager.

use std::path::PathBuf;

use sker_context_index::ContextError;
use thiserror::Error;

use crate::project::ProjectStatus;

/// Result type alias for project manager operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Errors that can occur while managing projects.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Registration target is absent or not a directory.
    #[error("project directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Root path is already registered.
    #[error("project already exists: {}", .0.display())]
    DuplicateProject(PathBuf),

    /// Registered project count reached the configured maximum.
    #[error("max projects reached ({0})")]
    ProjectLimitExceeded(usize),

    /// No project config file at the root.
    #[error("project config missing: {}", .0.display())]
    ConfigMissing(PathBuf),

    /// Project config file could not be parsed.
    #[error("invalid project config {}: {message}", path.display())]
    ConfigInvalid { path: PathBuf, message: String },

    /// Unknown project id.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Operation not allowed in the project's current status.
    #[error("cannot {action} project {id} while {status}")]
    InvalidTransition {
        id: String,
        status: ProjectStatus,
        action: &'static str,
    },

    /// The file watcher could not be started or stopped.
    #[error("watch failure for project {id}: {message}")]
    WatchFailure { id: String, message: String },

    /// The manager has been shut down.
    #[error("project manager has been shut down")]
    ShutDown,

    /// Context index error.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Manager config file could not be parsed.
    #[error("invalid manager config: {0}")]
    ConfigFile(#[from] toml::de::Error),
}
