//! Error types for the context index.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for context index operations.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors that can occur while building or updating a context index.
#[derive(Error, Debug)]
pub enum ContextError {
    /// Scan root does not exist.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// No node is indexed at the path.
    #[error("node not found: {}", .0.display())]
    NodeNotFound(PathBuf),

    /// Operation needs a folder node but got a file node.
    #[error("not a folder node: {}", .0.display())]
    NotAFolder(PathBuf),

    /// Operation needs a file node but got a folder node.
    #[error("not a file node: {}", .0.display())]
    NotAFile(PathBuf),

    /// Operation would break the tree shape.
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Path lies outside the indexed root.
    #[error("path outside indexed root: {}", .0.display())]
    OutsideRoot(PathBuf),

    /// Incremental update received before any build.
    #[error("context has not been built yet")]
    NotBuilt,

    /// Project config could not be parsed.
    #[error("invalid project config {}: {message}", path.display())]
    ConfigInvalid { path: PathBuf, message: String },

    /// Ignore rules could not be compiled.
    #[error("invalid ignore rules: {0}")]
    IgnoreRules(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
