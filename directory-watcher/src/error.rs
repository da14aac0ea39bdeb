//! Watcher errors.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatcherError>;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("watch root not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("watch root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("already watching {}", .0.display())]
    AlreadyWatching(PathBuf),

    /// The OS watch backend failed.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The debounce task ended by panicking instead of being stopped.
    #[error("event forwarder failed: {0}")]
    Forwarder(String),
}
