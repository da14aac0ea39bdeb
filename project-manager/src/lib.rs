//! # Project Manager
//!
//! Registry of independently indexed projects. Each registered project owns
//! a context builder, per-project counters and an optional file watcher
//! whose events are applied as incremental updates.
//!
//! ## Lifecycle
//!
//! ```text
//! register ──► ACTIVE ──pause──► PAUSED ──resume──► ACTIVE
//!                │
//!                └──scan──► SCANNING ──► ACTIVE (success)
//!                                   └──► ERROR  ──resume──► ACTIVE
//! ```
//!
//! Any status may move to ERROR through `mark_project_error`; watcher
//! errors take that path instead of surfacing to callers.

pub mod config;
pub mod error;
pub mod manager;
pub mod project;
pub mod watch;

pub use config::ManagerConfig;
pub use error::{ProjectError, Result};
pub use manager::ProjectManager;
pub use project::{
    GlobalStats, ProjectEvent, ProjectRecord, ProjectScanResult, ProjectStats, ProjectStatus,
};
pub use watch::{NotifyWatcherFactory, WatchHandle, WatchSubscription, WatcherFactory};
