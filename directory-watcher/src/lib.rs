//! # Directory Watcher
//!
//! This crate watches a single project root and turns raw file system
//! notifications into the change events consumed by the context index.
//!
//! ## Features
//!
//! - **Real-time Watching**: Recursive notify watch on the project root
//! - **Debouncing**: Rapid bursts are coalesced to the latest event per path
//! - **Exclusions**: VCS and dependency folders never produce events
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchConfig ──► DirectoryWatcher ──► WatchMessage              │
//! │       │                │                   │                    │
//! │       ▼                ▼                   ▼                    │
//! │  Exclusions       EventBatch        FileChangeEvent             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod watcher;

pub use config::WatchConfig;
pub use error::{Result, WatcherError};
pub use event::{EventBatch, FileChangeEvent, FileChangeKind};
pub use watcher::{DirectoryWatcher, WatchMessage};
