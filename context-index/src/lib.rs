//! # Context Index
//!
//! Incremental index of a project directory: a tree of file and folder
//! nodes plus a bidirectional import graph between files.
//!
//! - **Context Tree**: arena of nodes keyed by absolute path
//! - **Dependency Graph**: `imports` / `imported_by` edges with transitive
//!   affected-file queries
//! - **Context Builder**: filtered directory scan, project-root detection,
//!   incremental updates from change events
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Context Index                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ScanOptions ──► ContextBuilder ◄── FileChangeEvent             │
//! │  IgnoreMatcher        │                                         │
//! │               ┌───────┴────────┐                                │
//! │               ▼                ▼                                │
//! │          ContextTree    DependencyGraph ◄── DependencyExtractor │
//! │               │                                                 │
//! │               ▼                                                 │
//! │          ContextNode ──► ProjectInfo (sker.json)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod dependency;
pub mod error;
pub mod extractor;
pub mod node;
pub mod options;
pub mod project_config;
pub mod tree;

pub use builder::{BuildStats, BuilderConfig, ContextBuilder, FileChangeResult};
pub use dependency::{DependencyGraph, DependencyRecord};
pub use error::{ContextError, Result};
pub use extractor::{DependencyExtractor, ImportPatternExtractor, SharedExtractor};
pub use node::{ContextNode, FileData, FileMetadata, FolderData, NodeData, NodeKind};
pub use options::{IgnoreMatcher, ScanOptions};
pub use project_config::{ConfigValue, PROJECT_CONFIG_FILE, ProjectInfo, load_project_config};
pub use tree::{ContextTree, TreeStats};

// Change events come from the watcher crate.
pub use sker_directory_watcher::{FileChangeEvent, FileChangeKind};
