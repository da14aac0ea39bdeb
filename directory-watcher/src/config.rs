//! Configuration for watching a project root.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a watched project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Path to the project root.
    pub root: PathBuf,

    /// Window over which bursts of events are coalesced.
    pub debounce: Duration,

    /// Directory names whose contents never produce events.
    pub excluded_dirs: Vec<String>,

    /// Capacity of the outgoing event channel.
    pub channel_capacity: usize,

    /// Project id stamped onto every emitted event.
    pub project_id: Option<String>,
}

impl WatchConfig {
    /// Create a new watch config for a root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            debounce: Duration::from_millis(100),
            excluded_dirs: Self::default_excludes(),
            channel_capacity: 1000,
            project_id: None,
        }
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Exclude another directory name.
    pub fn exclude(mut self, dir_name: impl Into<String>) -> Self {
        self.excluded_dirs.push(dir_name.into());
        self
    }

    /// Set the outgoing channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Stamp emitted events with a project id.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Get default excluded directory names.
    fn default_excludes() -> Vec<String> {
        [
            // Version control
            ".git",
            ".svn",
            ".hg",
            // Dependencies
            "node_modules",
            "target",
            ".venv",
            // Build artifacts
            "dist",
            "__pycache__",
            // IDE/Editor
            ".idea",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    /// Check if a path lies inside an excluded directory under the root.
    pub fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        relative.components().any(|component| match component {
            Component::Normal(name) => self
                .excluded_dirs
                .iter()
                .any(|excluded| name == excluded.as_str()),
            _ => false,
        })
    }
}
