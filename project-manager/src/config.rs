//! Manager configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sker_context_index::{BuilderConfig, ScanOptions};

use crate::error::Result;

/// Configuration for a [`ProjectManager`](crate::ProjectManager).
///
/// Every field has a default, so a TOML file only needs the values it
/// overrides:
///
/// ```toml
/// max_projects = 4
/// debounce_ms = 250
///
/// [scan_options]
/// include_extensions = ["ts", "tsx"]
/// max_depth = 12
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Maximum number of registered projects.
    pub max_projects: usize,

    /// Memory limit assigned to new projects, in bytes.
    pub default_memory_limit: u64,

    /// Fixed part of a project's memory estimate.
    pub memory_base_bytes: u64,

    /// Per-file part of a project's memory estimate.
    pub memory_per_file_bytes: u64,

    /// Filter policy used by every project scan.
    pub scan_options: ScanOptions,

    /// Configuration handed to each project's context builder.
    pub builder: BuilderConfig,

    /// Watcher debounce window in milliseconds.
    pub debounce_ms: u64,

    /// Capacity of each watcher's event channel.
    pub event_channel_capacity: usize,

    /// Capacity of the project event broadcast channel.
    pub broadcast_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_projects: 10,
            default_memory_limit: 512 * 1024 * 1024,
            memory_base_bytes: 1024 * 1024,
            memory_per_file_bytes: 10 * 1024,
            scan_options: default_scan_options(),
            builder: BuilderConfig::default(),
            debounce_ms: 100,
            event_channel_capacity: 1000,
            broadcast_capacity: 256,
        }
    }
}

fn default_scan_options() -> ScanOptions {
    ScanOptions::new().with_include_extensions([
        "ts", "tsx", "js", "jsx", "mjs", "cjs", "json", "md",
    ])
}

impl ManagerConfig {
    /// Parse a TOML config.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML config file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&text)
    }

    pub fn with_max_projects(mut self, max: usize) -> Self {
        self.max_projects = max;
        self
    }

    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    pub fn with_builder(mut self, builder: BuilderConfig) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_default_memory_limit(mut self, bytes: u64) -> Self {
        self.default_memory_limit = bytes;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Coarse memory estimate for a project holding `file_count` files.
    pub fn estimate_memory(&self, file_count: usize) -> u64 {
        let files = u64::try_from(file_count).unwrap_or(u64::MAX);
        self.memory_base_bytes
            .saturating_add(files.saturating_mul(self.memory_per_file_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.max_projects, 10);
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert_eq!(config.builder.project_config_file, "sker.json");
        assert!(config.scan_options.accepts_extension(Some("ts")));
        assert!(!config.scan_options.accepts_extension(Some("png")));
    }

    #[test]
    fn test_partial_toml() {
        let config = ManagerConfig::from_toml_str(
            r#"
max_projects = 3
memory_per_file_bytes = 100

[scan_options]
include_extensions = ["rs"]
max_depth = 4

[builder]
analyze_dependencies = false
"#,
        )
        .unwrap();

        assert_eq!(config.max_projects, 3);
        assert_eq!(config.scan_options.include_extensions, vec!["rs".to_string()]);
        assert_eq!(config.scan_options.max_depth, Some(4));
        assert!(config.scan_options.respect_gitignore);
        assert!(!config.builder.analyze_dependencies);
        assert_eq!(config.builder.extractors.len(), 1);
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.estimate_memory(10), 1024 * 1024 + 1000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ManagerConfig::from_toml_str("max_projects = 'many'").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("manager.toml");
        tokio::fs::write(&path, "debounce_ms = 5\n").await.unwrap();

        let config = ManagerConfig::load(&path).await.unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(5));
    }
}
