//! Scan options and ignore-rule matching.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ContextError, Result};

/// Default ignore file name.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Options for a directory scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Only keep files with these extensions. Wins over `exclude_extensions`.
    pub include_extensions: Vec<String>,

    /// Drop files with these extensions when no include list is set.
    pub exclude_extensions: Vec<String>,

    /// Deepest directory level that is listed; the root is level 0.
    pub max_depth: Option<usize>,

    /// Apply the root's ignore file.
    pub respect_gitignore: bool,

    /// Ignore file name, relative to the scan root.
    pub ignore_file: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
            max_depth: None,
            respect_gitignore: true,
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file = name.into();
        self
    }

    /// Whether a directory at `depth` below the root should be listed.
    pub fn descends_into(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }

    /// Extension filter.
    ///
    /// Extensions compare case-insensitively with any leading dot ignored.
    /// A non-empty include list wins; otherwise the exclude list applies;
    /// otherwise everything passes.
    pub fn accepts_extension(&self, extension: Option<&str>) -> bool {
        let matches = |list: &[String]| {
            extension.is_some_and(|ext| {
                let ext = ext.trim_start_matches('.');
                list.iter()
                    .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
        };

        if !self.include_extensions.is_empty() {
            matches(&self.include_extensions)
        } else if !self.exclude_extensions.is_empty() {
            !matches(&self.exclude_extensions)
        } else {
            true
        }
    }

    /// Extension filter applied to a path.
    pub fn accepts_path(&self, path: &Path) -> bool {
        let extension = path.extension().map(|e| e.to_string_lossy());
        self.accepts_extension(extension.as_deref())
    }
}

/// Compiled gitignore-style rules anchored at a scan root.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Gitignore,
}

impl IgnoreMatcher {
    /// A matcher that ignores nothing.
    pub fn empty() -> Self {
        Self {
            rules: Gitignore::empty(),
        }
    }

    /// Compile rule text, one pattern per line.
    pub fn compile(root: &Path, rules: &str) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for line in rules.lines() {
            builder
                .add_line(None, line)
                .map_err(|e| ContextError::IgnoreRules(e.to_string()))?;
        }
        let rules = builder
            .build()
            .map_err(|e| ContextError::IgnoreRules(e.to_string()))?;
        Ok(Self { rules })
    }

    /// Load the ignore file at `root/file_name`.
    ///
    /// A missing file yields an empty rule set.
    pub async fn load(root: &Path, file_name: &str) -> Result<Self> {
        let path = root.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!("Loaded ignore rules from {}", path.display());
                Self::compile(root, &text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::empty()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a root-relative path is ignored, directly or via a parent.
    pub fn matches(&self, relative: &Path, is_dir: bool) -> bool {
        if relative.as_os_str().is_empty() || relative.has_root() {
            return false;
        }
        self.rules
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_include_wins_over_exclude() {
        let options = ScanOptions::new()
            .with_include_extensions([".ts"])
            .with_exclude_extensions(["ts"]);
        assert!(options.accepts_extension(Some("ts")));
        assert!(!options.accepts_extension(Some("js")));
        assert!(!options.accepts_extension(None));
    }

    #[test]
    fn test_exclude_list() {
        let options = ScanOptions::new().with_exclude_extensions(["log", ".TMP"]);
        assert!(!options.accepts_extension(Some("log")));
        assert!(!options.accepts_extension(Some("tmp")));
        assert!(options.accepts_extension(Some("ts")));
        assert!(options.accepts_extension(None));
        assert!(options.accepts_path(Path::new("/p/Makefile")));
    }

    #[test]
    fn test_no_filter_accepts_everything() {
        let options = ScanOptions::default();
        assert!(options.accepts_extension(Some("anything")));
        assert!(options.accepts_extension(None));
    }

    #[test]
    fn test_depth_limit() {
        let options = ScanOptions::new().with_max_depth(1);
        assert!(options.descends_into(0));
        assert!(options.descends_into(1));
        assert!(!options.descends_into(2));
        assert!(ScanOptions::default().descends_into(100));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ScanOptions =
            serde_json::from_str(r#"{ "include_extensions": ["rs"] }"#).unwrap();
        assert_eq!(options.include_extensions, vec!["rs".to_string()]);
        assert!(options.respect_gitignore);
        assert_eq!(options.ignore_file, ".gitignore");
    }

    #[test]
    fn test_ignore_matcher() {
        let matcher = IgnoreMatcher::compile(Path::new("/p"), "dist/\n*.log\n!keep.log\n").unwrap();

        assert!(matcher.matches(Path::new("dist"), true));
        assert!(matcher.matches(Path::new("dist/bundle.js"), false));
        assert!(!matcher.matches(Path::new("dist"), false));
        assert!(matcher.matches(Path::new("debug.log"), false));
        assert!(!matcher.matches(Path::new("keep.log"), false));
        assert!(!matcher.matches(Path::new("src/app.ts"), false));
    }

    #[tokio::test]
    async fn test_missing_ignore_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let matcher = IgnoreMatcher::load(temp.path(), ".gitignore").await.unwrap();
        assert!(matcher.is_empty());
        assert!(!matcher.matches(Path::new("anything"), false));
    }
}
