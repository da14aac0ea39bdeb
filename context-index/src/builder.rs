//! Directory scanner and incremental updater.
//!
//! A `ContextBuilder` owns one [`ContextTree`] and one [`DependencyGraph`]
//! for a single root. `build_from_directory` replaces both from a fresh
//! scan; `handle_file_change` patches them from watcher events.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sker_directory_watcher::{FileChangeEvent, FileChangeKind};
use tracing::{debug, info, warn};

use crate::dependency::{DependencyGraph, DependencyRecord};
use crate::error::{ContextError, Result};
use crate::extractor::{
    DEFAULT_RESOLUTION_CANDIDATES, DependencyExtractor, ImportPatternExtractor, SharedExtractor,
    resolve_import,
};
use crate::node::ContextNode;
use crate::options::{IgnoreMatcher, ScanOptions};
use crate::project_config::{PROJECT_CONFIG_FILE, ProjectInfo, folder_name_of, load_project_config};
use crate::tree::ContextTree;

/// Builder configuration, injected per builder instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// File name that marks a folder as a project root.
    pub project_config_file: String,

    /// Run import extraction after scans and updates.
    pub analyze_dependencies: bool,

    /// Suffixes tried when resolving a relative import.
    pub resolution_candidates: Vec<String>,

    /// Import extractors, consulted in order by file extension.
    #[serde(skip, default = "default_extractors")]
    pub extractors: Vec<SharedExtractor>,
}

fn default_extractors() -> Vec<SharedExtractor> {
    let patterns: SharedExtractor = Arc::new(ImportPatternExtractor::default());
    vec![patterns]
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            project_config_file: PROJECT_CONFIG_FILE.to_string(),
            analyze_dependencies: true,
            resolution_candidates: DEFAULT_RESOLUTION_CANDIDATES
                .iter()
                .map(ToString::to_string)
                .collect(),
            extractors: default_extractors(),
        }
    }
}

impl BuilderConfig {
    pub fn with_analyze_dependencies(mut self, analyze: bool) -> Self {
        self.analyze_dependencies = analyze;
        self
    }

    pub fn with_project_config_file(mut self, name: impl Into<String>) -> Self {
        self.project_config_file = name.into();
        self
    }

    /// Register an extractor ahead of the existing ones.
    pub fn with_extractor(mut self, extractor: SharedExtractor) -> Self {
        self.extractors.insert(0, extractor);
        self
    }

    fn extractor_for(&self, extension: &str) -> Option<&dyn DependencyExtractor> {
        self.extractors
            .iter()
            .find(|e| e.supports(extension))
            .map(Arc::as_ref)
    }
}

/// Outcome of applying one change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChangeResult {
    pub success: bool,

    /// Files importing the changed paths, directly or transitively.
    pub affected_files: Vec<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The node as it stands after the update, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_context: Option<ContextNode>,
}

impl FileChangeResult {
    fn applied(affected_files: Vec<PathBuf>, updated_context: Option<ContextNode>) -> Self {
        Self {
            success: true,
            affected_files,
            error: None,
            updated_context,
        }
    }

    fn failed(error: &ContextError) -> Self {
        Self {
            success: false,
            affected_files: Vec::new(),
            error: Some(error.to_string()),
            updated_context: None,
        }
    }
}

/// Summary of the current index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub files: usize,
    pub folders: usize,
    pub dependency_edges: usize,
    pub project_roots: usize,
    pub last_build_at: Option<DateTime<Utc>>,
    pub last_build_ms: Option<u64>,
}

/// Scans a directory into a context tree and keeps it current.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    config: BuilderConfig,
    tree: Option<ContextTree>,
    graph: DependencyGraph,
    options: ScanOptions,
    ignore: IgnoreMatcher,
    last_build_at: Option<DateTime<Utc>>,
    last_build_duration: Option<Duration>,
}

impl ContextBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Options of the last build.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn is_built(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> Option<&ContextTree> {
        self.tree.as_ref()
    }

    /// Mutable tree access for lazy metadata and content loading.
    pub fn tree_mut(&mut self) -> Option<&mut ContextTree> {
        self.tree.as_mut()
    }

    pub fn root(&self) -> Option<&ContextNode> {
        self.tree.as_ref().and_then(ContextTree::root)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// O(1) node lookup by absolute path.
    pub fn get_node(&self, path: &Path) -> Option<&ContextNode> {
        self.tree.as_ref()?.get(path)
    }

    pub fn get_file_dependencies(&self, path: &Path) -> Option<&DependencyRecord> {
        self.graph.get_file_dependencies(path)
    }

    pub fn get_affected_files(&self, path: &Path) -> Vec<PathBuf> {
        self.graph.get_affected_files(path)
    }

    /// Drop the tree, the graph and the ignore rules.
    pub fn clear(&mut self) {
        self.tree = None;
        self.graph.clear();
        self.ignore = IgnoreMatcher::empty();
        self.last_build_at = None;
        self.last_build_duration = None;
    }

    pub fn stats(&self) -> BuildStats {
        let (files, folders, project_roots) = match &self.tree {
            Some(tree) => (
                tree.file_count(),
                tree.folder_count(),
                tree.project_roots().len(),
            ),
            None => (0, 0, 0),
        };

        BuildStats {
            files,
            folders,
            dependency_edges: self.graph.edge_count(),
            project_roots,
            last_build_at: self.last_build_at,
            last_build_ms: self
                .last_build_duration
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    /// Scan `root` and replace the current index.
    ///
    /// The previous index is kept if the scan fails.
    pub async fn build_from_directory(
        &mut self,
        root: &Path,
        options: ScanOptions,
    ) -> Result<BuildStats> {
        let started = Instant::now();

        let metadata = match tokio::fs::metadata(root).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ContextError::DirectoryNotFound(root.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            return Err(ContextError::NotADirectory(root.to_path_buf()));
        }

        let ignore = if options.respect_gitignore {
            IgnoreMatcher::load(root, &options.ignore_file).await?
        } else {
            IgnoreMatcher::empty()
        };

        let mut tree = ContextTree::new(root);
        let scanner = Scanner {
            root,
            options: &options,
            ignore: &ignore,
            config: &self.config,
        };
        let files = scanner.scan(&mut tree, root, 0).await?;

        let mut graph = DependencyGraph::new();
        if self.config.analyze_dependencies {
            for file in &files {
                analyze_file(&self.config, &mut graph, file).await;
            }
        }

        self.tree = Some(tree);
        self.graph = graph;
        self.options = options;
        self.ignore = ignore;
        self.last_build_at = Some(Utc::now());
        self.last_build_duration = Some(started.elapsed());

        let stats = self.stats();
        info!(
            "Built context for {}: {} files, {} folders, {} dependency edges",
            root.display(),
            stats.files,
            stats.folders,
            stats.dependency_edges
        );
        Ok(stats)
    }

    /// Apply one change event to the index.
    ///
    /// Never panics and never returns an error; failures are reported in
    /// the result with `success: false`.
    pub async fn handle_file_change(&mut self, event: &FileChangeEvent) -> FileChangeResult {
        debug!("Applying {} for {}", event.kind, event.path.display());

        match self.apply(event.kind, &event.path).await {
            Ok((affected, node)) => FileChangeResult::applied(affected, node),
            Err(e) => {
                warn!("Failed to apply {} for {}: {e}", event.kind, event.path.display());
                FileChangeResult::failed(&e)
            }
        }
    }

    async fn apply(
        &mut self,
        kind: FileChangeKind,
        path: &Path,
    ) -> Result<(Vec<PathBuf>, Option<ContextNode>)> {
        let root = self
            .tree
            .as_ref()
            .map(|t| t.root_path().to_path_buf())
            .ok_or(ContextError::NotBuilt)?;
        if path == root || !path.starts_with(&root) {
            return Err(ContextError::OutsideRoot(path.to_path_buf()));
        }

        match kind {
            FileChangeKind::Add | FileChangeKind::Change => self.apply_file(&root, path).await,
            FileChangeKind::Unlink => self.apply_unlink(path),
            FileChangeKind::AddDir => self.apply_add_dir(&root, path).await,
            FileChangeKind::UnlinkDir => Ok((self.remove_subtree(path), None)),
        }
    }

    /// Route a file event by what the index currently holds at `path`.
    async fn apply_file(
        &mut self,
        root: &Path,
        path: &Path,
    ) -> Result<(Vec<PathBuf>, Option<ContextNode>)> {
        match self.get_node(path).map(ContextNode::is_file) {
            Some(true) => self.apply_change(path).await,
            Some(false) => {
                if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
                    return Ok((Vec::new(), self.get_node(path).cloned()));
                }
                // A directory was replaced by a file at the same path.
                let mut affected: BTreeSet<PathBuf> =
                    self.remove_subtree(path).into_iter().collect();
                let (added, node) = self.apply_add(root, path).await?;
                affected.extend(added);
                Ok((affected.into_iter().collect(), node))
            }
            None => self.apply_add(root, path).await,
        }
    }

    /// Index a file with no node yet.
    async fn apply_add(
        &mut self,
        root: &Path,
        path: &Path,
    ) -> Result<(Vec<PathBuf>, Option<ContextNode>)> {
        if !self.admits(root, path, false) {
            debug!("Ignoring filtered path {}", path.display());
            return Ok((Vec::new(), None));
        }

        let parent = parent_of(path)?;
        let is_config = self.is_project_config(path);
        let tree = self.tree.as_mut().ok_or(ContextError::NotBuilt)?;
        tree.ensure_folder(&parent)?;

        if is_config {
            let info = read_project_info(path).await;
            tree.set_project_root(&parent, info)?;
        }
        if !self.options.accepts_path(path) {
            return Ok((Vec::new(), tree.get(&parent).cloned()));
        }

        tree.add_child(&parent, ContextNode::file(path))?;

        // Files analyzed earlier may already import this path.
        let importers = self.graph.remove_dependencies(path);
        if self.config.analyze_dependencies {
            analyze_file(&self.config, &mut self.graph, path).await;
        }
        for importer in importers {
            if importer != path && tree.contains(&importer) {
                self.graph.add_dependency(&importer, path);
            }
        }

        let affected = self.graph.get_affected_files(path);
        Ok((affected, self.get_node(path).cloned()))
    }

    /// Re-index a file that already has a node.
    async fn apply_change(&mut self, path: &Path) -> Result<(Vec<PathBuf>, Option<ContextNode>)> {
        let affected = self.graph.get_affected_files(path);
        let importers = self.graph.remove_dependencies(path);

        let parent = parent_of(path)?;
        let is_config = self.is_project_config(path);
        let tree = self.tree.as_mut().ok_or(ContextError::NotBuilt)?;
        tree.add_child(&parent, ContextNode::file(path))?;

        if is_config {
            let info = read_project_info(path).await;
            tree.set_project_root(&parent, info)?;
        }

        if self.config.analyze_dependencies {
            analyze_file(&self.config, &mut self.graph, path).await;
        }
        for importer in importers {
            if importer != path && tree.contains(&importer) {
                self.graph.add_dependency(&importer, path);
            }
        }

        Ok((affected, self.get_node(path).cloned()))
    }

    fn apply_unlink(&mut self, path: &Path) -> Result<(Vec<PathBuf>, Option<ContextNode>)> {
        if self.get_node(path).is_some_and(ContextNode::is_folder) {
            return Ok((self.remove_subtree(path), None));
        }
        Ok((self.unlink_file(path), None))
    }

    /// Drop a file node and its record, returning its surviving importers.
    fn unlink_file(&mut self, path: &Path) -> Vec<PathBuf> {
        let affected: Vec<PathBuf> = self
            .graph
            .get_affected_files(path)
            .into_iter()
            .filter(|p| p != path)
            .collect();

        if let Some(tree) = self.tree.as_mut() {
            tree.remove(path);
        }
        self.graph.remove_dependencies(path);
        affected
    }

    async fn apply_add_dir(
        &mut self,
        root: &Path,
        path: &Path,
    ) -> Result<(Vec<PathBuf>, Option<ContextNode>)> {
        // A file was replaced by a directory at the same path.
        let affected = if self.get_node(path).is_some_and(ContextNode::is_file) {
            self.unlink_file(path)
        } else {
            Vec::new()
        };

        if !self.admits(root, path, true) {
            debug!("Ignoring filtered directory {}", path.display());
            return Ok((affected, None));
        }

        let tree = self.tree.as_mut().ok_or(ContextError::NotBuilt)?;
        tree.ensure_folder(path)?;

        let depth = depth_of(root, path);
        let files = if self.options.descends_into(depth) {
            let scanner = Scanner {
                root,
                options: &self.options,
                ignore: &self.ignore,
                config: &self.config,
            };
            scanner.scan(tree, path, depth).await?
        } else {
            Vec::new()
        };

        if self.config.analyze_dependencies {
            for file in &files {
                analyze_file(&self.config, &mut self.graph, file).await;
            }
        }

        Ok((affected, self.get_node(path).cloned()))
    }

    /// Remove a folder and everything below it, returning the surviving
    /// importers of the removed files.
    ///
    /// Graph records below the folder go too, including import targets the
    /// scan filtered out of the tree.
    fn remove_subtree(&mut self, path: &Path) -> Vec<PathBuf> {
        let removed: Vec<ContextNode> = match self.tree.as_mut() {
            Some(tree) => tree.remove(path),
            None => Vec::new(),
        };

        let mut gone: BTreeSet<PathBuf> = removed
            .iter()
            .filter(|n| n.is_file())
            .map(|n| n.path.clone())
            .collect();
        gone.extend(self.graph.paths_under(path));

        let mut affected = BTreeSet::new();
        for file in &gone {
            affected.extend(
                self.graph
                    .get_affected_files(file)
                    .into_iter()
                    .filter(|p| !p.starts_with(path)),
            );
        }
        for file in &gone {
            self.graph.remove_dependencies(file);
        }

        debug!(
            "Removed {} nodes and {} records under {}, {} affected",
            removed.len(),
            gone.len(),
            path.display(),
            affected.len()
        );
        affected.into_iter().collect()
    }

    /// Whether the last build's depth limit and ignore rules admit `path`.
    fn admits(&self, root: &Path, path: &Path, is_dir: bool) -> bool {
        let parent_depth = depth_of(root, path).saturating_sub(1);
        if !self.options.descends_into(parent_depth) {
            return false;
        }
        match path.strip_prefix(root) {
            Ok(relative) => !self.ignore.matches(relative, is_dir),
            Err(_) => false,
        }
    }

    fn is_project_config(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|n| n.to_string_lossy() == self.config.project_config_file)
    }
}

/// Borrowed scan state for one directory walk.
struct Scanner<'a> {
    root: &'a Path,
    options: &'a ScanOptions,
    ignore: &'a IgnoreMatcher,
    config: &'a BuilderConfig,
}

impl Scanner<'_> {
    /// Depth-first walk from `start` (at `start_depth` below the root),
    /// adding nodes to `tree`. Returns the file paths added.
    async fn scan(
        &self,
        tree: &mut ContextTree,
        start: &Path,
        start_depth: usize,
    ) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![(start.to_path_buf(), start_depth)];

        while let Some((dir, depth)) = stack.pop() {
            let entries = match list_sorted(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == start => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {e}", dir.display());
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            for (name, path, is_symlink) in entries {
                let is_dir = match tokio::fs::metadata(&path).await {
                    Ok(meta) => meta.is_dir(),
                    Err(e) => {
                        warn!("Skipping unreadable entry {}: {e}", path.display());
                        continue;
                    }
                };
                if is_dir && is_symlink {
                    debug!("Not following directory symlink {}", path.display());
                    continue;
                }

                let relative = path.strip_prefix(self.root).unwrap_or(&path);
                if self.ignore.matches(relative, is_dir) {
                    continue;
                }

                if is_dir {
                    tree.add_child(&dir, ContextNode::folder(&path))?;
                    if self.options.descends_into(depth + 1) {
                        subdirs.push((path, depth + 1));
                    }
                    continue;
                }

                if name == self.config.project_config_file {
                    let info = read_project_info(&path).await;
                    tree.set_project_root(&dir, info)?;
                }

                if self.options.accepts_path(&path) {
                    tree.add_child(&dir, ContextNode::file(&path))?;
                    files.push(path);
                }
            }

            stack.extend(subdirs.into_iter().rev());
        }

        Ok(files)
    }
}

/// Directory entries as `(name, path, is_symlink)`, sorted by name.
async fn list_sorted(dir: &Path) -> std::io::Result<Vec<(String, PathBuf, bool)>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let is_symlink = match entry.file_type().await {
            Ok(file_type) => file_type.is_symlink(),
            Err(e) => {
                warn!("Skipping unreadable entry {}: {e}", entry.path().display());
                continue;
            }
        };
        entries.push((
            entry.file_name().to_string_lossy().into_owned(),
            entry.path(),
            is_symlink,
        ));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Parse a project config, falling back to the folder name on failure.
async fn read_project_info(path: &Path) -> ProjectInfo {
    match load_project_config(path).await {
        Ok(info) => info,
        Err(e) => {
            warn!("Using fallback project info: {e}");
            ProjectInfo::fallback(folder_name_of(path))
        }
    }
}

/// Extract and resolve the imports of one file into `graph`.
///
/// Read failures are logged and leave the graph untouched.
async fn analyze_file(config: &BuilderConfig, graph: &mut DependencyGraph, path: &Path) {
    let Some(extension) = path.extension().map(|e| e.to_string_lossy()) else {
        return;
    };
    let Some(extractor) = config.extractor_for(&extension) else {
        return;
    };

    let source = match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Skipping dependency analysis of {}: {e}", path.display());
            return;
        }
    };

    for specifier in extractor.extract(&source) {
        if let Some(target) = resolve_import(path, &specifier, &config.resolution_candidates).await
        {
            if target != path {
                graph.add_dependency(path, &target);
            }
        }
    }
}

fn parent_of(path: &Path) -> Result<PathBuf> {
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ContextError::OutsideRoot(path.to_path_buf()))
}

/// Number of components between `root` and `path`.
fn depth_of(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(path, content).await.unwrap();
    }

    fn event(kind: FileChangeKind, path: &Path) -> FileChangeEvent {
        FileChangeEvent::new(kind, path)
    }

    #[tokio::test]
    async fn test_build_missing_directory() {
        let mut builder = ContextBuilder::default();
        let err = builder
            .build_from_directory(Path::new("/nonexistent/dir/42"), ScanOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::DirectoryNotFound(_)));
        assert!(!builder.is_built());
    }

    #[tokio::test]
    async fn test_build_file_is_not_a_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.ts");
        write(&file, "").await;

        let err = ContextBuilder::default()
            .build_from_directory(&file, ScanOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_children_follow_name_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("b.ts"), "").await;
        write(&root.join("a.ts"), "").await;
        write(&root.join("c/d.ts"), "").await;

        let mut builder = ContextBuilder::default();
        builder
            .build_from_directory(root, ScanOptions::default())
            .await
            .unwrap();

        let names: Vec<String> = builder
            .root()
            .unwrap()
            .children()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ts", "b.ts", "c"]);
    }

    #[tokio::test]
    async fn test_analysis_can_be_disabled() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("a.ts"), "export const a = 1;").await;
        write(&root.join("b.ts"), "import { a } from './a';").await;

        let mut builder = ContextBuilder::new(BuilderConfig::default().with_analyze_dependencies(false));
        let stats = builder
            .build_from_directory(root, ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.dependency_edges, 0);
    }

    #[tokio::test]
    async fn test_change_relinks_importers() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let a = root.join("a.ts");
        let b = root.join("b.ts");
        let c = root.join("c.ts");
        write(&a, "export const a = 1;").await;
        write(&b, "import { a } from './a';").await;
        write(&c, "import { b } from './b';").await;

        let mut builder = ContextBuilder::default();
        builder
            .build_from_directory(root, ScanOptions::default())
            .await
            .unwrap();

        write(&b, "export const b = 2;").await;
        let result = builder
            .handle_file_change(&event(FileChangeKind::Change, &b))
            .await;

        assert!(result.success);
        assert_eq!(result.affected_files, vec![c.clone()]);
        assert!(builder.graph().imports_of(&b).is_empty());
        assert_eq!(builder.graph().importers_of(&b), vec![c.clone()]);
        assert!(builder.get_affected_files(&a).is_empty());
        assert!(builder.graph().is_symmetric());
    }

    #[tokio::test]
    async fn test_unlink_reports_importers() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let a = root.join("a.ts");
        let b = root.join("b.ts");
        write(&a, "export const a = 1;").await;
        write(&b, "import { a } from './a';").await;

        let mut builder = ContextBuilder::default();
        builder
            .build_from_directory(root, ScanOptions::default())
            .await
            .unwrap();

        tokio::fs::remove_file(&a).await.unwrap();
        let result = builder
            .handle_file_change(&event(FileChangeKind::Unlink, &a))
            .await;

        assert!(result.success);
        assert_eq!(result.affected_files, vec![b.clone()]);
        assert!(builder.get_node(&a).is_none());
        assert!(builder.graph().imports_of(&b).is_empty());
        assert!(builder.graph().is_symmetric());
    }

    #[tokio::test]
    async fn test_events_before_build_fail() {
        let mut builder = ContextBuilder::default();
        let result = builder
            .handle_file_change(&event(FileChangeKind::Add, Path::new("/tmp/x.ts")))
            .await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_clear_drops_state() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("a.ts"), "").await;

        let mut builder = ContextBuilder::default();
        builder
            .build_from_directory(temp.path(), ScanOptions::default())
            .await
            .unwrap();
        builder.clear();

        assert!(!builder.is_built());
        assert_eq!(builder.stats(), BuildStats::default());
    }
}
