//! Arena-backed file tree.
//!
//! The `ContextTree` owns every [`ContextNode`] in a map keyed by absolute
//! path. That map doubles as the O(1) `path → node` lookup used by
//! incremental updates. Edges only ever point downward through the public
//! API: attaching a node under itself or under one of its descendants is
//! rejected, so the tree stays acyclic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use tracing::{debug, warn};

use crate::error::{ContextError, Result};
use crate::node::{ContextNode, FileMetadata, NodeKind};
use crate::project_config::ProjectInfo;

/// Hierarchical file tree rooted at one directory.
#[derive(Debug, Clone)]
pub struct ContextTree {
    /// All nodes in the tree, indexed by path.
    nodes: HashMap<PathBuf, ContextNode>,

    /// Path of the root folder.
    root: PathBuf,
}

impl ContextTree {
    /// Create a tree holding only the root folder.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), ContextNode::folder(&root));
        Self { nodes, root }
    }

    /// Path of the root folder.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// The root folder node.
    pub fn root(&self) -> Option<&ContextNode> {
        self.nodes.get(&self.root)
    }

    /// Get a node by path.
    pub fn get(&self, path: &Path) -> Option<&ContextNode> {
        self.nodes.get(path)
    }

    /// Check whether a path is indexed.
    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All indexed paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.nodes.keys()
    }

    /// Attach `child` under the folder at `parent`.
    ///
    /// Idempotent: re-adding a path already listed under `parent` replaces the
    /// node's data without duplicating the entry. A node currently attached
    /// elsewhere is detached from its previous parent first. When a folder
    /// replaces a folder its children are carried over; otherwise any
    /// previous descendants are dropped.
    pub fn add_child(&mut self, parent: &Path, mut child: ContextNode) -> Result<()> {
        self.require_folder(parent)?;
        self.check_attach(&child.path, parent)?;

        let child_path = child.path.clone();

        if let Some(previous) = self.nodes.remove(&child_path) {
            if let Some(old_parent) = previous.parent.as_deref() {
                if old_parent != parent {
                    self.unlist(old_parent, &child_path);
                }
            }

            match (previous.as_folder(), child.as_folder_mut()) {
                (Some(old), Some(new)) if new.children.is_empty() => {
                    new.children = old.children.clone();
                }
                _ => {
                    for descendant in previous.children() {
                        self.drop_subtree(descendant);
                    }
                }
            }
        }

        child.parent = Some(parent.to_path_buf());
        self.nodes.insert(child_path.clone(), child);

        if let Some(folder) = self.nodes.get_mut(parent).and_then(ContextNode::as_folder_mut) {
            if !folder.children.contains(&child_path) {
                folder.children.push(child_path);
            }
        }

        Ok(())
    }

    /// Re-parent an existing node, detaching it from its current parent.
    pub fn move_node(&mut self, path: &Path, new_parent: &Path) -> Result<()> {
        if !self.nodes.contains_key(path) {
            return Err(ContextError::NodeNotFound(path.to_path_buf()));
        }
        self.require_folder(new_parent)?;
        self.check_attach(path, new_parent)?;

        let old_parent = self.nodes.get(path).and_then(|n| n.parent.clone());
        if let Some(old_parent) = old_parent {
            self.unlist(&old_parent, path);
        }

        if let Some(node) = self.nodes.get_mut(path) {
            node.parent = Some(new_parent.to_path_buf());
        }
        if let Some(folder) = self.nodes.get_mut(new_parent).and_then(ContextNode::as_folder_mut) {
            if !folder.children.iter().any(|c| c == path) {
                folder.children.push(path.to_path_buf());
            }
        }

        Ok(())
    }

    /// Detach `child` from `parent` and drop it, with its descendants, from the tree.
    ///
    /// Returns the detached node with its parent cleared, or None when `child`
    /// is not a direct child of `parent`.
    pub fn remove_child(&mut self, parent: &Path, child: &Path) -> Option<ContextNode> {
        let listed = self
            .nodes
            .get(parent)
            .is_some_and(|p| p.children().iter().any(|c| c == child));
        if !listed {
            return None;
        }

        self.remove(child).into_iter().next()
    }

    /// Remove a node and all of its descendants.
    ///
    /// Returns the removed nodes, the requested node first. The root cannot
    /// be removed.
    pub fn remove(&mut self, path: &Path) -> Vec<ContextNode> {
        if path == self.root {
            warn!("Refusing to remove tree root {}", path.display());
            return Vec::new();
        }

        let Some(mut node) = self.nodes.remove(path) else {
            return Vec::new();
        };

        if let Some(parent) = node.parent.take() {
            self.unlist(&parent, path);
        }

        let mut removed = Vec::new();
        let mut stack: Vec<PathBuf> = node.children().iter().rev().cloned().collect();
        removed.push(node);

        while let Some(next) = stack.pop() {
            if let Some(descendant) = self.nodes.remove(&next) {
                stack.extend(descendant.children().iter().rev().cloned());
                removed.push(descendant);
            }
        }

        debug!("Removed {} nodes under {}", removed.len(), path.display());
        removed
    }

    /// Find a direct child of `parent` by name.
    pub fn find_child(&self, parent: &Path, name: &str) -> Option<&ContextNode> {
        self.nodes
            .get(parent)?
            .children()
            .iter()
            .filter_map(|c| self.nodes.get(c))
            .find(|c| c.name == name)
    }

    /// Every descendant of `folder`, depth-first in scan order.
    pub fn all_descendants(&self, folder: &Path) -> Vec<&ContextNode> {
        let mut out = Vec::new();
        let Some(start) = self.nodes.get(folder) else {
            return out;
        };

        let mut stack: Vec<&PathBuf> = start.children().iter().rev().collect();
        while let Some(path) = stack.pop() {
            if let Some(node) = self.nodes.get(path) {
                out.push(node);
                stack.extend(node.children().iter().rev());
            }
        }

        out
    }

    /// Every file below `folder`, depth-first in scan order.
    pub fn all_files(&self, folder: &Path) -> Vec<&ContextNode> {
        self.all_descendants(folder)
            .into_iter()
            .filter(|n| n.is_file())
            .collect()
    }

    /// Every folder below `folder`, depth-first in scan order.
    pub fn all_subfolders(&self, folder: &Path) -> Vec<&ContextNode> {
        self.all_descendants(folder)
            .into_iter()
            .filter(|n| n.is_folder())
            .collect()
    }

    /// Files below `folder` whose name matches `pattern`.
    pub fn find_files_by_pattern(&self, folder: &Path, pattern: &Regex) -> Vec<&ContextNode> {
        self.all_files(folder)
            .into_iter()
            .filter(|n| pattern.is_match(&n.name))
            .collect()
    }

    /// Folders below `folder` whose name matches `pattern`.
    pub fn find_folders_by_pattern(&self, folder: &Path, pattern: &Regex) -> Vec<&ContextNode> {
        self.all_subfolders(folder)
            .into_iter()
            .filter(|n| pattern.is_match(&n.name))
            .collect()
    }

    /// Whether `path` sits strictly below `ancestor` in the tree.
    pub fn is_descendant_of(&self, path: &Path, ancestor: &Path) -> bool {
        let mut current = self.nodes.get(path).and_then(|n| n.parent.as_deref());
        let mut steps = 0;

        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                warn!("Parent chain of {} does not terminate", path.display());
                return false;
            }
            current = self.nodes.get(parent).and_then(|n| n.parent.as_deref());
        }

        false
    }

    /// Make sure a folder node exists at `path`, creating missing
    /// intermediate folders between the root and `path`.
    pub fn ensure_folder(&mut self, path: &Path) -> Result<()> {
        if !path.starts_with(&self.root) {
            return Err(ContextError::OutsideRoot(path.to_path_buf()));
        }

        let mut missing = Vec::new();
        let mut current = Some(path);
        while let Some(p) = current {
            if let Some(node) = self.nodes.get(p) {
                if !node.is_folder() {
                    return Err(ContextError::NotAFolder(p.to_path_buf()));
                }
                break;
            }
            missing.push(p.to_path_buf());
            current = p.parent();
        }

        for folder in missing.into_iter().rev() {
            let parent = folder
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| ContextError::OutsideRoot(folder.clone()))?;
            self.add_child(&parent, ContextNode::folder(&folder))?;
        }

        Ok(())
    }

    /// Mark a folder as a project root.
    pub fn set_project_root(&mut self, folder: &Path, info: ProjectInfo) -> Result<()> {
        let node = self
            .nodes
            .get_mut(folder)
            .ok_or_else(|| ContextError::NodeNotFound(folder.to_path_buf()))?;
        if !node.is_folder() {
            return Err(ContextError::NotAFolder(folder.to_path_buf()));
        }
        node.mark_project_root(info);
        Ok(())
    }

    /// Folders flagged as project roots, depth-first from the root.
    pub fn project_roots(&self) -> Vec<&ContextNode> {
        self.root()
            .into_iter()
            .chain(self.all_subfolders(&self.root))
            .filter(|n| n.is_project_root())
            .collect()
    }

    /// Number of file nodes.
    pub fn file_count(&self) -> usize {
        self.count_kind(NodeKind::File)
    }

    /// Number of folder nodes, root included.
    pub fn folder_count(&self) -> usize {
        self.count_kind(NodeKind::Folder)
    }

    fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind() == kind).count()
    }

    /// Sum of file sizes below `folder`.
    ///
    /// Files that cannot be stat'ed are skipped.
    pub async fn total_size(&self, folder: &Path) -> u64 {
        let mut total = 0;

        for file in self.all_files(folder) {
            if let Some(meta) = file.as_file().and_then(|f| f.metadata.as_ref()) {
                total += meta.size;
                continue;
            }
            match tokio::fs::metadata(&file.path).await {
                Ok(meta) => total += meta.len(),
                Err(e) => warn!("Skipping size of {}: {e}", file.path.display()),
            }
        }

        total
    }

    /// Latest modification time among files below `folder`.
    ///
    /// Files that cannot be stat'ed are skipped.
    pub async fn last_modified(&self, folder: &Path) -> Option<DateTime<Utc>> {
        let mut latest: Option<DateTime<Utc>> = None;

        for file in self.all_files(folder) {
            let modified = match tokio::fs::metadata(&file.path).await {
                Ok(meta) => meta.modified().ok().map(DateTime::<Utc>::from),
                Err(e) => {
                    warn!("Skipping mtime of {}: {e}", file.path.display());
                    None
                }
            };
            if let Some(modified) = modified {
                latest = Some(latest.map_or(modified, |l| l.max(modified)));
            }
        }

        latest
    }

    /// Load (once) and return a file's metadata.
    pub async fn load_file_metadata(&mut self, path: &Path) -> Result<&FileMetadata> {
        let cached = self.file_node(path)?.metadata.is_some();
        if !cached {
            let metadata = FileMetadata::load(path).await?;
            if let Some(file) = self.nodes.get_mut(path).and_then(ContextNode::as_file_mut) {
                file.metadata = Some(metadata);
            }
        }

        self.file_node(path)?
            .metadata
            .as_ref()
            .ok_or_else(|| ContextError::NodeNotFound(path.to_path_buf()))
    }

    /// Load (once) and return a file's content, decoded lossily as UTF-8.
    pub async fn load_file_content(&mut self, path: &Path) -> Result<&str> {
        let cached = self.file_node(path)?.content.is_some();
        if !cached {
            let bytes = tokio::fs::read(path).await?;
            let content = String::from_utf8_lossy(&bytes).into_owned();
            if let Some(file) = self.nodes.get_mut(path).and_then(ContextNode::as_file_mut) {
                file.content = Some(content);
            }
        }

        self.file_node(path)?
            .content
            .as_deref()
            .ok_or_else(|| ContextError::NodeNotFound(path.to_path_buf()))
    }

    /// Get statistics about the tree.
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            total_nodes: self.nodes.len(),
            files: self.file_count(),
            folders: self.folder_count(),
            project_roots: self.project_roots().len(),
        }
    }

    fn file_node(&self, path: &Path) -> Result<&crate::node::FileData> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| ContextError::NodeNotFound(path.to_path_buf()))?;
        node.as_file()
            .ok_or_else(|| ContextError::NotAFile(path.to_path_buf()))
    }

    fn require_folder(&self, path: &Path) -> Result<()> {
        match self.nodes.get(path) {
            Some(node) if node.is_folder() => Ok(()),
            Some(_) => Err(ContextError::NotAFolder(path.to_path_buf())),
            None => Err(ContextError::NodeNotFound(path.to_path_buf())),
        }
    }

    /// Reject edges that would make `child` its own ancestor.
    fn check_attach(&self, child: &Path, parent: &Path) -> Result<()> {
        if child == parent {
            return Err(ContextError::InvalidHierarchy(format!(
                "{} cannot be its own parent",
                child.display()
            )));
        }
        if child == self.root {
            return Err(ContextError::InvalidHierarchy(format!(
                "root {} cannot be attached under another node",
                child.display()
            )));
        }
        if self.is_descendant_of(parent, child) {
            return Err(ContextError::InvalidHierarchy(format!(
                "{} is a descendant of {}",
                parent.display(),
                child.display()
            )));
        }
        Ok(())
    }

    fn unlist(&mut self, parent: &Path, child: &Path) {
        if let Some(folder) = self.nodes.get_mut(parent).and_then(ContextNode::as_folder_mut) {
            folder.children.retain(|c| c != child);
        }
    }

    fn drop_subtree(&mut self, path: &Path) {
        let mut stack = vec![path.to_path_buf()];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children().iter().cloned());
            }
        }
    }
}

/// Statistics about the tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub files: usize,
    pub folders: usize,
    pub project_roots: usize,
}

impl std::fmt::Display for TreeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Context Tree Statistics:")?;
        writeln!(f, "  Total nodes: {}", self.total_nodes)?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Folders: {}", self.folders)?;
        writeln!(f, "  Project roots: {}", self.project_roots)
    }
}
