//! Core types for the indexed file tree.
//!
//! A `ContextNode` is one filesystem entry. Nodes are owned by a
//! [`ContextTree`](crate::tree::ContextTree) arena keyed by absolute path;
//! folders list their children by path and every node records its parent's
//! path, so there are no owning back-references.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::project_config::ProjectInfo;

/// Bytes sniffed when deciding whether a file without a text MIME type is text.
const TEXT_SNIFF_LEN: usize = 8000;

/// Discriminant of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Folder,
}

/// One file or folder in the indexed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextNode {
    /// Absolute path; unique key in the tree.
    pub path: PathBuf,

    /// Base name of the path.
    pub name: String,

    /// Path of the owning folder (None for the root or a detached node).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PathBuf>,

    /// Kind-specific data.
    #[serde(flatten)]
    pub data: NodeData,
}

/// Kind-specific node data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeData {
    File(FileData),
    Folder(FolderData),
}

/// Data carried by folder nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderData {
    /// Child paths in scan order.
    pub children: Vec<PathBuf>,

    /// Whether the folder holds a project config file.
    pub is_project_root: bool,

    /// Parsed project metadata for project roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_info: Option<ProjectInfo>,
}

/// Data carried by file nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    /// Extension without the leading dot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// Lazily loaded metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,

    /// Lazily loaded content.
    #[serde(skip)]
    pub content: Option<String>,
}

/// Metadata loaded on demand for a file node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Size in bytes.
    pub size: u64,

    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,

    /// Creation time, where the platform reports one.
    pub created: Option<DateTime<Utc>>,

    /// Hex SHA-256 of the content.
    pub hash: String,

    /// Guessed MIME type.
    pub mime_type: String,

    /// Whether the content looks like text.
    pub is_text_file: bool,
}

impl FileMetadata {
    /// Stat and hash a file.
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let bytes = tokio::fs::read(path).await?;

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
            hash: format!("{:x}", Sha256::digest(&bytes)),
            is_text_file: looks_like_text(&mime_type, &bytes),
            mime_type,
        })
    }
}

fn looks_like_text(mime_type: &str, bytes: &[u8]) -> bool {
    if mime_type.starts_with("text/")
        || matches!(
            mime_type,
            "application/json"
                | "application/javascript"
                | "application/xml"
                | "application/toml"
                | "application/x-sh"
        )
    {
        return true;
    }

    let sniff = &bytes[..bytes.len().min(TEXT_SNIFF_LEN)];
    !sniff.contains(&0) && std::str::from_utf8(sniff).is_ok()
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ContextNode {
    /// Create a file node.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned());

        Self {
            name: base_name(&path),
            path,
            parent: None,
            data: NodeData::File(FileData {
                extension,
                ..FileData::default()
            }),
        }
    }

    /// Create a folder node.
    pub fn folder(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path),
            path,
            parent: None,
            data: NodeData::Folder(FolderData::default()),
        }
    }

    /// The node discriminant.
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::File(_) => NodeKind::File,
            NodeData::Folder(_) => NodeKind::Folder,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind() == NodeKind::Folder
    }

    /// Child paths; empty for files.
    pub fn children(&self) -> &[PathBuf] {
        match &self.data {
            NodeData::Folder(folder) => &folder.children,
            NodeData::File(_) => &[],
        }
    }

    pub fn as_file(&self) -> Option<&FileData> {
        match &self.data {
            NodeData::File(file) => Some(file),
            NodeData::Folder(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileData> {
        match &mut self.data {
            NodeData::File(file) => Some(file),
            NodeData::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderData> {
        match &self.data {
            NodeData::Folder(folder) => Some(folder),
            NodeData::File(_) => None,
        }
    }

    pub(crate) fn as_folder_mut(&mut self) -> Option<&mut FolderData> {
        match &mut self.data {
            NodeData::Folder(folder) => Some(folder),
            NodeData::File(_) => None,
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.as_file().and_then(|f| f.extension.as_deref())
    }

    /// Whether this is a folder marked as a project root.
    pub fn is_project_root(&self) -> bool {
        self.as_folder().is_some_and(|f| f.is_project_root)
    }

    /// Project metadata for project-root folders.
    pub fn project_info(&self) -> Option<&ProjectInfo> {
        self.as_folder().and_then(|f| f.project_info.as_ref())
    }

    /// Mark this folder as a project root. No effect on files.
    pub fn mark_project_root(&mut self, info: ProjectInfo) {
        if let Some(folder) = self.as_folder_mut() {
            folder.is_project_root = true;
            folder.project_info = Some(info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_file_node_creation() {
        let node = ContextNode::file("/p/src/app.ts");
        assert_eq!(node.name, "app.ts");
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.extension(), Some("ts"));
        assert!(node.children().is_empty());
        assert!(node.parent.is_none());
    }

    #[test]
    fn test_folder_node_creation() {
        let node = ContextNode::folder("/p/src");
        assert_eq!(node.name, "src");
        assert!(node.is_folder());
        assert!(!node.is_project_root());
        assert!(node.extension().is_none());
    }

    #[test]
    fn test_mark_project_root_only_affects_folders() {
        let mut folder = ContextNode::folder("/p");
        folder.mark_project_root(ProjectInfo::fallback("p"));
        assert!(folder.is_project_root());
        assert_eq!(folder.project_info().map(|i| i.name.as_str()), Some("p"));

        let mut file = ContextNode::file("/p/a.ts");
        file.mark_project_root(ProjectInfo::fallback("p"));
        assert!(!file.is_project_root());
    }

    #[test]
    fn test_serialized_type_tag() {
        let json = serde_json::to_value(ContextNode::file("/p/a.ts")).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["name"], "a.ts");

        let json = serde_json::to_value(ContextNode::folder("/p")).unwrap();
        assert_eq!(json["type"], "folder");
    }

    #[tokio::test]
    async fn test_metadata_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.md");
        tokio::fs::write(&path, "# hello").await.unwrap();

        let meta = FileMetadata::load(&path).await.unwrap();
        assert_eq!(meta.size, 7);
        assert_eq!(meta.mime_type, "text/markdown");
        assert!(meta.is_text_file);
        assert_eq!(meta.hash.len(), 64);
    }

    #[tokio::test]
    async fn test_binary_detection() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        tokio::fs::write(&path, [0u8, 159, 146, 150]).await.unwrap();

        let meta = FileMetadata::load(&path).await.unwrap();
        assert!(!meta.is_text_file);
        assert_eq!(meta.mime_type, "application/octet-stream");
    }
}
