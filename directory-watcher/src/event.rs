//! Change events emitted by directory watching.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind;
use serde::{Deserialize, Serialize};

/// A file system change notification for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeEvent {
    /// The kind of change.
    #[serde(rename = "type")]
    pub kind: FileChangeKind,

    /// Absolute path to the affected file or directory.
    pub path: PathBuf,

    /// When the change was observed.
    pub timestamp: DateTime<Utc>,

    /// Project the event belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl FileChangeEvent {
    /// Create a new change event.
    pub fn new(kind: FileChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
            project_id: None,
        }
    }

    /// Stamp the event with a project id.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Check if this event concerns a directory.
    pub fn is_directory_event(&self) -> bool {
        self.kind.is_directory()
    }
}

/// Kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileChangeKind {
    /// File was created.
    Add,

    /// File content changed.
    Change,

    /// File was deleted.
    Unlink,

    /// Directory was created.
    AddDir,

    /// Directory was deleted.
    UnlinkDir,
}

impl FileChangeKind {
    /// Whether this kind applies to directories.
    pub fn is_directory(self) -> bool {
        matches!(self, Self::AddDir | Self::UnlinkDir)
    }

    /// Wire label of the kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Unlink => "unlink",
            Self::AddDir => "addDir",
            Self::UnlinkDir => "unlinkDir",
        }
    }
}

impl std::fmt::Display for FileChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn created(path: &Path) -> FileChangeKind {
    if path.is_dir() {
        FileChangeKind::AddDir
    } else {
        FileChangeKind::Add
    }
}

/// Translate a raw notify event into zero or more change events.
///
/// Renames become an unlink of the old path and an add of the new one.
/// Access and metadata-only notifications produce nothing.
pub fn classify(event: &notify::Event) -> Vec<FileChangeEvent> {
    let paths = &event.paths;

    let kinds: Vec<(FileChangeKind, &PathBuf)> = match event.kind {
        EventKind::Create(CreateKind::Folder) => {
            paths.iter().map(|p| (FileChangeKind::AddDir, p)).collect()
        }
        EventKind::Create(CreateKind::File) => {
            paths.iter().map(|p| (FileChangeKind::Add, p)).collect()
        }
        EventKind::Create(_) => paths.iter().map(|p| (created(p), p)).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.iter().map(|p| (FileChangeKind::Unlink, p)).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.iter().map(|p| (created(p), p)).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match paths.as_slice() {
            [from, to] => vec![(FileChangeKind::Unlink, from), (created(to), to)],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .iter()
            .map(|p| {
                if p.exists() {
                    (created(p), p)
                } else {
                    (FileChangeKind::Unlink, p)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => paths
            .iter()
            .filter(|p| !p.is_dir())
            .map(|p| (FileChangeKind::Change, p))
            .collect(),
        EventKind::Remove(RemoveKind::Folder) => {
            paths.iter().map(|p| (FileChangeKind::UnlinkDir, p)).collect()
        }
        EventKind::Remove(_) => paths.iter().map(|p| (FileChangeKind::Unlink, p)).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    };

    kinds
        .into_iter()
        .map(|(kind, path)| FileChangeEvent::new(kind, path.clone()))
        .collect()
}

/// A batch of change events collected over one debounce window.
#[derive(Debug, Clone, Default)]
pub struct EventBatch {
    /// Events in this batch.
    pub events: Vec<FileChangeEvent>,

    /// When the batch was created.
    pub created_at: Option<DateTime<Utc>>,
}

impl EventBatch {
    /// Create a new empty batch.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Add an event to the batch.
    pub fn push(&mut self, event: FileChangeEvent) {
        self.events.push(event);
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Deduplicate events, keeping the latest event for each path.
    ///
    /// Surviving events keep the relative order in which they arrived.
    pub fn deduplicate(&mut self) {
        let mut latest: HashMap<PathBuf, usize> = HashMap::new();
        for (index, event) in self.events.iter().enumerate() {
            latest.insert(event.path.clone(), index);
        }

        let mut index = 0;
        self.events.retain(|event| {
            let keep = latest.get(&event.path) == Some(&index);
            index += 1;
            keep
        });
    }

    /// Take the events out of the batch.
    pub fn drain(&mut self) -> Vec<FileChangeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_change_event_creation() {
        let event = FileChangeEvent::new(FileChangeKind::Add, "/test/file.ts").with_project_id("p1");
        assert_eq!(event.kind, FileChangeKind::Add);
        assert_eq!(event.path, Path::new("/test/file.ts"));
        assert_eq!(event.project_id.as_deref(), Some("p1"));
        assert!(!event.is_directory_event());
    }

    #[test]
    fn test_kind_wire_format() {
        let event = FileChangeEvent::new(FileChangeKind::UnlinkDir, "/test/src");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "unlinkDir");
        assert!(json.get("project_id").is_none());

        let kind: FileChangeKind = serde_json::from_str("\"addDir\"").unwrap();
        assert_eq!(kind, FileChangeKind::AddDir);
    }

    #[test]
    fn test_classify_remove_and_rename() {
        let remove = notify::Event::new(EventKind::Remove(RemoveKind::Folder))
            .add_path(PathBuf::from("/gone/dir"));
        let events = classify(&remove);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileChangeKind::UnlinkDir);

        let rename = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/missing/old.ts"))
            .add_path(PathBuf::from("/missing/new.ts"));
        let events = classify(&rename);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, FileChangeKind::Unlink);
        assert_eq!(events[1].kind, FileChangeKind::Add);
        assert_eq!(events[1].path, Path::new("/missing/new.ts"));
    }

    #[test]
    fn test_classify_ignores_access() {
        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/a.ts"));
        assert!(classify(&access).is_empty());
    }

    #[test]
    fn test_event_batch_dedup_keeps_latest_in_order() {
        let mut batch = EventBatch::new();
        batch.push(FileChangeEvent::new(FileChangeKind::Change, "/test/a.ts"));
        batch.push(FileChangeEvent::new(FileChangeKind::Add, "/test/b.ts"));
        batch.push(FileChangeEvent::new(FileChangeKind::Unlink, "/test/a.ts"));

        batch.deduplicate();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.events[0].path, Path::new("/test/b.ts"));
        assert_eq!(batch.events[1].kind, FileChangeKind::Unlink);
    }
}
