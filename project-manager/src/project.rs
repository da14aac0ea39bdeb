//! Project records, statistics and observer events.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sker_context_index::ProjectInfo;
use sker_directory_watcher::FileChangeKind;

/// Lifecycle status of a registered project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Error,
    Scanning,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Error => "error",
            ProjectStatus::Scanning => "scanning",
        };
        f.write_str(label)
    }
}

/// A registered project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,

    /// Canonical root directory; unique across projects.
    pub root_path: PathBuf,

    /// Metadata from the root's project config.
    pub info: ProjectInfo,

    pub status: ProjectStatus,
    pub registered_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub last_scan_at: Option<DateTime<Utc>>,

    /// Soft memory budget in bytes.
    pub memory_limit: u64,

    /// Estimated memory held by the project's index, in bytes.
    pub memory_usage: u64,

    /// Cleared on resume.
    pub last_error: Option<String>,

    pub is_watching: bool,
}

impl ProjectRecord {
    pub(crate) fn new(id: String, root_path: PathBuf, info: ProjectInfo, memory_limit: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            root_path,
            info,
            status: ProjectStatus::Active,
            registered_at: now,
            last_active_at: now,
            last_scan_at: None,
            memory_limit,
            memory_usage: 0,
            last_error: None,
            is_watching: false,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

/// Per-project counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub project_id: String,
    pub status: Option<ProjectStatus>,
    pub file_count: usize,
    pub memory_usage: u64,

    /// Duration of the last successful scan in milliseconds.
    pub last_scan_time: Option<u64>,

    pub scan_count: u64,
    pub change_count: u64,
}

impl ProjectStats {
    pub(crate) fn zeroed(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            ..Self::default()
        }
    }
}

/// Aggregate counters across all registered projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub paused_projects: usize,
    pub error_projects: usize,
    pub scanning_projects: usize,
    pub watching_projects: usize,
    pub total_files: usize,
    pub total_memory_usage: u64,
    pub total_scans: u64,
    pub total_changes: u64,
}

impl GlobalStats {
    pub(crate) fn add(&mut self, record: &ProjectRecord, stats: &ProjectStats) {
        self.total_projects += 1;
        match record.status {
            ProjectStatus::Active => self.active_projects += 1,
            ProjectStatus::Paused => self.paused_projects += 1,
            ProjectStatus::Error => self.error_projects += 1,
            ProjectStatus::Scanning => self.scanning_projects += 1,
        }
        if record.is_watching {
            self.watching_projects += 1;
        }
        self.total_files += stats.file_count;
        self.total_memory_usage = self.total_memory_usage.saturating_add(record.memory_usage);
        self.total_scans += stats.scan_count;
        self.total_changes += stats.change_count;
    }
}

/// Outcome of a project scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectScanResult {
    pub success: bool,
    pub file_count: usize,

    /// Scan duration in milliseconds.
    pub scan_time: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Notification broadcast to manager subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectEvent {
    Registered {
        project_id: String,
        root_path: PathBuf,
    },
    Unregistered {
        project_id: String,
    },
    StatusChanged {
        project_id: String,
        from: ProjectStatus,
        to: ProjectStatus,
    },
    ScanCompleted {
        project_id: String,
        result: ProjectScanResult,
    },
    FileChanged {
        project_id: String,
        path: PathBuf,
        kind: FileChangeKind,
        affected_files: Vec<PathBuf>,
    },
    Error {
        project_id: String,
        message: String,
    },
    WatchStarted {
        project_id: String,
    },
    WatchStopped {
        project_id: String,
    },
}

impl ProjectEvent {
    pub fn project_id(&self) -> &str {
        match self {
            ProjectEvent::Registered { project_id, .. }
            | ProjectEvent::Unregistered { project_id }
            | ProjectEvent::StatusChanged { project_id, .. }
            | ProjectEvent::ScanCompleted { project_id, .. }
            | ProjectEvent::FileChanged { project_id, .. }
            | ProjectEvent::Error { project_id, .. }
            | ProjectEvent::WatchStarted { project_id }
            | ProjectEvent::WatchStopped { project_id } => project_id,
        }
    }
}

/// Derive a project id from the root path, a timestamp and a sequence number.
pub(crate) fn derive_project_id(root: &std::path::Path, sequence: u64) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let digest = Sha256::digest(format!("{}:{nanos}:{sequence}", root.display()));
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}
