//! Multi-project registry.
//!
//! The `ProjectManager` owns one [`ContextBuilder`] and at most one watch per
//! registered project. Projects share nothing: each has its own builder
//! behind its own mutex, so rescans and incremental updates of one project
//! are serialized while different projects proceed independently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use sker_context_index::{
    ContextBuilder, ContextError, FileChangeEvent, FileChangeResult, load_project_config,
};
use sker_directory_watcher::WatchMessage;
use tokio::sync::{Mutex, RwLock, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ManagerConfig;
use crate::error::{ProjectError, Result};
use crate::project::{
    GlobalStats, ProjectEvent, ProjectRecord, ProjectScanResult, ProjectStats, ProjectStatus,
    derive_project_id,
};
use crate::watch::{NotifyWatcherFactory, WatchHandle, WatcherFactory};

struct ProjectState {
    record: ProjectRecord,
    stats: ProjectStats,
}

struct ActiveWatch {
    handle: Box<dyn WatchHandle>,
    stop_tx: oneshot::Sender<()>,
    forwarder: JoinHandle<()>,
}

struct Project {
    id: String,
    root: PathBuf,
    state: RwLock<ProjectState>,

    /// Held for the whole of a rescan or an incremental update.
    builder: Mutex<ContextBuilder>,

    watch: Mutex<Option<ActiveWatch>>,
}

struct Inner {
    config: ManagerConfig,

    /// Lock order: `projects` before `paths`.
    projects: RwLock<HashMap<String, Arc<Project>>>,
    paths: RwLock<HashMap<PathBuf, String>>,

    watcher_factory: Arc<dyn WatcherFactory>,
    events: broadcast::Sender<ProjectEvent>,
    shut_down: AtomicBool,
    id_sequence: AtomicU64,
}

/// Registry of indexed projects.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone)]
pub struct ProjectManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ProjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectManager")
            .field("config", &self.inner.config)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl ProjectManager {
    /// Create a manager that watches projects with notify.
    pub fn new(config: ManagerConfig) -> Self {
        let factory = NotifyWatcherFactory::new(config.debounce(), config.event_channel_capacity);
        Self::with_watcher_factory(config, Arc::new(factory))
    }

    /// Create a manager with a custom watcher factory.
    pub fn with_watcher_factory(config: ManagerConfig, factory: Arc<dyn WatcherFactory>) -> Self {
        let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                config,
                projects: RwLock::new(HashMap::new()),
                paths: RwLock::new(HashMap::new()),
                watcher_factory: factory,
                events,
                shut_down: AtomicBool::new(false),
                id_sequence: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Subscribe to project events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Register a project rooted at `root`.
    ///
    /// Checks, in order: the directory exists, it is not registered yet, the
    /// project limit is not reached, and a readable project config exists at
    /// the root. Nothing is registered when a check fails.
    pub async fn register_project(&self, root: impl AsRef<Path>) -> Result<ProjectRecord> {
        self.ensure_running()?;
        let root = root.as_ref();

        let is_dir = tokio::fs::metadata(root).await.is_ok_and(|m| m.is_dir());
        if !is_dir {
            return Err(ProjectError::DirectoryNotFound(root.to_path_buf()));
        }
        let root = tokio::fs::canonicalize(root).await?;

        if self.inner.paths.read().await.contains_key(&root) {
            return Err(ProjectError::DuplicateProject(root));
        }
        let max = self.inner.config.max_projects;
        if self.inner.projects.read().await.len() >= max {
            return Err(ProjectError::ProjectLimitExceeded(max));
        }

        let config_path = root.join(&self.inner.config.builder.project_config_file);
        let has_config = tokio::fs::metadata(&config_path)
            .await
            .is_ok_and(|m| m.is_file());
        if !has_config {
            return Err(ProjectError::ConfigMissing(config_path));
        }
        let info = load_project_config(&config_path)
            .await
            .map_err(|e| match e {
                ContextError::ConfigInvalid { path, message } => {
                    ProjectError::ConfigInvalid { path, message }
                }
                other => other.into(),
            })?;

        let sequence = self.inner.id_sequence.fetch_add(1, Ordering::Relaxed);
        let id = derive_project_id(&root, sequence);
        let record = ProjectRecord::new(
            id.clone(),
            root.clone(),
            info,
            self.inner.config.default_memory_limit,
        );
        let project = Arc::new(Project {
            id: id.clone(),
            root: root.clone(),
            state: RwLock::new(ProjectState {
                record: record.clone(),
                stats: ProjectStats::zeroed(&id),
            }),
            builder: Mutex::new(ContextBuilder::new(self.inner.config.builder.clone())),
            watch: Mutex::new(None),
        });

        {
            let mut projects = self.inner.projects.write().await;
            let mut paths = self.inner.paths.write().await;

            self.ensure_running()?;
            if paths.contains_key(&root) {
                return Err(ProjectError::DuplicateProject(root));
            }
            if projects.len() >= max {
                return Err(ProjectError::ProjectLimitExceeded(max));
            }
            projects.insert(id.clone(), project);
            paths.insert(root.clone(), id.clone());
        }

        info!("Registered project {} ({id}) at {}", record.info.name, root.display());
        self.emit(ProjectEvent::Registered {
            project_id: id,
            root_path: root,
        });
        Ok(record)
    }

    /// Remove a project and release its watcher and index.
    ///
    /// Unknown ids are ignored.
    pub async fn unregister_project(&self, id: &str) -> Result<()> {
        let project = {
            let mut projects = self.inner.projects.write().await;
            let mut paths = self.inner.paths.write().await;
            let Some(project) = projects.remove(id) else {
                debug!("Unregister of unknown project {id} ignored");
                return Ok(());
            };
            paths.remove(&project.root);
            project
        };

        if let Err(e) = self.release_watch(&project).await {
            warn!("Watcher of project {id} did not stop cleanly: {e}");
        }
        project.builder.lock().await.clear();

        info!("Unregistered project {id}");
        self.emit(ProjectEvent::Unregistered {
            project_id: id.to_string(),
        });
        Ok(())
    }

    /// ACTIVE → PAUSED. Stops the project's watcher.
    pub async fn pause_project(&self, id: &str) -> Result<()> {
        let project = self.project(id).await?;
        self.transition(&project, &[ProjectStatus::Active], ProjectStatus::Paused, "pause")
            .await?;

        if let Err(e) = self.release_watch(&project).await {
            warn!("Watcher of project {id} did not stop cleanly: {e}");
        }
        Ok(())
    }

    /// PAUSED or ERROR → ACTIVE. Clears the last error.
    ///
    /// Fails with `DirectoryNotFound` if the root has disappeared.
    pub async fn resume_project(&self, id: &str) -> Result<()> {
        let project = self.project(id).await?;
        let resumable = [ProjectStatus::Paused, ProjectStatus::Error];

        let status = project.state.read().await.record.status;
        if !resumable.contains(&status) {
            return Err(ProjectError::InvalidTransition {
                id: id.to_string(),
                status,
                action: "resume",
            });
        }

        let exists = tokio::fs::metadata(&project.root)
            .await
            .is_ok_and(|m| m.is_dir());
        if !exists {
            return Err(ProjectError::DirectoryNotFound(project.root.clone()));
        }

        self.transition(&project, &resumable, ProjectStatus::Active, "resume")
            .await?;
        project.state.write().await.record.last_error = None;
        Ok(())
    }

    /// Rescan an ACTIVE project with the configured filter policy.
    ///
    /// Scan failures do not surface as `Err`: they are reported in the
    /// result and move the project to ERROR.
    pub async fn scan_project(&self, id: &str) -> Result<ProjectScanResult> {
        let project = self.project(id).await?;
        self.transition(&project, &[ProjectStatus::Active], ProjectStatus::Scanning, "scan")
            .await?;

        let started = Instant::now();
        let outcome = {
            let mut builder = project.builder.lock().await;
            match builder
                .build_from_directory(&project.root, self.inner.config.scan_options.clone())
                .await
            {
                Ok(_) => Ok(count_files(&builder)),
                Err(e) => Err(e),
            }
        };
        let scan_time = millis(started.elapsed());

        let result = match outcome {
            Ok(file_count) => {
                let memory_usage = self.inner.config.estimate_memory(file_count);
                let (previous, memory_limit) = {
                    let mut state = project.state.write().await;
                    let previous = state.record.status;
                    if previous == ProjectStatus::Scanning {
                        state.record.status = ProjectStatus::Active;
                    }
                    state.record.last_scan_at = Some(Utc::now());
                    state.record.memory_usage = memory_usage;
                    state.record.touch();
                    state.stats.file_count = file_count;
                    state.stats.memory_usage = memory_usage;
                    state.stats.last_scan_time = Some(scan_time);
                    state.stats.scan_count += 1;
                    (previous, state.record.memory_limit)
                };

                if previous == ProjectStatus::Scanning {
                    self.emit(ProjectEvent::StatusChanged {
                        project_id: id.to_string(),
                        from: ProjectStatus::Scanning,
                        to: ProjectStatus::Active,
                    });
                }
                if memory_usage > memory_limit {
                    warn!(
                        "Project {id} estimated at {memory_usage} bytes, over its {memory_limit} byte limit"
                    );
                }
                info!("Scanned project {id}: {file_count} files in {scan_time}ms");

                ProjectScanResult {
                    success: true,
                    file_count,
                    scan_time,
                    error: None,
                }
            }
            Err(e) => {
                let message = e.to_string();
                self.mark_project_error(id, message.clone()).await?;
                ProjectScanResult {
                    success: false,
                    file_count: 0,
                    scan_time,
                    error: Some(message),
                }
            }
        };

        self.emit(ProjectEvent::ScanCompleted {
            project_id: id.to_string(),
            result: result.clone(),
        });
        Ok(result)
    }

    /// Move a project to ERROR from any status.
    pub async fn mark_project_error(&self, id: &str, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        let project = self.project(id).await?;

        let from = {
            let mut state = project.state.write().await;
            let from = state.record.status;
            state.record.status = ProjectStatus::Error;
            state.record.last_error = Some(message.clone());
            state.record.touch();
            from
        };

        error!("Project {id} failed: {message}");
        if from != ProjectStatus::Error {
            self.emit(ProjectEvent::StatusChanged {
                project_id: id.to_string(),
                from,
                to: ProjectStatus::Error,
            });
        }
        self.emit(ProjectEvent::Error {
            project_id: id.to_string(),
            message,
        });
        Ok(())
    }

    /// Attach a watcher whose events feed the project's incremental updates.
    ///
    /// No-op when already watching. A watcher that fails to start marks the
    /// project as ERROR and emits an error event; it is not returned as
    /// `Err`.
    pub async fn start_watching(&self, id: &str) -> Result<()> {
        let project = self.project(id).await?;

        let status = project.state.read().await.record.status;
        if status == ProjectStatus::Paused {
            return Err(ProjectError::InvalidTransition {
                id: id.to_string(),
                status,
                action: "watch",
            });
        }

        let mut watch = project.watch.lock().await;
        if watch.is_some() {
            return Ok(());
        }

        let subscription = match self.inner.watcher_factory.watch(id, &project.root).await {
            Ok(subscription) => subscription,
            Err(e) => {
                drop(watch);
                warn!("Watcher for project {id} failed to start: {e}");
                self.mark_project_error(id, e.to_string()).await?;
                return Ok(());
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let forwarder = tokio::spawn(forward_watch_messages(
            Arc::downgrade(&self.inner),
            id.to_string(),
            subscription.events,
            stop_rx,
        ));
        *watch = Some(ActiveWatch {
            handle: subscription.handle,
            stop_tx,
            forwarder,
        });
        drop(watch);

        {
            let mut state = project.state.write().await;
            state.record.is_watching = true;
            state.record.touch();
        }

        info!("Watching project {id} at {}", project.root.display());
        self.emit(ProjectEvent::WatchStarted {
            project_id: id.to_string(),
        });
        Ok(())
    }

    /// Detach the project's watcher, if any.
    pub async fn stop_watching(&self, id: &str) -> Result<()> {
        let project = self.project(id).await?;
        self.release_watch(&project).await?;
        Ok(())
    }

    /// Apply a change event to a project's index.
    ///
    /// This is the path watcher events take; manual notification sources can
    /// call it directly. Rejected while the project is paused.
    pub async fn handle_file_change(
        &self,
        id: &str,
        event: FileChangeEvent,
    ) -> Result<FileChangeResult> {
        let project = self.project(id).await?;

        let status = project.state.read().await.record.status;
        if status == ProjectStatus::Paused {
            return Err(ProjectError::InvalidTransition {
                id: id.to_string(),
                status,
                action: "apply changes to",
            });
        }

        let result = {
            let mut builder = project.builder.lock().await;
            builder.handle_file_change(&event).await
        };

        {
            let mut state = project.state.write().await;
            state.stats.change_count += 1;
            state.record.touch();
        }

        self.emit(ProjectEvent::FileChanged {
            project_id: id.to_string(),
            path: event.path,
            kind: event.kind,
            affected_files: result.affected_files.clone(),
        });
        Ok(result)
    }

    /// Release the watcher and index state but keep the project registered.
    pub async fn cleanup_project(&self, id: &str) -> Result<()> {
        let project = self.project(id).await?;

        if let Err(e) = self.release_watch(&project).await {
            warn!("Watcher of project {id} did not stop cleanly: {e}");
        }
        project.builder.lock().await.clear();

        {
            let mut state = project.state.write().await;
            state.stats = ProjectStats::zeroed(id);
            state.record.memory_usage = 0;
            state.record.touch();
        }

        info!("Cleaned up project {id}");
        Ok(())
    }

    pub async fn get_project(&self, id: &str) -> Option<ProjectRecord> {
        let project = self.project(id).await.ok()?;
        let state = project.state.read().await;
        Some(state.record.clone())
    }

    /// All projects, oldest registration first.
    pub async fn list_projects(&self) -> Vec<ProjectRecord> {
        let mut records = Vec::new();
        for project in self.all_projects().await {
            records.push(project.state.read().await.record.clone());
        }
        records.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// The project whose root contains `path`, preferring the deepest root.
    pub async fn find_project_by_path(&self, path: &Path) -> Option<ProjectRecord> {
        let path = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());

        let id = {
            let paths = self.inner.paths.read().await;
            paths
                .iter()
                .filter(|(root, _)| path.starts_with(root))
                .max_by_key(|(root, _)| root.components().count())
                .map(|(_, id)| id.clone())?
        };
        self.get_project(&id).await
    }

    pub async fn get_project_stats(&self, id: &str) -> Option<ProjectStats> {
        let project = self.project(id).await.ok()?;
        let state = project.state.read().await;
        Some(ProjectStats {
            status: Some(state.record.status),
            memory_usage: state.record.memory_usage,
            ..state.stats.clone()
        })
    }

    pub async fn get_global_stats(&self) -> GlobalStats {
        let mut global = GlobalStats::default();
        for project in self.all_projects().await {
            let state = project.state.read().await;
            global.add(&state.record, &state.stats);
        }
        global
    }

    pub async fn project_count(&self) -> usize {
        self.inner.projects.read().await.len()
    }

    /// Run `f` against a project's builder while holding its lock.
    pub async fn with_context<R>(
        &self,
        id: &str,
        f: impl FnOnce(&ContextBuilder) -> R,
    ) -> Result<R> {
        let project = self.project(id).await?;
        let builder = project.builder.lock().await;
        Ok(f(&*builder))
    }

    /// Files importing `path` within a project, directly or transitively.
    pub async fn get_affected_files(&self, id: &str, path: &Path) -> Result<Vec<PathBuf>> {
        self.with_context(id, |builder| builder.get_affected_files(path))
            .await
    }

    /// Stop every watcher and drop all projects.
    ///
    /// Watchers are stopped concurrently. If any fails to stop, the error is
    /// returned and project state is left in place; `force_cleanup` tears
    /// down regardless. New registrations are refused either way.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.shut_down.store(true, Ordering::SeqCst);

        let projects = self.all_projects().await;
        let results = join_all(projects.iter().map(|p| self.release_watch(p))).await;
        if let Some(e) = results.into_iter().find_map(std::result::Result::err) {
            error!("Shutdown aborted: {e}");
            return Err(e);
        }

        self.clear_all().await;
        info!("Project manager shut down");
        Ok(())
    }

    /// Stop every watcher, ignoring failures, and drop all projects.
    pub async fn force_cleanup(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);

        let projects = self.all_projects().await;
        let results = join_all(projects.iter().map(|p| self.release_watch(p))).await;
        for e in results.into_iter().filter_map(std::result::Result::err) {
            warn!("Ignoring watcher stop failure during cleanup: {e}");
        }

        self.clear_all().await;
        info!("Project manager force-cleaned");
    }

    async fn clear_all(&self) {
        let drained: Vec<Arc<Project>> = {
            let mut projects = self.inner.projects.write().await;
            let mut paths = self.inner.paths.write().await;
            paths.clear();
            projects.drain().map(|(_, project)| project).collect()
        };

        for project in drained {
            project.builder.lock().await.clear();
            self.emit(ProjectEvent::Unregistered {
                project_id: project.id.clone(),
            });
        }
    }

    /// Stop and detach a project's watch. Returns whether one was running.
    async fn release_watch(&self, project: &Project) -> Result<bool> {
        let Some(active) = project.watch.lock().await.take() else {
            return Ok(false);
        };
        let ActiveWatch {
            mut handle,
            stop_tx,
            forwarder,
        } = active;

        // The forwarder may already be gone.
        let _ = stop_tx.send(());
        let stopped = handle.stop().await;
        if let Err(e) = forwarder.await {
            warn!("Watch forwarder of project {} ended abnormally: {e}", project.id);
        }

        {
            let mut state = project.state.write().await;
            state.record.is_watching = false;
            state.record.touch();
        }
        self.emit(ProjectEvent::WatchStopped {
            project_id: project.id.clone(),
        });

        stopped.map_err(|e| ProjectError::WatchFailure {
            id: project.id.clone(),
            message: e.to_string(),
        })?;
        info!("Stopped watching project {}", project.id);
        Ok(true)
    }

    /// Check-and-set a project's status, emitting the change.
    async fn transition(
        &self,
        project: &Project,
        allowed: &[ProjectStatus],
        to: ProjectStatus,
        action: &'static str,
    ) -> Result<()> {
        let from = {
            let mut state = project.state.write().await;
            let from = state.record.status;
            if !allowed.contains(&from) {
                return Err(ProjectError::InvalidTransition {
                    id: project.id.clone(),
                    status: from,
                    action,
                });
            }
            state.record.status = to;
            state.record.touch();
            from
        };

        debug!("Project {}: {from} -> {to}", project.id);
        if from != to {
            self.emit(ProjectEvent::StatusChanged {
                project_id: project.id.clone(),
                from,
                to,
            });
        }
        Ok(())
    }

    async fn project(&self, id: &str) -> Result<Arc<Project>> {
        self.inner
            .projects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ProjectError::ProjectNotFound(id.to_string()))
    }

    async fn all_projects(&self) -> Vec<Arc<Project>> {
        self.inner.projects.read().await.values().cloned().collect()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(ProjectError::ShutDown);
        }
        Ok(())
    }

    fn emit(&self, event: ProjectEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

/// Feed watcher messages into the manager until stopped.
async fn forward_watch_messages(
    inner: Weak<Inner>,
    project_id: String,
    mut events: mpsc::Receiver<WatchMessage>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let message = tokio::select! {
            _ = &mut stop_rx => break,
            message = events.recv() => message,
        };
        let Some(message) = message else {
            debug!("Watch stream of project {project_id} ended");
            break;
        };
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let manager = ProjectManager { inner };

        match message {
            WatchMessage::Change(event) => {
                if let Err(e) = manager.handle_file_change(&project_id, event).await {
                    debug!("Dropped change for project {project_id}: {e}");
                }
            }
            WatchMessage::Error(message) => {
                if let Err(e) = manager.mark_project_error(&project_id, message).await {
                    debug!("Could not record watch error for project {project_id}: {e}");
                }
            }
        }
    }
}

/// Files in a built index, counted by walking the tree from its root.
fn count_files(builder: &ContextBuilder) -> usize {
    builder
        .tree()
        .map(|tree| tree.all_files(tree.root_path()).len())
        .unwrap_or_default()
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn project_dir(name: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join(name);
        tokio::fs::create_dir_all(&root).await.unwrap();
        tokio::fs::write(root.join("sker.json"), format!("{{ name: '{name}' }}"))
            .await
            .unwrap();
        (temp, root)
    }

    #[tokio::test]
    async fn test_register_uses_config_name_and_canonical_root() {
        let (_temp, root) = project_dir("alpha").await;
        let manager = ProjectManager::new(ManagerConfig::default());

        let record = manager.register_project(&root).await.unwrap();

        assert_eq!(record.info.name, "alpha");
        assert_eq!(record.status, ProjectStatus::Active);
        assert_eq!(record.root_path, tokio::fs::canonicalize(&root).await.unwrap());
        assert!(!record.is_watching);
        assert_eq!(manager.project_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_registration() {
        let temp = TempDir::new().unwrap();
        tokio::fs::write(temp.path().join("sker.json"), "{ broken")
            .await
            .unwrap();
        let manager = ProjectManager::new(ManagerConfig::default());

        let err = manager.register_project(temp.path()).await.unwrap_err();
        assert!(matches!(err, ProjectError::ConfigInvalid { .. }));
        assert_eq!(manager.project_count().await, 0);
    }

    #[tokio::test]
    async fn test_transition_rules() {
        let (_temp, root) = project_dir("beta").await;
        let manager = ProjectManager::new(ManagerConfig::default());
        let id = manager.register_project(&root).await.unwrap().id;

        assert!(matches!(
            manager.resume_project(&id).await,
            Err(ProjectError::InvalidTransition { action: "resume", .. })
        ));

        manager.pause_project(&id).await.unwrap();
        assert!(matches!(
            manager.pause_project(&id).await,
            Err(ProjectError::InvalidTransition { .. })
        ));
        assert!(matches!(
            manager.scan_project(&id).await,
            Err(ProjectError::InvalidTransition { .. })
        ));

        manager.resume_project(&id).await.unwrap();
        manager.mark_project_error(&id, "boom").await.unwrap();
        let record = manager.get_project(&id).await.unwrap();
        assert_eq!(record.status, ProjectStatus::Error);
        assert_eq!(record.last_error.as_deref(), Some("boom"));

        manager.resume_project(&id).await.unwrap();
        let record = manager.get_project(&id).await.unwrap();
        assert_eq!(record.status, ProjectStatus::Active);
        assert!(record.last_error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let manager = ProjectManager::new(ManagerConfig::default());
        assert!(matches!(
            manager.scan_project("nope").await,
            Err(ProjectError::ProjectNotFound(_))
        ));
        assert!(manager.get_project("nope").await.is_none());
        manager.unregister_project("nope").await.unwrap();
    }
}
