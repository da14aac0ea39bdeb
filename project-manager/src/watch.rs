//! Watcher seam.
//!
//! The manager never opens OS watch handles itself; it asks a
//! [`WatcherFactory`] for a [`WatchSubscription`] per project and consumes
//! the debounced messages it delivers.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sker_directory_watcher::{DirectoryWatcher, WatchConfig, WatchMessage, WatcherError};
use tokio::sync::mpsc;

/// Stops a running watch.
#[async_trait]
pub trait WatchHandle: Send {
    async fn stop(&mut self) -> Result<(), WatcherError>;
}

#[async_trait]
impl WatchHandle for DirectoryWatcher {
    async fn stop(&mut self) -> Result<(), WatcherError> {
        DirectoryWatcher::stop(self).await
    }
}

/// A started watch: its message stream plus the handle that ends it.
pub struct WatchSubscription {
    pub events: mpsc::Receiver<WatchMessage>,
    pub handle: Box<dyn WatchHandle>,
}

impl std::fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription").finish_non_exhaustive()
    }
}

/// Creates watches for project roots.
#[async_trait]
pub trait WatcherFactory: Send + Sync {
    async fn watch(&self, project_id: &str, root: &Path) -> Result<WatchSubscription, WatcherError>;
}

/// Factory backed by [`DirectoryWatcher`].
#[derive(Debug, Clone)]
pub struct NotifyWatcherFactory {
    debounce: Duration,
    channel_capacity: usize,
}

impl NotifyWatcherFactory {
    pub fn new(debounce: Duration, channel_capacity: usize) -> Self {
        Self {
            debounce,
            channel_capacity,
        }
    }
}

impl Default for NotifyWatcherFactory {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), 1000)
    }
}

#[async_trait]
impl WatcherFactory for NotifyWatcherFactory {
    async fn watch(&self, project_id: &str, root: &Path) -> Result<WatchSubscription, WatcherError> {
        let config = WatchConfig::new(root)
            .with_debounce(self.debounce)
            .with_channel_capacity(self.channel_capacity)
            .with_project_id(project_id);

        let mut watcher = DirectoryWatcher::new(config);
        let events = watcher.start().await?;

        Ok(WatchSubscription {
            events,
            handle: Box::new(watcher),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_notify_factory_missing_root() {
        let factory = NotifyWatcherFactory::default();
        let result = factory.watch("p", Path::new("/nonexistent/root/7")).await;
        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_notify_factory_start_and_stop() {
        let temp = TempDir::new().unwrap();
        let factory = NotifyWatcherFactory::new(Duration::from_millis(20), 16);

        let mut subscription = factory.watch("p", temp.path()).await.unwrap();
        subscription.handle.stop().await.unwrap();
    }
}
