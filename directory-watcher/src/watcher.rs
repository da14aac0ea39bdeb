//! Directory watcher implementation.

use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatcherError};
use crate::event::{EventBatch, FileChangeEvent, classify};

/// A message delivered to the consumer of a watcher.
#[derive(Debug, Clone)]
pub enum WatchMessage {
    /// A debounced change event.
    Change(FileChangeEvent),

    /// The underlying watch backend reported an error.
    Error(String),
}

type RawEvent = std::result::Result<notify::Event, notify::Error>;

/// Watches one project root and delivers debounced change events.
pub struct DirectoryWatcher {
    /// Configuration.
    config: WatchConfig,

    /// Internal notify watcher.
    watcher: Option<RecommendedWatcher>,

    /// Task batching raw events into change events.
    forwarder: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Create a new directory watcher.
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            watcher: None,
            forwarder: None,
        }
    }

    /// The watched root.
    pub fn root(&self) -> &PathBuf {
        &self.config.root
    }

    /// Start watching and return the receiving end of the event stream.
    pub async fn start(&mut self) -> Result<mpsc::Receiver<WatchMessage>> {
        let root = self.config.root.clone();

        if self.watcher.is_some() {
            return Err(WatcherError::AlreadyWatching(root));
        }

        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|_| WatcherError::DirectoryNotFound(root.clone()))?;
        if !metadata.is_dir() {
            return Err(WatcherError::NotADirectory(root));
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<RawEvent>();
        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity);

        let mut watcher = notify::recommended_watcher(move |res: RawEvent| {
            // The receiver only disappears once the forwarder is gone.
            let _ = raw_tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        self.forwarder = Some(tokio::spawn(forward_events(
            self.config.clone(),
            raw_rx,
            event_tx,
        )));
        self.watcher = Some(watcher);

        info!("Started watching: {}", root.display());
        Ok(event_rx)
    }

    /// Stop watching.
    pub async fn stop(&mut self) -> Result<()> {
        let root = &self.config.root;

        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(root) {
                // The root may already be gone; the watch is dropped either way.
                debug!("Unwatch failed for {}: {e}", root.display());
            }
        }

        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
            if let Err(e) = forwarder.await {
                if !e.is_cancelled() {
                    warn!("Event forwarder for {} ended abnormally: {e}", root.display());
                    return Err(WatcherError::Forwarder(e.to_string()));
                }
            }
        }

        info!("Stopped watching: {}", root.display());
        Ok(())
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

/// Batch raw notify events over the debounce window and forward them.
async fn forward_events(
    config: WatchConfig,
    mut raw_rx: mpsc::UnboundedReceiver<RawEvent>,
    event_tx: mpsc::Sender<WatchMessage>,
) {
    while let Some(first) = raw_rx.recv().await {
        let mut batch = EventBatch::new();
        if !absorb(&config, first, &mut batch, &event_tx).await {
            return;
        }

        let deadline = Instant::now() + config.debounce;
        loop {
            match tokio::time::timeout_at(deadline, raw_rx.recv()).await {
                Ok(Some(raw)) => {
                    if !absorb(&config, raw, &mut batch, &event_tx).await {
                        return;
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }

        batch.deduplicate();
        debug!("Forwarding {} debounced events", batch.len());

        for event in batch.drain() {
            if event_tx.send(WatchMessage::Change(event)).await.is_err() {
                debug!("Event receiver dropped; stopping forwarder");
                return;
            }
        }
    }
}

/// Fold one raw event into the batch. Returns false once the consumer is gone.
async fn absorb(
    config: &WatchConfig,
    raw: RawEvent,
    batch: &mut EventBatch,
    event_tx: &mpsc::Sender<WatchMessage>,
) -> bool {
    match raw {
        Ok(event) => {
            for change in classify(&event) {
                if config.should_exclude(&change.path) {
                    continue;
                }
                let change = match &config.project_id {
                    Some(id) => change.with_project_id(id.clone()),
                    None => change,
                };
                batch.push(change);
            }
            true
        }
        Err(e) => {
            error!("Watch error under {}: {e}", config.root.display());
            event_tx.send(WatchMessage::Error(e.to_string())).await.is_ok()
        }
    }
}
