// SPDX-License-Identifier: MIT OR Apache-2.0

//! File system watcher for a document directory.
//!
//! This module provides a watcher that monitors a `<root>/<group>/<data_id>` tree
//! and reports the key of every document whose file is modified.

use crate::domain::{ConfigError, DocumentKey, Result};
use crate::ports::{ChangeCallback, ConfigWatcher};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// File system watcher for a document directory.
///
/// Events are debounced per document so that editors writing a file in several
/// steps trigger a single callback.
///
/// # Examples
///
/// ```rust,no_run
/// use nacos_binder::adapters::DocumentDirWatcher;
/// use nacos_binder::ports::ConfigWatcher;
/// use std::sync::Arc;
///
/// # fn main() -> nacos_binder::domain::Result<()> {
/// let mut watcher = DocumentDirWatcher::new("/etc/myapp/config", None)?;
///
/// watcher.watch(Arc::new(|document| {
///     println!("Document changed: {}", document);
/// }))?;
///
/// // Later, stop watching
/// watcher.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DocumentDirWatcher {
    /// Root of the document tree
    root: PathBuf,
    /// Debounce delay (default 500ms)
    debounce_delay: Duration,
    /// Internal watcher
    watcher: Option<RecommendedWatcher>,
    /// Thread handle for the event loop
    watch_thread: Option<JoinHandle<()>>,
    /// Stop signal sender
    stop_tx: Option<Sender<()>>,
}

impl DocumentDirWatcher {
    /// Creates a new watcher for the directory at `root`.
    pub fn new(root: impl AsRef<Path>, debounce_delay: Option<Duration>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(ConfigError::WatcherError {
                message: format!("Directory does not exist: {}", root.display()),
                source: None,
            });
        }

        Ok(Self {
            root,
            debounce_delay: debounce_delay.unwrap_or(Duration::from_millis(500)),
            watcher: None,
            watch_thread: None,
            stop_tx: None,
        })
    }

    /// Returns the debounce delay.
    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    fn document_for(root: &Path, path: &Path) -> Option<DocumentKey> {
        let mut components = path.strip_prefix(root).ok()?.components();
        match (components.next(), components.next(), components.next()) {
            (Some(Component::Normal(group)), Some(Component::Normal(data_id)), None) => Some(
                DocumentKey::new(data_id.to_string_lossy(), group.to_string_lossy()),
            ),
            _ => None,
        }
    }
}

impl ConfigWatcher for DocumentDirWatcher {
    fn watch(&mut self, callback: ChangeCallback) -> Result<()> {
        if self.watcher.is_some() {
            return Err(ConfigError::WatcherError {
                message: "Watcher is already running".to_string(),
                source: None,
            });
        }

        let (event_tx, event_rx) = channel::<notify::Result<Event>>();
        let (stop_tx, stop_rx) = channel::<()>();

        let mut watcher =
            RecommendedWatcher::new(event_tx, notify::Config::default()).map_err(|e| {
                ConfigError::WatcherError {
                    message: format!("Failed to create file watcher: {}", e),
                    source: Some(Box::new(e)),
                }
            })?;

        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| ConfigError::WatcherError {
                message: format!("Failed to start watching: {}", e),
                source: Some(Box::new(e)),
            })?;

        self.watcher = Some(watcher);
        self.stop_tx = Some(stop_tx);

        // Event paths are absolute; compare against the canonical root.
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let debounce_delay = self.debounce_delay;

        let watch_thread = thread::spawn(move || {
            let mut last_event_time: HashMap<DocumentKey, Instant> = HashMap::new();

            loop {
                if stop_rx.try_recv().is_ok() {
                    break;
                }

                let event = match event_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(Ok(event)) => event,
                    Ok(Err(e)) => {
                        tracing::warn!("File watcher error: {}", e);
                        continue;
                    }
                    Err(_) => continue,
                };

                if matches!(event.kind, EventKind::Access(_)) {
                    continue;
                }

                for path in &event.paths {
                    let Some(document) = Self::document_for(&root, path) else {
                        continue;
                    };

                    let now = Instant::now();
                    let should_trigger = last_event_time
                        .get(&document)
                        .map(|last| now.duration_since(*last) >= debounce_delay)
                        .unwrap_or(true);

                    if should_trigger {
                        last_event_time.insert(document.clone(), now);
                        tracing::debug!("Detected change of {}", document);
                        callback(document);
                    }
                }
            }
        });

        self.watch_thread = Some(watch_thread);

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.watch_thread.take() {
            handle.join().map_err(|_| ConfigError::WatcherError {
                message: "Failed to join watcher thread".to_string(),
                source: None,
            })?;
        }

        self.watcher = None;

        Ok(())
    }
}

impl Drop for DocumentDirWatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
