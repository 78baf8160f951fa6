// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory-backed config client.
//!
//! Documents are plain files laid out as `<root>/<group>/<data_id>`. Changes are
//! picked up by [`FileConfigClient::poll_changes`], or, with the `reload` feature,
//! by a filesystem watcher started with [`FileConfigClient::start_watching`].

use crate::domain::{ConfigError, DocumentKey, Result};
use crate::ports::{ConfigClient, ConfigListener};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Maximum allowed size of a document file (10MB).
const MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024;

const SOURCE_NAME: &str = "file";

#[derive(Default)]
struct Subscription {
    listeners: RwLock<Vec<Arc<dyn ConfigListener>>>,
    // Content last pushed to the listeners; `dispatch` also serializes pushes.
    dispatch: Mutex<Option<String>>,
}

/// A config client reading documents from a directory tree.
///
/// # Examples
///
/// ```rust,no_run
/// use nacos_binder::adapters::FileConfigClient;
/// use nacos_binder::domain::DocumentKey;
/// use nacos_binder::ports::ConfigClient;
/// use std::time::Duration;
///
/// # fn main() -> nacos_binder::domain::Result<()> {
/// let client = FileConfigClient::new("/etc/myapp/config")?;
///
/// // reads /etc/myapp/config/DEFAULT_GROUP/app.properties
/// let content = client.get_config(
///     &DocumentKey::new("app.properties", "DEFAULT_GROUP"),
///     Duration::from_secs(5),
/// )?;
/// # Ok(())
/// # }
/// ```
pub struct FileConfigClient {
    root: PathBuf,
    subscriptions: DashMap<DocumentKey, Arc<Subscription>>,
}

impl FileConfigClient {
    /// Creates a client rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|e| ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!("Invalid or inaccessible root: {}", root.as_ref().display()),
                source: Some(Box::new(e)),
            })?;

        if !root.is_dir() {
            return Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!("Root is not a directory: {}", root.display()),
                source: None,
            });
        }

        Ok(FileConfigClient {
            root,
            subscriptions: DashMap::new(),
        })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `document`.
    ///
    /// Keys that would escape the root (`..`, absolute paths, separators) are
    /// rejected.
    pub fn document_path(&self, document: &DocumentKey) -> Result<PathBuf> {
        for part in [document.group(), document.data_id()] {
            let mut components = Path::new(part).components();
            let single_normal = matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none();
            if !single_normal {
                return Err(ConfigError::SourceError {
                    source_name: SOURCE_NAME.to_string(),
                    message: format!("Illegal path segment '{}' in {}", part, document),
                    source: None,
                });
            }
        }
        Ok(self.root.join(document.group()).join(document.data_id()))
    }

    /// Maps a path under the root back to its document, if it is one.
    pub fn document_for_path(&self, path: &Path) -> Option<DocumentKey> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut components = relative.components();
        match (components.next(), components.next(), components.next()) {
            (Some(Component::Normal(group)), Some(Component::Normal(data_id)), None) => Some(
                DocumentKey::new(data_id.to_string_lossy(), group.to_string_lossy()),
            ),
            _ => None,
        }
    }

    fn read_document(&self, document: &DocumentKey) -> Result<Option<String>> {
        let path = self.document_path(document)?;

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::SourceError {
                    source_name: SOURCE_NAME.to_string(),
                    message: format!("Failed to read metadata of {}", document),
                    source: Some(Box::new(e)),
                })
            }
        };

        if metadata.len() > MAX_DOCUMENT_SIZE {
            return Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "Document too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_DOCUMENT_SIZE
                ),
                source: None,
            });
        }

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!("Failed to read {}", document),
                source: Some(Box::new(e)),
            }),
        }
    }

    /// Re-reads one subscribed document and pushes it if it changed.
    ///
    /// Returns `true` if listeners were notified. A removed document is pushed as
    /// empty content.
    pub fn refresh_document(&self, document: &DocumentKey) -> Result<bool> {
        let Some(subscription) = self.subscriptions.get(document).map(|s| s.value().clone())
        else {
            return Ok(false);
        };

        let mut last_pushed = subscription.dispatch.lock();
        let current = self.read_document(document)?;
        if *last_pushed == current {
            return Ok(false);
        }

        let content = current.clone().unwrap_or_default();
        let listeners = subscription.listeners.read().clone();
        let mut first_failure = None;
        for listener in &listeners {
            if let Err(e) = listener.receive_config_info(&content) {
                tracing::warn!(
                    "Listener {} failed to handle {}: {}",
                    listener.describe(),
                    document,
                    e
                );
                first_failure.get_or_insert(e);
            }
        }
        *last_pushed = current;

        match first_failure {
            None => {
                tracing::debug!("Pushed {} to {} listener(s)", document, listeners.len());
                Ok(true)
            }
            Some(e) => Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!("Listener failure while pushing {}", document),
                source: Some(Box::new(e)),
            }),
        }
    }

    /// Re-reads every subscribed document and pushes the ones that changed.
    ///
    /// Returns the number of documents pushed. All documents are checked even if
    /// one fails; the first failure is returned afterwards.
    pub fn poll_changes(&self) -> Result<usize> {
        let documents: Vec<DocumentKey> =
            self.subscriptions.iter().map(|e| e.key().clone()).collect();

        let mut pushed = 0;
        let mut first_failure = None;
        for document in documents {
            match self.refresh_document(&document) {
                Ok(true) => pushed += 1,
                Ok(false) => {}
                Err(e) => {
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            None => Ok(pushed),
            Some(e) => Err(e),
        }
    }

    /// Watches the root directory and pushes documents as their files change.
    ///
    /// The returned watcher stops when dropped.
    #[cfg(feature = "reload")]
    pub fn start_watching(
        self: &Arc<Self>,
        debounce_delay: Option<Duration>,
    ) -> Result<crate::adapters::DocumentDirWatcher> {
        use crate::ports::ConfigWatcher;

        let mut watcher = crate::adapters::DocumentDirWatcher::new(&self.root, debounce_delay)?;
        let client = Arc::downgrade(self);
        watcher.watch(Arc::new(move |document: DocumentKey| {
            if let Some(client) = client.upgrade() {
                if let Err(e) = client.refresh_document(&document) {
                    tracing::error!("Failed to push {}: {}", document, e);
                }
            }
        }))?;
        Ok(watcher)
    }
}

impl ConfigClient for FileConfigClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn get_config(&self, document: &DocumentKey, _timeout: Duration) -> Result<Option<String>> {
        self.read_document(document)
    }

    fn add_listener(&self, document: &DocumentKey, listener: Arc<dyn ConfigListener>) -> Result<()> {
        // Seed the baseline so only later edits are pushed.
        let current = self.read_document(document)?;
        let subscription = self
            .subscriptions
            .entry(document.clone())
            .or_insert_with(|| {
                Arc::new(Subscription {
                    listeners: RwLock::new(Vec::new()),
                    dispatch: Mutex::new(current),
                })
            })
            .value()
            .clone();
        subscription.listeners.write().push(listener);
        tracing::debug!("Subscribed to {}", document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ConfigListener for Recorder {
        fn receive_config_info(&self, content: &str) -> Result<()> {
            self.0.lock().push(content.to_string());
            Ok(())
        }
    }

    fn write_doc(dir: &TempDir, group: &str, data_id: &str, content: &str) {
        let group_dir = dir.path().join(group);
        fs::create_dir_all(&group_dir).unwrap();
        fs::write(group_dir.join(data_id), content).unwrap();
    }

    #[test]
    fn test_get_config_reads_group_directory() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "DEFAULT_GROUP", "app.properties", "timeout=30");
        let client = FileConfigClient::new(dir.path()).unwrap();

        let content = client
            .get_config(
                &DocumentKey::new("app.properties", "DEFAULT_GROUP"),
                Duration::from_secs(1),
            )
            .unwrap();
        assert_eq!(content.as_deref(), Some("timeout=30"));
    }

    #[test]
    fn test_missing_document_is_none() {
        let dir = TempDir::new().unwrap();
        let client = FileConfigClient::new(dir.path()).unwrap();
        let content = client
            .get_config(&DocumentKey::new("nope", "G"), Duration::from_secs(1))
            .unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn test_unreadable_document_is_source_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("G").join("app.properties")).unwrap();
        let client = FileConfigClient::new(dir.path()).unwrap();

        match client.get_config(&DocumentKey::new("app.properties", "G"), Duration::from_secs(1)) {
            Err(ConfigError::SourceError {
                source_name,
                source: Some(source),
                ..
            }) => {
                assert_eq!(source_name, SOURCE_NAME);
                assert!(source.downcast_ref::<std::io::Error>().is_some());
            }
            other => panic!("expected source error, got {:?}", other),
        }
    }

    #[test]
    fn test_nonexistent_root() {
        assert!(FileConfigClient::new("/nonexistent/config/root").is_err());
    }

    #[test]
    fn test_path_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let client = FileConfigClient::new(dir.path()).unwrap();
        assert!(client
            .document_path(&DocumentKey::new("../secret", "G"))
            .is_err());
        assert!(client.document_path(&DocumentKey::new("a", "..")).is_err());
        assert!(client.document_path(&DocumentKey::new("a/b", "G")).is_err());
    }

    #[test]
    fn test_document_for_path() {
        let dir = TempDir::new().unwrap();
        let client = FileConfigClient::new(dir.path()).unwrap();
        let path = client.root().join("G").join("app.yaml");
        assert_eq!(
            client.document_for_path(&path),
            Some(DocumentKey::new("app.yaml", "G"))
        );
        assert_eq!(client.document_for_path(&client.root().join("G")), None);
    }

    #[test]
    fn test_poll_pushes_only_changes() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "G", "app.properties", "a=1");
        let client = FileConfigClient::new(dir.path()).unwrap();
        let recorder = Arc::new(Recorder::default());
        client
            .add_listener(&DocumentKey::new("app.properties", "G"), recorder.clone())
            .unwrap();

        assert_eq!(client.poll_changes().unwrap(), 0);

        write_doc(&dir, "G", "app.properties", "a=2");
        assert_eq!(client.poll_changes().unwrap(), 1);
        assert_eq!(client.poll_changes().unwrap(), 0);

        fs::remove_file(dir.path().join("G").join("app.properties")).unwrap();
        assert_eq!(client.poll_changes().unwrap(), 1);

        assert_eq!(recorder.0.lock().as_slice(), ["a=2", ""]);
    }

    #[test]
    fn test_poll_picks_up_created_document() {
        let dir = TempDir::new().unwrap();
        let client = FileConfigClient::new(dir.path()).unwrap();
        let recorder = Arc::new(Recorder::default());
        client
            .add_listener(&DocumentKey::new("late.yaml", "G"), recorder.clone())
            .unwrap();

        write_doc(&dir, "G", "late.yaml", "k: v");
        assert_eq!(client.poll_changes().unwrap(), 1);
        assert_eq!(recorder.0.lock().as_slice(), ["k: v"]);
    }
}
