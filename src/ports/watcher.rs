// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document watcher trait definition.
//!
//! This module defines the `ConfigWatcher` trait, which provides an interface for
//! monitoring a document store for changes and triggering callbacks with the key of
//! each document that changed.

use crate::domain::{DocumentKey, Result};
use std::sync::Arc;

/// Type alias for change notification callbacks.
///
/// This callback is invoked when a document changes. It receives the key of the
/// document that changed.
pub type ChangeCallback = Arc<dyn Fn(DocumentKey) + Send + Sync>;

/// A trait for watching a document store for changes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow for use in multi-threaded contexts.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::ports::{ChangeCallback, ConfigWatcher};
/// use nacos_binder::domain::Result;
///
/// struct MyWatcher;
///
/// impl ConfigWatcher for MyWatcher {
///     fn watch(&mut self, _callback: ChangeCallback) -> Result<()> {
///         Ok(())
///     }
///
///     fn stop(&mut self) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait ConfigWatcher: Send + Sync {
    /// Starts watching for changes.
    ///
    /// The callback should be non-blocking to avoid delaying the watcher.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The watcher was successfully started
    /// * `Err(ConfigError)` - An error occurred while starting the watcher
    fn watch(&mut self, callback: ChangeCallback) -> Result<()>;

    /// Stops watching for changes.
    ///
    /// After calling this method, no more change notifications will be sent.
    fn stop(&mut self) -> Result<()>;
}
