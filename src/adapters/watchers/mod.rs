// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watcher implementations for document change detection.
//!
//! This module contains implementations of the `ConfigWatcher` trait for
//! monitoring document stores.

#[cfg(feature = "reload")]
pub mod dir_watcher;

#[cfg(feature = "reload")]
pub use dir_watcher::DocumentDirWatcher;
