// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the binder and its collaborators: the config client and its push
//! channel, document parsers, change watchers and the downstream context refresh.
//! These traits are implemented by adapters in the adapters layer.

pub mod client;
pub mod listener;
pub mod parser;
pub mod refresher;
pub mod watcher;

// Re-export commonly used types
pub use client::ConfigClient;
pub use listener::{AnyBean, ConfigListener, RefreshableTarget};
pub use parser::ConfigParser;
pub use refresher::{ContextRefresher, LoggingRefresher};
pub use watcher::{ChangeCallback, ConfigWatcher};
