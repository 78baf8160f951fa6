// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing config client and parser implementations.
//!
//! This module contains concrete implementations of the traits defined in the
//! ports layer: the YAML and properties parsers, an in-memory config client with
//! a synchronous push channel, and a directory-backed config client.

pub mod file_client;
pub mod memory_client;
pub mod parsers;

pub mod watchers;

pub use file_client::FileConfigClient;
pub use memory_client::MemoryConfigClient;
pub use parsers::{parse_document, to_properties, PropertiesParser, YamlParser};
#[cfg(feature = "reload")]
pub use watchers::DocumentDirWatcher;
