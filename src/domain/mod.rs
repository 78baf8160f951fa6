// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module contains the types shared by every other layer: document identity,
//! flattened properties, change events, primitive parsing, property sources and
//! errors. It does not depend on any config client.

pub mod change;
pub mod document_key;
pub mod errors;
pub mod properties;
pub mod property_source;
pub mod settings;
pub mod value;

// Re-export commonly used types
pub use change::{ChangeEvent, ChangeItem, ChangeKind};
pub use document_key::{DocumentFormat, DocumentKey, DEFAULT_GROUP};
pub use errors::{ConfigError, Result};
pub use properties::FlatProperties;
pub use property_source::{Environment, PropertySource, SourceOrigin};
pub use settings::ClientSettings;
pub use value::PrimitiveValue;
