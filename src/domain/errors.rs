// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the binding and refresh subsystem.
//!
//! This module defines the error types that can occur while parsing configuration
//! documents, coercing values into bound members, talking to a config client, or
//! refreshing property sources. All errors use `thiserror`.

use std::time::Duration;
use thiserror::Error;

/// The main error type for configuration binding operations.
///
/// It is marked as `#[non_exhaustive]` to allow for future additions without
/// breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::errors::ConfigError;
///
/// fn parse_timeout(raw: &str) -> Result<i32, ConfigError> {
///     raw.parse::<i32>().map_err(|e| ConfigError::ParseError {
///         message: format!("bad timeout '{}'", raw),
///         source: Some(Box::new(e)),
///     })
/// }
///
/// assert!(parse_timeout("x").is_err());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A configuration document or value could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The primitive fast path has no parser for the requested type.
    #[error("Unsupported primitive type: {type_name}")]
    UnsupportedPrimitiveType {
        /// Name of the type that has no primitive parser
        type_name: String,
    },

    /// Content could not be deserialized into a structured target type.
    #[error("Failed to deserialize configuration into {target_type}: {source}")]
    DeserializationError {
        /// The target type name
        target_type: String,
        /// The underlying deserialization error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The config client did not answer within the configured bound.
    #[error("Timed out after {timeout:?} fetching config dataId={data_id}, group={group}")]
    ConfigFetchTimeout {
        /// Data id of the requested document
        data_id: String,
        /// Group of the requested document
        group: String,
        /// The bound that was exceeded
        timeout: Duration,
    },

    /// Binding a single bean member failed.
    #[error("Failed to bind '{member}': {source}")]
    ConfigBindingError {
        /// Registration key of the member (`bean#field#name` or `bean#method#sig`)
        member: String,
        /// The failure that aborted this member
        #[source]
        source: Box<ConfigError>,
    },

    /// One or more members of a bean failed to bind.
    #[error("Bean '{bean_name}' has {} failed binding(s)", .failures.len())]
    BeanBindingFailed {
        /// Name of the bean being post-processed
        bean_name: String,
        /// Every member failure, in declaration order
        failures: Vec<ConfigError>,
    },

    /// A listener was re-pointed at a bean of a different type.
    #[error("Listener '{registration_key}' can only be rebound to a bean of type {expected}")]
    TargetTypeMismatch {
        /// Registration key of the listener
        registration_key: String,
        /// Type name of the bean the listener was built for
        expected: String,
    },

    /// A binding declaration is incomplete or contradictory.
    #[error("Invalid binding declaration: {message}")]
    InvalidDeclaration {
        /// What is wrong with the declaration
        message: String,
    },

    /// A config client or adapter failed.
    #[error("Config source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the client or adapter that failed
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error occurred in a change watcher.
    #[error("Configuration watcher error: {message}")]
    WatcherError {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConfigError {
    /// Creates a `ParseError` from a YAML parser error.
    pub fn from_yaml_error(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            message: format!("Failed to parse YAML: {}", err),
            source: Some(Box::new(err)),
        }
    }

    /// Creates a `DeserializationError` for the given target type.
    pub fn from_json_error(target_type: &str, err: serde_json::Error) -> Self {
        ConfigError::DeserializationError {
            target_type: target_type.to_string(),
            source: Box::new(err),
        }
    }

    /// Wraps this error as the failure of a single bound member.
    pub fn for_member(self, member: impl Into<String>) -> Self {
        ConfigError::ConfigBindingError {
            member: member.into(),
            source: Box::new(self),
        }
    }
}

/// A specialized Result type for configuration binding operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
