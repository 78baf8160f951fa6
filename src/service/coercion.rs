// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of raw content into bound member values.
//!
//! Every type that can be bound implements [`BindValue`]. Primitives go through
//! the primitive parser table, `String` is taken verbatim, [`FlatProperties`] is
//! parsed from YAML or properties content, and anything else is deserialized from
//! JSON through the [`Json`] wrapper.

use crate::adapters::to_properties;
use crate::domain::value::{parse_primitive, PrimitiveValue};
use crate::domain::{ConfigError, FlatProperties, Result};
use serde::de::DeserializeOwned;
use std::ops::{Deref, DerefMut};

/// How a bindable type is produced from raw content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// A scalar from the primitive table, identified by its type name.
    Primitive(&'static str),
    /// Raw text.
    Text,
    /// Flattened YAML or properties.
    Properties,
    /// A JSON-deserialized structure.
    Structured,
}

/// A type that can be bound to configuration content.
pub trait BindValue: Sized + Send + Sync + 'static {
    /// How values of this type are produced.
    fn kind() -> ValueKind;

    /// Converts non-empty raw content into a value.
    fn from_content(raw: &str) -> Result<Self>;
}

macro_rules! primitive_bind_value {
    ($ty:ty, $name:literal, $variant:ident) => {
        impl BindValue for $ty {
            fn kind() -> ValueKind {
                ValueKind::Primitive($name)
            }

            fn from_content(raw: &str) -> Result<Self> {
                match parse_primitive($name, raw)? {
                    PrimitiveValue::$variant(value) => Ok(value),
                    _ => Err(ConfigError::UnsupportedPrimitiveType {
                        type_name: $name.to_string(),
                    }),
                }
            }
        }
    };
}

primitive_bind_value!(i32, "i32", Int);
primitive_bind_value!(i64, "i64", Long);
primitive_bind_value!(bool, "bool", Boolean);
primitive_bind_value!(f64, "f64", Double);
primitive_bind_value!(f32, "f32", Float);

impl BindValue for String {
    fn kind() -> ValueKind {
        ValueKind::Text
    }

    fn from_content(raw: &str) -> Result<Self> {
        Ok(raw.to_string())
    }
}

impl BindValue for FlatProperties {
    fn kind() -> ValueKind {
        ValueKind::Properties
    }

    fn from_content(raw: &str) -> Result<Self> {
        to_properties(raw)
    }
}

/// Binds a structured value deserialized from JSON content.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::service::{BindValue, Json};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Pool {
///     size: u32,
/// }
///
/// let pool = Json::<Pool>::from_content(r#"{"size": 8}"#).unwrap();
/// assert_eq!(pool.size, 8);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: DeserializeOwned + Send + Sync + 'static> BindValue for Json<T> {
    fn kind() -> ValueKind {
        ValueKind::Structured
    }

    fn from_content(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map(Json)
            .map_err(|e| ConfigError::from_json_error(std::any::type_name::<T>(), e))
    }
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Extracts the raw value a member should receive from a document.
///
/// With `key`, the content is parsed (YAML first, properties otherwise) and that
/// single property is returned. Without a key the whole content is used, except
/// that a primitive member whose content is not a literal of its type reads the
/// property named `member` when the document defines it. Otherwise the whole
/// content is kept so that converting it reports the parse failure. Blank
/// results fall back to `default`; `None` means there is nothing to assign.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::service::coercion::{resolve_raw, ValueKind};
///
/// let kind = ValueKind::Primitive("i32");
/// assert_eq!(resolve_raw("timeout=30", None, Some("timeout"), kind, None).unwrap().as_deref(), Some("30"));
/// assert_eq!(resolve_raw("42", None, Some("timeout"), kind, None).unwrap().as_deref(), Some("42"));
/// assert_eq!(resolve_raw("", None, Some("timeout"), kind, Some("5")).unwrap().as_deref(), Some("5"));
/// ```
pub fn resolve_raw(
    content: &str,
    key: Option<&str>,
    member: Option<&str>,
    kind: ValueKind,
    default: Option<&str>,
) -> Result<Option<String>> {
    let resolved = match key {
        Some(key) => to_properties(content)?.get(key).map(str::to_string),
        None => match (kind, member) {
            (ValueKind::Primitive(type_name), Some(member))
                if has_text(content) && parse_primitive(type_name, content).is_err() =>
            {
                let member_value = to_properties(content)
                    .ok()
                    .and_then(|props| props.get(member).map(str::to_string));
                Some(member_value.unwrap_or_else(|| content.to_string()))
            }
            _ => Some(content.to_string()),
        },
    };

    Ok(resolved
        .filter(|v| has_text(v))
        .or_else(|| default.filter(|d| has_text(d)).map(str::to_string)))
}

/// Serde helpers for `yyyy-MM-dd HH:mm:ss` timestamps inside JSON-bound values.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDateTime;
/// use nacos_binder::service::{BindValue, Json};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Release {
///     #[serde(with = "nacos_binder::service::coercion::datetime")]
///     at: NaiveDateTime,
/// }
///
/// let release = Json::<Release>::from_content(r#"{"at": "2024-03-01 08:30:00"}"#).unwrap();
/// assert_eq!(release.at.to_string(), "2024-03-01 08:30:00");
/// ```
pub mod datetime {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Accepted layout, in `chrono` format syntax.
    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Parses a timestamp string.
    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map_err(|e| de::Error::custom(format!("invalid date '{}': {}", raw, e)))
    }

    /// Writes a timestamp in the accepted layout.
    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }
}

/// Picks `value` if it has text, `default` otherwise.
pub fn or_default(value: Option<&str>, default: Option<&str>) -> Option<String> {
    value
        .filter(|v| has_text(v))
        .or_else(|| default.filter(|d| has_text(d)))
        .map(str::to_string)
}
