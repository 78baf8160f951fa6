// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primitive value parsing.
//!
//! Bound members whose type is one of the primitive scalars are filled through a
//! lookup table that maps the Rust type name to its parse function. The table is
//! built once on first use.

use crate::domain::errors::{ConfigError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// A parsed primitive scalar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrimitiveValue {
    /// `i32`
    Int(i32),
    /// `i64`
    Long(i64),
    /// `bool`
    Boolean(bool),
    /// `f64`
    Double(f64),
    /// `f32`
    Float(f32),
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Int(v) => write!(f, "{}", v),
            PrimitiveValue::Long(v) => write!(f, "{}", v),
            PrimitiveValue::Boolean(v) => write!(f, "{}", v),
            PrimitiveValue::Double(v) => write!(f, "{}", v),
            PrimitiveValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Signature of an entry in the primitive parser table.
pub type PrimitiveParser = fn(&str) -> Result<PrimitiveValue>;

/// Type name → parser, in precedence order int, long, boolean, double, float.
static PRIMITIVE_PARSERS: Lazy<HashMap<&'static str, PrimitiveParser>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, PrimitiveParser> = HashMap::new();
    table.insert("i32", parse_int);
    table.insert("i64", parse_long);
    table.insert("bool", parse_boolean);
    table.insert("f64", parse_double);
    table.insert("f32", parse_float);
    table
});

/// Returns `true` if `type_name` has an entry in the primitive table.
pub fn is_primitive_type(type_name: &str) -> bool {
    PRIMITIVE_PARSERS.contains_key(type_name)
}

/// Parses `raw` as the primitive named `type_name`.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// * `UnsupportedPrimitiveType` if the table has no parser for `type_name`
/// * `ParseError` if `raw` is not a valid literal for that type
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::value::{parse_primitive, PrimitiveValue};
///
/// assert_eq!(parse_primitive("i32", "42").unwrap(), PrimitiveValue::Int(42));
/// assert_eq!(parse_primitive("bool", "on").unwrap(), PrimitiveValue::Boolean(true));
/// assert!(parse_primitive("char", "x").is_err());
/// ```
pub fn parse_primitive(type_name: &str, raw: &str) -> Result<PrimitiveValue> {
    let parser = PRIMITIVE_PARSERS
        .get(type_name)
        .ok_or_else(|| ConfigError::UnsupportedPrimitiveType {
            type_name: type_name.to_string(),
        })?;
    parser(raw.trim())
}

fn literal_error(
    raw: &str,
    type_name: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> ConfigError {
    ConfigError::ParseError {
        message: format!("'{}' is not a valid {}", raw, type_name),
        source: Some(Box::new(err)),
    }
}

fn parse_int(raw: &str) -> Result<PrimitiveValue> {
    raw.parse::<i32>()
        .map(PrimitiveValue::Int)
        .map_err(|e| literal_error(raw, "i32", e))
}

fn parse_long(raw: &str) -> Result<PrimitiveValue> {
    raw.parse::<i64>()
        .map(PrimitiveValue::Long)
        .map_err(|e| literal_error(raw, "i64", e))
}

/// Recognizes (case-insensitive) `true`/`yes`/`1`/`on` and `false`/`no`/`0`/`off`.
fn parse_boolean(raw: &str) -> Result<PrimitiveValue> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(PrimitiveValue::Boolean(true)),
        "false" | "no" | "0" | "off" => Ok(PrimitiveValue::Boolean(false)),
        _ => raw
            .parse::<bool>()
            .map(PrimitiveValue::Boolean)
            .map_err(|e| literal_error(raw, "bool", e)),
    }
}

fn parse_double(raw: &str) -> Result<PrimitiveValue> {
    raw.parse::<f64>()
        .map(PrimitiveValue::Double)
        .map_err(|e| literal_error(raw, "f64", e))
}

fn parse_float(raw: &str) -> Result<PrimitiveValue> {
    raw.parse::<f32>()
        .map(PrimitiveValue::Float)
        .map_err(|e| literal_error(raw, "f32", e))
}
