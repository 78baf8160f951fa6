// SPDX-License-Identifier: MIT OR Apache-2.0

//! `.properties` document parser.

use crate::domain::{ConfigError, DocumentFormat, FlatProperties, Result};
use crate::ports::ConfigParser;

const WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

/// Parser for the line-oriented properties format.
///
/// Supported syntax:
///
/// - `key=value`, `key: value` and `key value`
/// - comment lines starting with `#` or `!`
/// - a line ending in an odd number of backslashes continues on the next line,
///   whose leading whitespace is dropped
/// - the escapes `\t`, `\n`, `\r`, `\f`, `\uXXXX`; any other escaped character
///   stands for itself (`\=`, `\:`, `\#`, `\\`, `\ `)
///
/// A later definition of a key replaces an earlier one but keeps its position.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::PropertiesParser;
/// use nacos_binder::ports::ConfigParser;
///
/// let props = PropertiesParser::new()
///     .parse("# comment\ntimeout=30\nnames = a,\\\n    b\n")
///     .unwrap();
/// assert_eq!(props.get("timeout"), Some("30"));
/// assert_eq!(props.get("names"), Some("a,b"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesParser;

impl PropertiesParser {
    /// Creates a new properties parser.
    pub fn new() -> Self {
        PropertiesParser
    }

    /// Joins continuation lines and drops blank and comment lines.
    fn logical_lines(content: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut continuing = false;

        for raw in content.lines() {
            let line = raw.trim_start_matches(&WHITESPACE[..]);
            if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            let trailing_backslashes = line.chars().rev().take_while(|c| *c == '\\').count();
            if trailing_backslashes % 2 == 1 {
                current.push_str(&line[..line.len() - 1]);
                continuing = true;
            } else {
                current.push_str(line);
                lines.push(std::mem::take(&mut current));
                continuing = false;
            }
        }

        if continuing {
            lines.push(current);
        }
        lines
    }

    /// Splits a logical line into its unescaped key and value.
    fn split_line(line: &str) -> Result<(String, String)> {
        let chars: Vec<char> = line.chars().collect();
        let mut key_end = chars.len();
        let mut value_start = chars.len();
        let mut has_separator = false;
        let mut preceding_backslash = false;

        for (idx, &c) in chars.iter().enumerate() {
            if !preceding_backslash {
                if c == '=' || c == ':' {
                    key_end = idx;
                    value_start = idx + 1;
                    has_separator = true;
                    break;
                }
                if WHITESPACE.contains(&c) {
                    key_end = idx;
                    value_start = idx + 1;
                    break;
                }
            }
            preceding_backslash = c == '\\' && !preceding_backslash;
        }

        while value_start < chars.len() {
            let c = chars[value_start];
            if !WHITESPACE.contains(&c) {
                if !has_separator && (c == '=' || c == ':') {
                    has_separator = true;
                } else {
                    break;
                }
            }
            value_start += 1;
        }

        Ok((
            Self::unescape(&chars[..key_end])?,
            Self::unescape(&chars[value_start..])?,
        ))
    }

    fn unescape(chars: &[char]) -> Result<String> {
        let mut out = String::with_capacity(chars.len());
        let mut iter = chars.iter().copied();

        while let Some(c) = iter.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match iter.next() {
                Some('t') => out.push('\t'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('f') => out.push('\x0c'),
                Some('u') => {
                    let unit = Self::read_code_unit(&mut iter)?;
                    if (0xD800..0xDC00).contains(&unit) {
                        // A high surrogate must be followed by an escaped low surrogate.
                        let low = match (iter.next(), iter.next()) {
                            (Some('\\'), Some('u')) => Self::read_code_unit(&mut iter)?,
                            _ => return Err(malformed_escape("unpaired surrogate")),
                        };
                        let decoded = char::decode_utf16([unit, low])
                            .next()
                            .and_then(|r| r.ok())
                            .ok_or_else(|| malformed_escape("invalid surrogate pair"))?;
                        out.push(decoded);
                    } else {
                        let decoded = char::from_u32(u32::from(unit))
                            .ok_or_else(|| malformed_escape("unpaired surrogate"))?;
                        out.push(decoded);
                    }
                }
                Some(other) => out.push(other),
                None => {}
            }
        }
        Ok(out)
    }

    fn read_code_unit(iter: &mut impl Iterator<Item = char>) -> Result<u16> {
        let digits: String = iter.by_ref().take(4).collect();
        if digits.chars().count() != 4 {
            return Err(malformed_escape(&format!("\\u{}", digits)));
        }
        u16::from_str_radix(&digits, 16).map_err(|e| ConfigError::ParseError {
            message: format!("Malformed \\uxxxx encoding: \\u{}", digits),
            source: Some(Box::new(e)),
        })
    }
}

fn malformed_escape(detail: &str) -> ConfigError {
    ConfigError::ParseError {
        message: format!("Malformed \\uxxxx encoding: {}", detail),
        source: None,
    }
}

impl ConfigParser for PropertiesParser {
    fn parse(&self, content: &str) -> Result<FlatProperties> {
        let mut result = FlatProperties::new();
        for line in Self::logical_lines(content) {
            let (key, value) = Self::split_line(&line)?;
            result.insert(key, value);
        }
        Ok(result)
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> FlatProperties {
        PropertiesParser::new().parse(content).unwrap()
    }

    #[test]
    fn test_separators() {
        let props = parse("a=1\nb: 2\nc 3\nd\t=\t4\ne\n");
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some(""));
    }

    #[test]
    fn test_value_keeps_later_separators() {
        let props = parse("url=jdbc:mysql://db:3306/app?a=b");
        assert_eq!(props.get("url"), Some("jdbc:mysql://db:3306/app?a=b"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let props = parse("# header\n\n   ! bang comment\nkey=value\n  # indented\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn test_continuation_lines() {
        let props = parse("list=a,\\\n     b,\\\n     c\nnext=1");
        assert_eq!(props.get("list"), Some("a,b,c"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_escaped_backslash_is_not_continuation() {
        let props = parse("path=C:\\\\dir\\\\\nnext=1");
        assert_eq!(props.get("path"), Some("C:\\dir\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_escapes() {
        let props = parse("tab=a\\tb\nkey\\=with\\:seps=v\nhash=\\#x\nspace\\ key=1\nnl=a\\nb");
        assert_eq!(props.get("tab"), Some("a\tb"));
        assert_eq!(props.get("key=with:seps"), Some("v"));
        assert_eq!(props.get("hash"), Some("#x"));
        assert_eq!(props.get("space key"), Some("1"));
        assert_eq!(props.get("nl"), Some("a\nb"));
    }

    #[test]
    fn test_unicode_escapes() {
        let props = parse("greeting=\\u4f60\\u597d\nemoji=\\ud83d\\ude00");
        assert_eq!(props.get("greeting"), Some("你好"));
        assert_eq!(props.get("emoji"), Some("😀"));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let result = PropertiesParser::new().parse("bad=\\u12G4");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));

        let result = PropertiesParser::new().parse("short=\\u12");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_duplicate_key_keeps_position() {
        let props = parse("a=1\nb=2\na=3");
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(props.get("a"), Some("3"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let props = parse("a=1\r\nb=2\r\n");
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
    }

    #[test]
    fn test_format() {
        assert_eq!(PropertiesParser::new().format(), DocumentFormat::Properties);
    }
}
