//! Decoder implementations
//!
//! Each decoder handles a specific response format.

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

/// Matches `name="value"` and `name='value'` pairs inside a start tag
static XML_ATTRIBUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

/// Matches a start tag, capturing its name and attribute text.
/// Quoted attribute values may contain '>'
static XML_START_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z_][\w:.-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("start tag pattern is valid")
});

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Dot path to the records, e.g. `data` or `data.databaseTables[0].columns`
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Extract records from a JSON value using the configured path
    fn extract_records(&self, value: &Value) -> Result<Vec<Value>> {
        let Some(path) = &self.record_path else {
            return Ok(match value {
                Value::Array(arr) => arr.clone(),
                v => vec![v.clone()],
            });
        };

        match extract_simple_path(value, path) {
            Some(Value::Array(arr)) => Ok(arr),
            Some(Value::Null) | None => Err(Error::extraction(
                path.as_str(),
                "response missing required data structure",
            )),
            Some(v) => Ok(vec![v]),
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value = parse_json(body)?;
        self.extract_records(&value)
    }
}

// ============================================================================
// GraphQL Decoder
// ============================================================================

/// Decoder for GraphQL responses
///
/// Fails with `Error::Query` when the response carries a non-empty top-level
/// `errors` array, otherwise behaves like [`JsonDecoder`].
#[derive(Debug, Clone)]
pub struct GraphQlDecoder {
    inner: JsonDecoder,
}

impl GraphQlDecoder {
    /// Create a GraphQL decoder extracting records at `path`
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            inner: JsonDecoder::with_path(path),
        }
    }
}

impl RecordDecoder for GraphQlDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value = parse_json(body)?;

        if let Some(Value::Array(errors)) = value.get("errors") {
            if !errors.is_empty() {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(Value::as_str)
                            .map_or_else(|| e.to_string(), String::from)
                    })
                    .collect();
                return Err(Error::query(messages.join("; ")));
            }
        }

        self.inner.extract_records(&value)
    }
}

/// Build the JSON body of a GraphQL request
pub fn graphql_request(query: &str, variables: Option<Value>) -> Value {
    json!({
        "query": query,
        "variables": variables.unwrap_or_else(|| json!({})),
    })
}

// ============================================================================
// XML Decoder
// ============================================================================

/// Decoder for Tableau REST XML responses
///
/// Tableau returns resources as attribute-only elements
/// (`<user id="..." siteRole="..."/>`). Each matching element becomes a JSON
/// object of its attributes.
#[derive(Debug, Clone)]
pub struct XmlDecoder {
    element: String,
}

impl XmlDecoder {
    /// Create an XML decoder for elements named `element`
    pub fn with_element(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
        }
    }

    /// Element name this decoder extracts
    pub fn element(&self) -> &str {
        &self.element
    }
}

impl RecordDecoder for XmlDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let body = body.trim();
        if !body.starts_with('<') {
            return Err(Error::XmlParse {
                message: "Input does not appear to be XML".to_string(),
            });
        }

        let records = XML_START_TAG_REGEX
            .captures_iter(body)
            .filter(|caps| caps[1] == *self.element)
            .map(|caps| {
                let attrs = caps.get(2).map_or("", |m| m.as_str());
                let mut obj = Map::new();
                for attr in XML_ATTRIBUTE_REGEX.captures_iter(attrs) {
                    let value = attr
                        .get(2)
                        .or_else(|| attr.get(3))
                        .map_or("", |m| m.as_str());
                    obj.insert(attr[1].to_string(), Value::String(unescape_xml(value)));
                }
                Value::Object(obj)
            })
            .collect();

        Ok(records)
    }
}

/// Resolve the predefined XML entities and numeric character references
fn unescape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };

        let entity = &tail[1..end];
        let resolved = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };

        match resolved {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_json(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
}

/// Extract a value using simple dot-notation path
///
/// Supports object keys and non-negative array indexes, e.g.
/// `data.databaseTables[0].columns`.
pub fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index: usize = part[bracket_pos + 1..].strip_suffix(']')?.parse().ok()?;

            if !name.is_empty() {
                current = current.get(name)?;
            }
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}
