//! Gherkin data table normalization
//!
//! Scenario tables arrive as `field` / `value` string pairs. Value cells
//! holding valid JSON (`3`, `true`, `["a"]`, `{"x":1}`) become that JSON
//! value; everything else stays a verbatim string.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a data table: a field name and its raw cell text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRow {
    /// Field name; dots address nested values on lookup (`user.id`, `items.0`)
    pub field: String,
    /// Raw cell text, normalized to JSON when it parses
    pub value: String,
}

impl FieldRow {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Normalize table rows: each cell becomes JSON if it parses, else a string.
#[must_use]
pub fn normalize_rows(rows: &[FieldRow]) -> Vec<(String, Value)> {
    rows.iter()
        .map(|row| (row.field.clone(), normalize_cell(&row.value)))
        .collect()
}

/// Normalize one cell.
#[must_use]
pub fn normalize_cell(cell: &str) -> Value {
    serde_json::from_str(cell).unwrap_or_else(|_| Value::String(cell.to_string()))
}

/// Build a flat JSON object request body from table rows.
///
/// Duplicate fields: last row wins.
#[must_use]
pub fn body_from_rows(rows: &[FieldRow]) -> Value {
    let mut body = serde_json::Map::new();
    for (field, value) in normalize_rows(rows) {
        body.insert(field, value);
    }
    Value::Object(body)
}

/// Look up a dotted path in a JSON value.
///
/// Segments index objects by key and arrays by position:
/// `items.0.name` reads `body["items"][0]["name"]`.
#[must_use]
pub fn lookup_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
