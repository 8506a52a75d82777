//! Response-shape extraction
//!
//! Upstream services return deeply nested renderer trees whose layout
//! changes without notice. Nothing here assumes a path exists: every read
//! goes through a small accessor returning `Option`, and the per-service
//! modules compose those accessors into flat [`crate::models`] entities.
//!
//! - [`catalog`]: music catalog (innertube WEB_REMIX) renderers
//! - [`video`]: video platform search/browse/next renderers

pub mod catalog;
pub mod video;

use serde_json::Value;

/// Non-empty string at a JSON pointer
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Owned variant of [`str_at`]
pub fn string_at(value: &Value, pointer: &str) -> Option<String> {
    str_at(value, pointer).map(str::to_string)
}

/// Array at a JSON pointer, empty when missing or not an array
pub fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Unsigned integer at a JSON pointer
///
/// Accepts numbers and numeric strings; upstreams are inconsistent about
/// which they send (`"lengthSeconds": "215"` vs `"duration": 215`).
pub fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(as_u64_lenient)
}

/// Number or numeric string as u64
pub fn as_u64_lenient(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First run of a `{runs: [{text}]}` text object
pub fn first_run_text(text: &Value) -> Option<String> {
    string_at(text, "/runs/0/text")
}

/// All runs of a `{runs: [{text}]}` text object joined together
pub fn joined_runs_text(text: &Value) -> Option<String> {
    let joined: String = array_at(text, "/runs")
        .iter()
        .filter_map(|run| run.get("text").and_then(Value::as_str))
        .collect();
    Some(joined).filter(|s| !s.is_empty())
}

/// `simpleText` if present, else the first run
pub fn simple_or_run_text(text: &Value) -> Option<String> {
    string_at(text, "/simpleText").or_else(|| first_run_text(text))
}

/// First entry of a `{thumbnails: [{url}]}` holder
pub fn first_thumbnail_url(holder: &Value) -> Option<String> {
    string_at(holder, "/thumbnails/0/url")
}

/// Last (usually largest) entry of a `{thumbnails: [{url}]}` holder
pub fn last_thumbnail_url(holder: &Value) -> Option<String> {
    array_at(holder, "/thumbnails")
        .last()
        .and_then(|t| str_at(t, "/url"))
        .map(str::to_string)
}
