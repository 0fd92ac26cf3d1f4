//! Normalized response envelope returned for every completed request.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;

use crate::Error;

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

/// Response of a completed request, whatever its HTTP status.
///
/// `data` holds the parsed JSON body. An empty body (e.g. `204 No Content`)
/// becomes `Value::Null` and a body that is not JSON is kept as a
/// `Value::String`. The body is untrusted: use the validator to turn it into a
/// typed envelope before reading fields from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    /// Build a response from a status code and body.
    pub fn new(status: u16, data: Value) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();

        Self {
            data,
            status,
            status_text,
            headers: BTreeMap::new(),
        }
    }

    /// Consume a `reqwest` response, reading and parsing the whole body.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self, Error> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let text = response.text().await?;
        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(Self {
            data,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
        })
    }

    /// True for statuses in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The application-level `errors` array, if the body carries one.
    pub fn errors(&self) -> Option<&[Value]> {
        self.data
            .get("errors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// Look up a header by (lowercase) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a value in the body by JSON pointer, e.g. `/attributes/id`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.pointer(pointer)
    }
}

/// Pretty-print a JSON value for logging, truncated to `max_len` bytes.
///
/// Truncation always lands on a character boundary and is marked with `...`.
pub fn safe_stringify(value: &Value, max_len: usize) -> String {
    let text = match serde_json::to_string_pretty(value) {
        Ok(text) => text,
        Err(e) => return format!("[Unable to stringify: {e}]"),
    };

    if text.len() <= max_len {
        return text;
    }

    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
