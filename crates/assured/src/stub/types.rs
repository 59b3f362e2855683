//! Type definitions for stubs and observed calls.
//!
//! A [`Call`] is used both for a stub definition (what the server should answer)
//! and for an observed request (what the system-under-test actually sent).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status emitted for a stub registered without an explicit status code
pub const DEFAULT_STATUS: u16 = 200;

// ============================================================================
// Stub Key
// ============================================================================

/// Normalized (method, path) pair identifying a stub slot
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct StubKey {
    method: String,
    path: String,
}

impl StubKey {
    /// Build a key, normalizing the method to uppercase and the path to a single leading `/`
    pub fn new(method: &str, path: &str) -> Result<Self, StubError> {
        let method = normalize_method(method);
        if method.is_empty() {
            return Err(StubError::MissingMethod);
        }
        let path = normalize_path(path).ok_or(StubError::MissingPath)?;
        Ok(Self { method, path })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.path)
    }
}

/// Uppercase and trim an HTTP method
pub fn normalize_method(method: &str) -> String {
    method.trim().to_uppercase()
}

/// Canonicalize a path to exactly one leading `/`. Returns `None` for an empty path.
pub fn normalize_path(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

// ============================================================================
// Call
// ============================================================================

/// A stubbed response definition or an observed request.
///
/// Serialized with PascalCase field names (`Path`, `Method`, `StatusCode`,
/// `Response`); `Response` is carried as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Call {
    pub path: String,
    pub method: String,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status_code: Option<u16>,
    #[serde(default, with = "base64_bytes")]
    pub response: Vec<u8>,
    /// Raw query string of an observed request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Headers of an observed request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// RFC 3339 arrival time of an observed request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Call {
    /// Create a call for the given method and path with no status and an empty body
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            status_code: None,
            response: Vec::new(),
            query: None,
            headers: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Set the status code. `0` clears it, matching the wire meaning of "use default".
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = (status != 0).then_some(status);
        self
    }

    pub fn with_response(mut self, response: impl Into<Vec<u8>>) -> Self {
        self.response = response.into();
        self
    }

    /// Key identifying the stub slot this call belongs to
    pub fn key(&self) -> Result<StubKey, StubError> {
        StubKey::new(&self.method, &self.path)
    }

    /// Status to emit when this call is served as a stub
    pub fn effective_status(&self) -> u16 {
        self.status_code.unwrap_or(DEFAULT_STATUS)
    }

    /// Response body as text (lossy for non UTF-8 payloads)
    pub fn response_str(&self) -> String {
        String::from_utf8_lossy(&self.response).into_owned()
    }
}

/// Accepts a number, `0` or `null`; the latter two both mean "absent".
fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let status = Option::<u16>::deserialize(deserializer)?;
    Ok(status.filter(|s| *s != 0))
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the stub dispatcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    #[error("cannot stub call without method")]
    MissingMethod,
    #[error("cannot stub call without path")]
    MissingPath,
    #[error("invalid Assured-Status header: {0}")]
    InvalidStatus(String),
    #[error("no stub registered for {0}")]
    NotFound(String),
}
