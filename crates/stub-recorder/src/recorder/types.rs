//! Type definitions shared by the recording engine and both transports.

use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

// ============================================================================
// Recorded Request
// ============================================================================

/// Immutable capture of one inbound message.
///
/// HTTP requests carry method, path, raw query string, headers and body. Raw
/// TCP frames only carry a body; method, path and query are empty and there
/// are no headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedRequest {
    request_from: String,
    method: String,
    path: String,
    query: String,
    headers: HashMap<String, String>,
    #[serde(serialize_with = "serialize_body")]
    body: Bytes,
    timestamp: String,
}

impl RecordedRequest {
    /// Capture a fully-read HTTP request.
    ///
    /// Header names are lowercased. When a header repeats, the first value wins.
    pub fn http<'a>(
        request_from: SocketAddr,
        method: impl Into<String>,
        path: impl Into<String>,
        query: impl Into<String>,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
        body: Bytes,
    ) -> Self {
        let mut header_map = HashMap::new();
        for (name, value) in headers {
            header_map
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.to_string());
        }

        Self {
            request_from: request_from.to_string(),
            method: method.into(),
            path: path.into(),
            query: query.into(),
            headers: header_map,
            body,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Capture one raw TCP frame.
    pub fn frame(request_from: SocketAddr, payload: Bytes) -> Self {
        Self {
            request_from: request_from.to_string(),
            method: String::new(),
            path: String::new(),
            query: String::new(),
            headers: HashMap::new(),
            body: payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn request_from(&self) -> &str {
        &self.request_from
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string without the leading `?`.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// RFC 3339 capture time.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

fn serialize_body<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by recorders and their transport adapters.
///
/// Only [`RecorderError::Bind`] and [`RecorderError::AlreadyRunning`] reach
/// callers of `start`; the remaining variants are per-connection failures that
/// are logged and contained to the connection that produced them.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Recorder is already running on {0}")]
    AlreadyRunning(SocketAddr),
    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] hyper::Error),
    #[error("Timed out after {0:?} waiting for the client")]
    ReadTimeout(Duration),
    #[error("Frame exceeds the {limit} byte limit")]
    FrameTooLarge { limit: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl From<std::convert::Infallible> for RecorderError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
