//! Request predicate values.

use crate::recorder::RecordedRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named boolean test over a [`RecordedRequest`].
///
/// Every comparison is exact string equality except [`RequestPredicate::BodyContains`],
/// which is the only substring test. Header names compare case-insensitively,
/// header values compare exactly.
///
/// The `Display` form is used only for diagnostics and never affects matching.
///
/// In configuration files a predicate is written as `{ kind, value }`, for
/// example `{ kind: header, value: { name: Content-Type, value: text/plain } }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RequestPredicate {
    /// Request path equals the value
    Path(String),

    /// Request method equals the value
    Method(String),

    /// Header `name` is present with exactly `value`
    Header { name: String, value: String },

    /// Entire body equals the value
    Body(String),

    /// Body contains the value somewhere
    BodyContains(String),

    /// Raw query string (without `?`) equals the value
    QueryString(String),
}

impl RequestPredicate {
    pub fn path(path: impl Into<String>) -> Self {
        RequestPredicate::Path(path.into())
    }

    pub fn method(method: impl Into<String>) -> Self {
        RequestPredicate::Method(method.into())
    }

    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        RequestPredicate::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        RequestPredicate::Body(body.into())
    }

    pub fn body_contains(fragment: impl Into<String>) -> Self {
        RequestPredicate::BodyContains(fragment.into())
    }

    pub fn query_string(query: impl Into<String>) -> Self {
        RequestPredicate::QueryString(query.into())
    }

    /// Check whether the request satisfies this predicate.
    pub fn matches(&self, request: &RecordedRequest) -> bool {
        match self {
            RequestPredicate::Path(path) => request.path() == path,
            RequestPredicate::Method(method) => request.method() == method,
            RequestPredicate::Header { name, value } => request.header(name) == Some(value.as_str()),
            RequestPredicate::Body(body) => request.body().as_ref() == body.as_bytes(),
            RequestPredicate::BodyContains(fragment) => {
                contains_bytes(request.body(), fragment.as_bytes())
            }
            RequestPredicate::QueryString(query) => request.query() == query,
        }
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

impl fmt::Display for RequestPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPredicate::Path(v) => write!(f, "Path: '{v}'"),
            RequestPredicate::Method(v) => write!(f, "Method: '{v}'"),
            RequestPredicate::Header { name, value } => write!(f, "Header: '{name}':'{value}'"),
            RequestPredicate::Body(v) => write!(f, "Body: '{v}'"),
            RequestPredicate::BodyContains(v) => write!(f, "BodyContains: '{v}'"),
            RequestPredicate::QueryString(v) => write!(f, "QueryString: '{v}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn sample_request() -> RecordedRequest {
        RecordedRequest::http(
            "127.0.0.1:50000".parse().unwrap(),
            "GET",
            "/Fubar",
            "a=1&b=2",
            [("Content-Type", "application/json")],
            Bytes::from_static(b"a=1&b=2"),
        )
    }

    #[test]
    fn test_path_and_method_are_exact() {
        let request = sample_request();
        assert!(RequestPredicate::path("/Fubar").matches(&request));
        assert!(!RequestPredicate::path("/fubar").matches(&request));
        assert!(!RequestPredicate::path("/Fub").matches(&request));
        assert!(RequestPredicate::method("GET").matches(&request));
        assert!(!RequestPredicate::method("get").matches(&request));
    }

    #[test]
    fn test_header_name_ignores_case_value_does_not() {
        let request = sample_request();
        assert!(RequestPredicate::header("content-type", "application/json").matches(&request));
        assert!(RequestPredicate::header("CONTENT-TYPE", "application/json").matches(&request));
        assert!(!RequestPredicate::header("Content-Type", "Application/JSON").matches(&request));
        assert!(!RequestPredicate::header("Accept", "application/json").matches(&request));
    }

    #[test]
    fn test_body_and_query_are_exact_not_substring() {
        let request = sample_request();
        assert!(RequestPredicate::body("a=1&b=2").matches(&request));
        assert!(!RequestPredicate::body("a=1").matches(&request));
        assert!(RequestPredicate::query_string("a=1&b=2").matches(&request));
        assert!(!RequestPredicate::query_string("b=2").matches(&request));
    }

    #[test]
    fn test_body_contains_is_substring() {
        let request = RecordedRequest::frame(
            "127.0.0.1:50000".parse().unwrap(),
            Bytes::from_static(b"*2\r\n$4\r\nLLEN\r\n$6\r\nmylist\r\n"),
        );
        assert!(RequestPredicate::body_contains("mylist\r\n").matches(&request));
        assert!(RequestPredicate::body_contains("").matches(&request));
        assert!(!RequestPredicate::body_contains("LPUSH").matches(&request));
        assert!(!RequestPredicate::body("mylist\r\n").matches(&request));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(RequestPredicate::path("/a").to_string(), "Path: '/a'");
        assert_eq!(RequestPredicate::method("POST").to_string(), "Method: 'POST'");
        assert_eq!(
            RequestPredicate::header("Content-Type", "text/plain").to_string(),
            "Header: 'Content-Type':'text/plain'"
        );
        assert_eq!(RequestPredicate::body("x").to_string(), "Body: 'x'");
        assert_eq!(
            RequestPredicate::body_contains("y").to_string(),
            "BodyContains: 'y'"
        );
        assert_eq!(
            RequestPredicate::query_string("q=1").to_string(),
            "QueryString: 'q=1'"
        );
    }

    #[test]
    fn test_predicate_deserializes_from_yaml() {
        let yaml = r#"
- kind: path
  value: /talula
- kind: method
  value: POST
- kind: header
  value:
    name: Content-Type
    value: application/json
- kind: bodyContains
  value: mylist
"#;
        let predicates: Vec<RequestPredicate> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            predicates,
            vec![
                RequestPredicate::path("/talula"),
                RequestPredicate::method("POST"),
                RequestPredicate::header("Content-Type", "application/json"),
                RequestPredicate::body_contains("mylist"),
            ]
        );
    }
}
