//! Response writer handed to HTTP response factories.

use crate::config::StubResponse;
use crate::recorder::{RecordedRequest, ResponseFactory};
use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};
use std::sync::Arc;
use tracing::warn;

/// Collects status, headers and body written by a response factory.
///
/// A writer nobody touches produces `200 OK` with an empty body, which is the
/// default response for requests no rule matched.
#[derive(Debug, Clone)]
pub struct HttpResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl HttpResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Set the status code. Codes outside 100..=999 are logged and ignored.
    pub fn status(&mut self, code: u16) -> &mut Self {
        match StatusCode::from_u16(code) {
            Ok(status) => self.status = status,
            Err(e) => warn!("Ignoring invalid status code {}: {}", code, e),
        }
        self
    }

    /// Append a header. Invalid names or values are logged and skipped.
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!("Ignoring invalid header {}: {}", name, value),
        }
        self
    }

    /// Append to the body.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(data.as_ref());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for HttpResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory that always writes the given fixed response.
pub fn stub_factory(stub: &StubResponse) -> ResponseFactory<HttpResponseWriter> {
    let stub = stub.clone();
    Arc::new(move |_: &RecordedRequest, writer: &mut HttpResponseWriter| {
        writer.status(stub.status_code);
        for (name, value) in &stub.headers {
            writer.header(name, value);
        }
        writer.write(&stub.body);
    })
}
