//! Request handling for the HTTP recorder.

use super::writer::HttpResponseWriter;
use crate::recorder::{Dispatch, RecordedRequest, RecorderError, RecordingEngine};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Request, Response};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Record one HTTP exchange and answer it from the rule table.
///
/// The whole body is read before anything is recorded. If reading fails or
/// times out, the request is dropped and the error is returned, which makes
/// hyper close the connection.
pub(crate) async fn handle_recorder_request<B>(
    req: Request<B>,
    engine: Arc<RecordingEngine<HttpResponseWriter>>,
    client_addr: SocketAddr,
    read_timeout: Duration,
) -> Result<Response<Full<Bytes>>, RecorderError>
where
    B: Body,
    B::Error: Into<RecorderError>,
{
    let (parts, body) = req.into_parts();

    let body = match tokio::time::timeout(read_timeout, body.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => {
            let e: RecorderError = e.into();
            warn!(
                "Dropping {} {} from {}: {}",
                parts.method,
                parts.uri.path(),
                client_addr,
                e
            );
            return Err(e);
        }
        Err(_) => {
            warn!(
                "Dropping {} {} from {}: body not received within {:?}",
                parts.method,
                parts.uri.path(),
                client_addr,
                read_timeout
            );
            return Err(RecorderError::ReadTimeout(read_timeout));
        }
    };

    // values outside visible ASCII are kept, with invalid UTF-8 replaced
    let headers: Vec<(&str, Cow<'_, str>)> = parts
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes())))
        .collect();

    let recorded = RecordedRequest::http(
        client_addr,
        parts.method.as_str(),
        parts.uri.path(),
        parts.uri.query().unwrap_or(""),
        headers.iter().map(|(name, value)| (*name, value.as_ref())),
        body,
    );

    let mut writer = HttpResponseWriter::new();
    match engine.record_and_dispatch(recorded, &mut writer) {
        Dispatch::Matched { rule_index } => debug!(
            "{} {} answered by rule {} with {}",
            parts.method,
            parts.uri,
            rule_index,
            writer.status_code()
        ),
        Dispatch::Fallback => debug!(
            "{} {} answered with default response",
            parts.method, parts.uri
        ),
    }

    Ok(writer.into_response())
}
